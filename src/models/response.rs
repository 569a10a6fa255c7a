//! 错误响应模型
//!
//! 成功时接口直接返回数据本身，失败时返回统一的错误体

use serde::{Deserialize, Serialize};

/// 未提供股票代码时的错误信息
pub const NO_TICKERS_PROVIDED: &str = "NO TICKERS PROVIDED";

/// 股票代码含非法字符时的错误信息
pub const INVALID_TICKER: &str = "INVALID TICKER";

/// 统一错误响应结构
///
/// 序列化为 `{"error": "...", "detail": "..."}`，detail 为空时省略
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    /// 错误类别
    pub error: String,
    /// 错误详情
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ErrorBody {
    /// 创建只有类别的错误响应
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            detail: None,
        }
    }

    /// 创建带详情的错误响应
    pub fn with_detail(error: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            detail: Some(detail.into()),
        }
    }
}

//! 服务层错误类型
//!
//! 按失败范围分类：上游抓取、缓存、以及整个请求

use thiserror::Error;

/// 抓取上游页面时的错误
#[derive(Error, Debug)]
pub enum ScrapeError {
    /// 连接失败、读取响应体失败等
    #[error("上游请求失败: {0}")]
    Transport(String),

    /// 上游返回非 2xx 状态码
    #[error("上游返回状态码 {0}")]
    Status(u16),

    /// 超过配置的等待时间
    #[error("上游请求超时")]
    Timeout,

    /// 页面结构与预期不符
    #[error("页面结构异常: {0}")]
    Malformed(String),

    /// 拼接上游地址失败
    #[error("无效的上游地址: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl From<reqwest::Error> for ScrapeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ScrapeError::Timeout
        } else if let Some(status) = err.status() {
            ScrapeError::Status(status.as_u16())
        } else {
            ScrapeError::Transport(err.to_string())
        }
    }
}

/// 缓存存储错误，只在缓存层内部使用，不会传递给调用方
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Redis 错误: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("缓存操作超时")]
    Timeout,
}

/// 单次请求的错误
#[derive(Error, Debug)]
pub enum ServiceError {
    /// 请求中没有任何股票代码
    #[error("未提供股票代码")]
    NoTickers,

    /// 股票代码含有不允许的字符
    #[error("无效的股票代码: {0}")]
    InvalidTicker(String),

    /// 快照页面无法获取或解析，整批请求失败
    #[error(transparent)]
    Upstream(#[from] ScrapeError),

    #[error("序列化失败: {0}")]
    Serialize(#[from] serde_json::Error),
}

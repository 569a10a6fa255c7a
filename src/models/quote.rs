//! 行情数据模型
//!
//! 所有数值字段均保留上游展示格式（字符串），不做数值解析

use serde::{Deserialize, Serialize};

/// 单只股票的行情快照
///
/// 由快照页面的一行解析而来，并合并该股票的历史走势和新闻。
/// 组装完成后不再修改。
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TickerQuote {
    /// 股票代码
    pub ticker: String,
    /// 公司名称
    pub name: String,
    /// 公司网站（缺失时为空字符串）
    pub website: String,
    /// 证券类型
    #[serde(rename = "type")]
    pub kind: String,
    /// 所属市场
    pub market: String,
    /// 市场状态
    pub market_status: String,
    /// 最新价
    pub price: String,
    /// 涨跌额（下跌时带 "-"）
    pub change: String,
    /// 涨跌幅（下跌时带 "-"）
    pub percent_change: String,
    /// 成交量
    pub share_volume: String,
    /// 当日最高
    pub todays_high: String,
    /// 当日最低
    pub todays_low: String,
    /// 最优买价
    pub best_bid: String,
    /// 52周最高
    pub fifty_two_week_high: String,
    /// 52周最低
    pub fifty_two_week_low: String,
    /// 每股收益
    pub earnings_per_share: String,
    /// 开盘价
    pub open_price: String,
    /// 收盘价
    pub close_price: String,
    /// 历史走势（由旧到新）
    pub chart_data: Vec<ChartPoint>,
    /// 相关新闻
    pub news: Vec<NewsItem>,
}

/// 历史行情中的一天
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct ChartPoint {
    pub date: String,
    pub last: String,
    pub volume: String,
    pub open: String,
    pub high: String,
    pub low: String,
}

/// 新闻条目
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct NewsItem {
    /// 标题
    pub heading: String,
    /// 链接（缺失时为空字符串）
    pub url: String,
    /// 摘要信息（时间、来源等）
    pub details: String,
}

/// /chart 接口返回结构
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChartResponse {
    /// 历史走势（由旧到新）
    pub data: Vec<ChartPoint>,
    /// 最近一段收盘价的字符图
    pub ascii: String,
}

/// /symbol 查询参数
#[derive(Debug, Deserialize)]
pub struct SymbolQuery {
    /// 逗号分隔的股票代码，如 "aapl,msft"
    pub tickers: Option<String>,
}

/// /chart 查询参数
#[derive(Debug, Deserialize)]
pub struct ChartQuery {
    pub ticker: Option<String>,
}

//! 公共常量和文本清洗函数

use std::sync::OnceLock;

use regex::Regex;
use scraper::{ElementRef, Selector};

use crate::services::error::ScrapeError;

// ==================== 上游页面地址 ====================

/// 多股票快照页面
pub const NASDAQ_SNAPSHOT_URL: &str = "https://www.nasdaq.com/aspx/infoquotes.aspx";
/// 个股页面前缀，历史行情和新闻都挂在其下
pub const NASDAQ_SYMBOL_BASE_URL: &str = "https://www.nasdaq.com/symbol/";
/// 历史行情页面后缀
pub const CHART_PATH_SUFFIX: &str = "historical";
/// 新闻页面后缀
pub const NEWS_PATH_SUFFIX: &str = "news-headlines";
/// 历史行情请求体模板，查询最近一年
pub const CHART_RANGE_BODY: &str = "1y|false|";
/// 快照页面通过此 cookie 接收股票列表
pub const SYMBOL_LIST_COOKIE: &str = "userSymbolList";

pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// 可能出现在价格前的货币符号
const CURRENCY_SYMBOLS: [char; 4] = ['$', '€', '£', '¥'];

fn whitespace_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s{2,}").expect("whitespace pattern is valid"))
}

fn ticker_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9.^-]+$").expect("ticker pattern is valid"))
}

/// 股票代码只允许字母、数字和 `.` `^` `-`
///
/// 代码会拼进上游地址和 cookie，其他字符一律拒绝
pub fn is_valid_ticker(ticker: &str) -> bool {
    ticker_pattern().is_match(ticker)
}

// ==================== 文本清洗 ====================

/// 把连续两个及以上的空白替换为一个空格，再去掉首尾空白
///
/// 用于名称、新闻标题等自由文本
pub fn collapse_whitespace(s: &str) -> String {
    whitespace_run().replace_all(s, " ").trim().to_string()
}

/// 去掉所有换行后再去掉首尾空白
///
/// 用于多行表格单元格中的字段
pub fn strip_newlines(s: &str) -> String {
    s.replace(['\n', '\r'], "").trim().to_string()
}

/// 去掉货币符号和所有空白（包括中间的空白）
pub fn strip_money(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace() && !CURRENCY_SYMBOLS.contains(c))
        .collect()
}

// ==================== 页面解析辅助 ====================

/// 解析固定的 CSS 选择器
pub fn selector(css: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(css).map_err(|e| ScrapeError::Malformed(format!("选择器 {} 无效: {:?}", css, e)))
}

/// 元素内全部文本拼接
pub fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>()
}

/// 第一个匹配元素的文本，未匹配时为空字符串
pub fn first_text(scope: ElementRef<'_>, sel: &Selector) -> String {
    scope.select(sel).next().map(element_text).unwrap_or_default()
}

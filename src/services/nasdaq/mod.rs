//! 纳斯达克行情页面抓取
//!
//! ## 页面
//! - 快照页面：多只股票的实时行情，股票列表通过 cookie 传入
//! - 历史行情页面：单只股票最近一年的日线
//! - 新闻页面：单只股票的新闻标题
//!
//! 页面结构（选择器、单元格位置）属于外部约定，集中在各解析模块顶部的常量中。

mod common;
mod chart;
mod news;
mod snapshot;
mod source;

pub use chart::fetch_chart;
pub use common::{is_valid_ticker, NASDAQ_SNAPSHOT_URL, NASDAQ_SYMBOL_BASE_URL};
pub use news::fetch_news;
pub use snapshot::scrape_snapshot;
pub use source::{symbol_list, NasdaqSource, PageRequest, PageSource};

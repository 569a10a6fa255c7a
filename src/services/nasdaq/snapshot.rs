//! 多股票快照页面解析
//!
//! 页面中每个股票一行，行内字段的位置由上游页面布局决定：
//! - 信息单元格：`代码|名称|类型|Market : 市场`
//! - 市场状态：id 为 `<代码>_MarketStatus` 的元素
//! - 涨跌：`.lastsale_qn > span` 内两个 label，span 带 `red` 类表示下跌
//! - 其余数值：`.genTable` 中固定位置的单元格，见 [`FIELD_LAYOUT`]
//!
//! 上游调整列顺序时字段会整体错位，而不会报错，需要同步修改 [`FIELD_LAYOUT`]。

use scraper::{ElementRef, Html, Selector};

use super::common::{
    collapse_whitespace, element_text, first_text, selector, strip_money, strip_newlines,
};
use crate::models::TickerQuote;
use crate::services::error::ScrapeError;

const ROW_SELECTOR: &str = "table#quotes_content_left_InfoQuotesResults > tbody > tr";
const INFO_SELECTOR: &str = ".infoquote_qn > div";
const PRICE_SELECTOR: &str = ".lastsale_qn > label";
const CHANGE_SELECTOR: &str = ".lastsale_qn > span";
const WEBSITE_SELECTOR: &str = ".iqsumlinku";
const CELL_SELECTOR: &str = ".infoquote_qn .genTable tr td";

/// 信息单元格在 `.infoquote_qn > div` 中的位置
const INFO_DIV_INDEX: usize = 1;
/// 市场状态元素 id 后缀
const MARKET_STATUS_SUFFIX: &str = "_MarketStatus";
const MARKET_PREFIX: &str = "Market : ";
/// 下跌行的 class
const NEGATIVE_CLASS: &str = "red";

/// 表格字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    ShareVolume,
    TodaysHigh,
    TodaysLow,
    BestBid,
    FiftyTwoWeekHigh,
    EarningsPerShare,
    OpenPrice,
    ClosePrice,
    FiftyTwoWeekLow,
}

/// 单元格取值方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extract {
    /// 原样保留（去换行）
    Text,
    /// 价格类字段，去货币符号和空白
    Money,
    /// "高 / 低" 形式单元格的前半部分
    MoneyPairFirst,
    /// "高 / 低" 形式单元格的后半部分
    MoneyPairSecond,
}

/// `.genTable` 单元格位置表：字段 → (位置, 取值方式)
pub const FIELD_LAYOUT: [(Field, usize, Extract); 9] = [
    (Field::ShareVolume, 3, Extract::Text),
    (Field::TodaysHigh, 5, Extract::MoneyPairFirst),
    (Field::TodaysLow, 5, Extract::MoneyPairSecond),
    (Field::BestBid, 7, Extract::Money),
    (Field::FiftyTwoWeekHigh, 9, Extract::Money),
    (Field::EarningsPerShare, 11, Extract::Money),
    (Field::OpenPrice, 13, Extract::Money),
    (Field::ClosePrice, 15, Extract::Money),
    (Field::FiftyTwoWeekLow, 25, Extract::Money),
];

impl Extract {
    fn apply(self, raw: &str) -> String {
        match self {
            Extract::Text => strip_newlines(raw),
            Extract::Money => strip_money(raw),
            Extract::MoneyPairFirst | Extract::MoneyPairSecond => {
                let cleaned = strip_money(raw);
                match cleaned.split_once('/') {
                    Some((first, _)) if self == Extract::MoneyPairFirst => first.to_string(),
                    Some((_, second)) => second.to_string(),
                    None => cleaned,
                }
            }
        }
    }
}

impl TickerQuote {
    fn field_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::ShareVolume => &mut self.share_volume,
            Field::TodaysHigh => &mut self.todays_high,
            Field::TodaysLow => &mut self.todays_low,
            Field::BestBid => &mut self.best_bid,
            Field::FiftyTwoWeekHigh => &mut self.fifty_two_week_high,
            Field::EarningsPerShare => &mut self.earnings_per_share,
            Field::OpenPrice => &mut self.open_price,
            Field::ClosePrice => &mut self.close_price,
            Field::FiftyTwoWeekLow => &mut self.fifty_two_week_low,
        }
    }
}

/// 预编译的行内选择器
struct RowSelectors {
    info: Selector,
    price: Selector,
    change: Selector,
    label: Selector,
    website: Selector,
    cell: Selector,
    with_id: Selector,
}

impl RowSelectors {
    fn new() -> Result<Self, ScrapeError> {
        Ok(Self {
            info: selector(INFO_SELECTOR)?,
            price: selector(PRICE_SELECTOR)?,
            change: selector(CHANGE_SELECTOR)?,
            label: selector("label")?,
            website: selector(WEBSITE_SELECTOR)?,
            cell: selector(CELL_SELECTOR)?,
            with_id: selector("[id]")?,
        })
    }
}

/// 解析快照页面
///
/// 每解析出一行的股票代码就调用一次 `on_ticker`，调用方可以借此
/// 在解析该行剩余字段的同时发起其他请求。返回值与行一一对应，顺序同页面。
///
/// 信息单元格不足 4 段的行会被跳过；找不到行情表格时整个页面视为异常。
pub fn scrape_snapshot<T, F>(html: &str, mut on_ticker: F) -> Result<Vec<(TickerQuote, T)>, ScrapeError>
where
    F: FnMut(&str) -> T,
{
    let document = Html::parse_document(html);
    let table_selector = selector("table#quotes_content_left_InfoQuotesResults")?;
    if document.select(&table_selector).next().is_none() {
        return Err(ScrapeError::Malformed("未找到行情表格".to_string()));
    }

    let row_selector = selector(ROW_SELECTOR)?;
    let selectors = RowSelectors::new()?;
    let mut rows = Vec::new();

    for (index, row) in document.select(&row_selector).enumerate() {
        let info = row
            .select(&selectors.info)
            .nth(INFO_DIV_INDEX)
            .map(element_text)
            .unwrap_or_default();
        let parts: Vec<&str> = info.split('|').collect();
        if parts.len() < 4 {
            log::warn!("快照第 {} 行信息字段不足，已跳过: {:?}", index, collapse_whitespace(&info));
            continue;
        }

        let ticker = strip_newlines(parts[0]);
        let extra = on_ticker(&ticker);
        let quote = parse_row(row, &selectors, ticker, &parts);
        rows.push((quote, extra));
    }

    log::debug!("📊 快照页面解析到 {} 行", rows.len());
    Ok(rows)
}

fn parse_row(row: ElementRef<'_>, selectors: &RowSelectors, ticker: String, parts: &[&str]) -> TickerQuote {
    let status_id = format!("{}{}", ticker, MARKET_STATUS_SUFFIX);
    let market_status = row
        .select(&selectors.with_id)
        .find(|el| el.value().id() == Some(status_id.as_str()))
        .map(element_text)
        .unwrap_or_default();

    let (change, percent_change) = match row.select(&selectors.change).next() {
        Some(span) => {
            let mut labels = span.select(&selectors.label).map(element_text);
            let change = labels.next().unwrap_or_default();
            let percent = labels.next().unwrap_or_default();
            let negative = span.value().classes().any(|c| c == NEGATIVE_CLASS);
            (signed(&change, negative), signed(&percent, negative))
        }
        None => (String::new(), String::new()),
    };

    let website = row
        .select(&selectors.website)
        .next()
        .and_then(|a| a.value().attr("href"))
        .unwrap_or_default();

    let mut quote = TickerQuote {
        name: strip_newlines(parts[1]),
        kind: strip_newlines(parts[2]),
        market: strip_newlines(&parts[3].replace(MARKET_PREFIX, "")),
        market_status: strip_newlines(&market_status),
        price: strip_money(&first_text(row, &selectors.price)),
        website: strip_newlines(website),
        change,
        percent_change,
        ticker,
        ..Default::default()
    };

    let cells: Vec<String> = row.select(&selectors.cell).map(element_text).collect();
    for (field, position, extract) in FIELD_LAYOUT {
        let raw = cells.get(position).map(String::as_str).unwrap_or_default();
        *quote.field_mut(field) = strip_newlines(&extract.apply(raw));
    }

    quote
}

/// 按行的涨跌标记统一加符号，忽略文本中原有的正负号
fn signed(raw: &str, negative: bool) -> String {
    let value = strip_newlines(raw);
    let value = value.trim_start_matches(['+', '-']);
    if negative {
        format!("-{}", value)
    } else {
        value.to_string()
    }
}

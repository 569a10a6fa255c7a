//! 历史行情页面抓取
//!
//! 上游按日期由新到旧排列，返回前反转为由旧到新

use scraper::{ElementRef, Html};

use super::common::{element_text, selector, strip_newlines};
use super::source::{PageRequest, PageSource};
use crate::models::ChartPoint;
use crate::services::error::ScrapeError;

const CHART_BODY_SELECTOR: &str = "#quotes_content_left_pnlAJAX tbody";
/// 每行单元格顺序：日期、开盘、最高、最低、收盘、成交量
const CHART_COLUMNS: usize = 6;

/// 获取单只股票的历史行情（由旧到新）
pub async fn fetch_chart(source: &dyn PageSource, ticker: &str) -> Result<Vec<ChartPoint>, ScrapeError> {
    let html = source
        .fetch(&PageRequest::Chart {
            ticker: ticker.to_string(),
        })
        .await?;
    parse_chart(&html)
}

/// 解析历史行情页面
///
/// 每个 tbody 的第一行是表头，跳过；单元格不足的行也跳过
pub fn parse_chart(html: &str) -> Result<Vec<ChartPoint>, ScrapeError> {
    let document = Html::parse_document(html);
    let body_selector = selector(CHART_BODY_SELECTOR)?;
    let cell_selector = selector("td")?;

    let mut chart = Vec::new();
    for body in document.select(&body_selector) {
        let rows = body
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|el| el.value().name() == "tr")
            .skip(1);

        for row in rows {
            let cells: Vec<String> = row
                .select(&cell_selector)
                .map(|cell| strip_newlines(&element_text(cell)))
                .collect();
            if cells.len() < CHART_COLUMNS {
                continue;
            }

            chart.push(ChartPoint {
                date: cells[0].clone(),
                open: cells[1].clone(),
                high: cells[2].clone(),
                low: cells[3].clone(),
                last: cells[4].clone(),
                volume: cells[5].clone(),
            });
        }
    }

    chart.reverse();
    Ok(chart)
}

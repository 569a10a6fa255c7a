//! 新闻页面抓取
//!
//! 新闻条目是 `.news-headlines > iframe` 之前的兄弟 div，
//! 带 class 或 id 的 div 是广告等非新闻内容，过滤掉

use scraper::{ElementRef, Html};

use super::common::{collapse_whitespace, element_text, first_text, selector};
use super::source::{PageRequest, PageSource};
use crate::models::NewsItem;
use crate::services::error::ScrapeError;

const ANCHOR_SELECTOR: &str = ".news-headlines > iframe";

/// 获取单只股票的新闻
pub async fn fetch_news(source: &dyn PageSource, ticker: &str) -> Result<Vec<NewsItem>, ScrapeError> {
    let html = source
        .fetch(&PageRequest::News {
            ticker: ticker.to_string(),
        })
        .await?;
    parse_news(&html)
}

/// 解析新闻页面，条目按页面顺序返回
pub fn parse_news(html: &str) -> Result<Vec<NewsItem>, ScrapeError> {
    let document = Html::parse_document(html);
    let anchor_selector = selector(ANCHOR_SELECTOR)?;
    let heading_selector = selector("span > a")?;
    let details_selector = selector("small")?;

    let Some(anchor) = document.select(&anchor_selector).next() else {
        return Ok(Vec::new());
    };

    let mut news: Vec<NewsItem> = anchor
        .prev_siblings()
        .filter_map(ElementRef::wrap)
        .filter(|el| {
            let value = el.value();
            value.name() == "div" && value.attr("class").is_none() && value.id().is_none()
        })
        .map(|item| {
            let heading = item.select(&heading_selector).next();
            NewsItem {
                heading: heading.map(element_text).map(|t| collapse_whitespace(&t)).unwrap_or_default(),
                url: heading
                    .and_then(|a| a.value().attr("href"))
                    .unwrap_or_default()
                    .to_string(),
                details: collapse_whitespace(&first_text(item, &details_selector)),
            }
        })
        .collect();

    news.reverse();
    Ok(news)
}

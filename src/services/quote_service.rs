//! 行情聚合服务
//!
//! 处理流程：
//! 1. 校验并规整股票列表
//! 2. 查询缓存，命中则原样返回
//! 3. 抓取快照页面，逐行解析；每解析出一个股票代码就启动其附加数据抓取
//! 4. 按页面顺序等待每只股票的附加数据，合并为完整行情
//! 5. 序列化后写回缓存
//!
//! 快照页面失败会让整批请求失败，且不写缓存；单只股票的附加数据失败只影响该股票。

use std::sync::Arc;

use super::ascii_chart::plot_chart;
use super::cache::CacheAside;
use super::enrichment::{Enrichment, EnrichmentSettings};
use super::error::{ScrapeError, ServiceError};
use super::nasdaq::{fetch_chart, is_valid_ticker, scrape_snapshot, symbol_list, PageRequest, PageSource};
use crate::models::{ChartResponse, TickerQuote};

const SYMBOL_NAMESPACE: &str = "symbol:";
const CHART_NAMESPACE: &str = "chart:";

/// 行情聚合服务
///
/// 持有页面来源和缓存，在所有请求间共享
pub struct QuoteService {
    source: Arc<dyn PageSource>,
    cache: CacheAside,
    enrichment: EnrichmentSettings,
}

impl QuoteService {
    pub fn new(source: Arc<dyn PageSource>, cache: CacheAside, enrichment: EnrichmentSettings) -> Self {
        Self {
            source,
            cache,
            enrichment,
        }
    }

    /// 获取一批股票的行情，返回 JSON 文本
    ///
    /// `raw_tickers` 为逗号分隔的股票代码，保持原顺序
    pub async fn symbols(&self, raw_tickers: Option<&str>) -> Result<String, ServiceError> {
        let tickers = parse_tickers(raw_tickers.unwrap_or_default())?;
        if tickers.is_empty() {
            return Err(ServiceError::NoTickers);
        }

        let list = symbol_list(&tickers);
        let key = self.cache.key(SYMBOL_NAMESPACE, &list);
        if let Some(cached) = self.cache.lookup(&key).await {
            log::info!("缓存返回 {}", list);
            return Ok(cached);
        }

        let quotes = self.aggregate(&tickers).await?;
        let body = serde_json::to_string(&quotes)?;
        self.cache.store(&key, &body).await;

        log::info!("返回 {} 共 {} 条", list, quotes.len());
        Ok(body)
    }

    /// 抓取快照并合并每只股票的附加数据，顺序同快照页面
    pub async fn aggregate(&self, tickers: &[String]) -> Result<Vec<TickerQuote>, ScrapeError> {
        let html = self.source.fetch(&PageRequest::snapshot(tickers)).await?;

        // 页面解析是同步的，附加数据任务在解析过程中即已开始
        let rows = scrape_snapshot(&html, |ticker| {
            Enrichment::launch(&self.source, ticker, &self.enrichment)
        })?;

        let mut quotes = Vec::with_capacity(rows.len());
        for (quote, enrichment) in rows {
            let (chart_data, news) = enrichment.join().await;
            quotes.push(TickerQuote {
                chart_data,
                news,
                ..quote
            });
        }
        Ok(quotes)
    }

    /// 获取单只股票的历史行情和字符图，返回 JSON 文本
    pub async fn chart(&self, raw_ticker: Option<&str>) -> Result<String, ServiceError> {
        let ticker = raw_ticker.map(str::trim).unwrap_or_default();
        if ticker.is_empty() {
            return Err(ServiceError::NoTickers);
        }
        if !is_valid_ticker(ticker) {
            return Err(ServiceError::InvalidTicker(ticker.to_string()));
        }

        let key = self.cache.key(CHART_NAMESPACE, ticker);
        if let Some(cached) = self.cache.lookup(&key).await {
            log::info!("缓存返回历史行情 {}", ticker);
            return Ok(cached);
        }

        let data = tokio::time::timeout(self.enrichment.fetch_timeout, fetch_chart(self.source.as_ref(), ticker))
            .await
            .map_err(|_| ScrapeError::Timeout)??;
        let ascii = plot_chart(&data);
        let body = serde_json::to_string(&ChartResponse { data, ascii })?;
        self.cache.store(&key, &body).await;

        log::info!("返回历史行情 {}", ticker);
        Ok(body)
    }
}

/// 拆分逗号分隔的股票代码，去掉空白和空项，保持原顺序
///
/// 任一代码含非法字符时整个请求被拒绝
fn parse_tickers(raw: &str) -> Result<Vec<String>, ServiceError> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| {
            if is_valid_ticker(t) {
                Ok(t.to_string())
            } else {
                Err(ServiceError::InvalidTicker(t.to_string()))
            }
        })
        .collect()
}

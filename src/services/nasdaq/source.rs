//! 上游页面获取
//!
//! 快照、历史行情、新闻三类页面都通过 [`PageSource`] 获取，
//! 便于在测试中替换为本地页面

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, COOKIE};
use reqwest::Client;
use std::time::Duration;
use url::Url;

use super::common::{
    CHART_PATH_SUFFIX, CHART_RANGE_BODY, NEWS_PATH_SUFFIX, SYMBOL_LIST_COOKIE, USER_AGENT,
};
use crate::config::UpstreamConfig;
use crate::services::error::ScrapeError;

/// 上游页面请求
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PageRequest {
    /// 多股票快照页面，symbol_list 形如 "&aapl&msft"
    Snapshot { symbol_list: String },
    /// 单只股票的历史行情页面
    Chart { ticker: String },
    /// 单只股票的新闻页面
    News { ticker: String },
}

impl PageRequest {
    /// 由股票代码列表构造快照请求
    pub fn snapshot(tickers: &[String]) -> Self {
        PageRequest::Snapshot {
            symbol_list: symbol_list(tickers),
        }
    }
}

/// 把股票代码拼成快照页面识别的列表格式："&a&b&c"
pub fn symbol_list(tickers: &[String]) -> String {
    tickers.iter().map(|t| format!("&{}", t)).collect()
}

/// 页面来源
///
/// 实现需要可以在多个并发请求间共享
#[async_trait]
pub trait PageSource: Send + Sync {
    /// 获取页面 HTML 文本
    async fn fetch(&self, request: &PageRequest) -> Result<String, ScrapeError>;
}

/// 纳斯达克网站页面来源
pub struct NasdaqSource {
    /// HTTP 客户端，所有请求共用
    client: Client,
    snapshot_url: Url,
    chart_base_url: Url,
    news_base_url: Url,
}

impl NasdaqSource {
    /// 按配置创建页面来源
    pub fn new(config: &UpstreamConfig) -> Result<Self, ScrapeError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            snapshot_url: Url::parse(&config.snapshot_url)?,
            chart_base_url: Url::parse(&config.chart_base_url)?,
            news_base_url: Url::parse(&config.news_base_url)?,
        })
    }

    /// 个股页面地址：<base>/<ticker>/<suffix>
    ///
    /// 代码作为单独的路径段写入并转义，主机和路径前缀始终取自 base
    fn symbol_page(base: &Url, ticker: &str, suffix: &str) -> Result<Url, ScrapeError> {
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|_| ScrapeError::Malformed(format!("上游地址不能拼接路径: {}", base)))?
            .pop_if_empty()
            .push(&ticker.to_lowercase())
            .push(suffix);
        Ok(url)
    }

    async fn read_body(response: reqwest::Response) -> Result<String, ScrapeError> {
        if !response.status().is_success() {
            return Err(ScrapeError::Status(response.status().as_u16()));
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl PageSource for NasdaqSource {
    async fn fetch(&self, request: &PageRequest) -> Result<String, ScrapeError> {
        let response = match request {
            PageRequest::Snapshot { symbol_list } => {
                log::debug!("📡 请求快照页面 {} 股票列表 {}", self.snapshot_url, symbol_list);
                self.client
                    .get(self.snapshot_url.clone())
                    .header(COOKIE, format!("{}={}", SYMBOL_LIST_COOKIE, symbol_list))
                    .send()
                    .await?
            }
            PageRequest::Chart { ticker } => {
                let url = Self::symbol_page(&self.chart_base_url, ticker, CHART_PATH_SUFFIX)?;
                log::debug!("📡 请求历史行情 URL: {}", url);
                self.client
                    .post(url)
                    .header(CONTENT_TYPE, "application/json")
                    .body(format!("{}{}", CHART_RANGE_BODY, ticker))
                    .send()
                    .await?
            }
            PageRequest::News { ticker } => {
                let url = Self::symbol_page(&self.news_base_url, ticker, NEWS_PATH_SUFFIX)?;
                log::debug!("📡 请求新闻 URL: {}", url);
                self.client.get(url).send().await?
            }
        };

        Self::read_body(response).await
    }
}

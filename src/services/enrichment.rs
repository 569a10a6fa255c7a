//! 个股附加数据（历史行情、新闻）
//!
//! 每只股票的两类数据各在一个任务中抓取，互不影响。
//! 任一任务失败或超时只会让对应字段为空，不会影响整批请求。

use futures::FutureExt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::task::JoinHandle;

use super::error::ScrapeError;
use super::nasdaq::{fetch_chart, fetch_news, PageSource};
use crate::config::EnrichmentConfig;
use crate::models::{ChartPoint, NewsItem};

/// 附加数据抓取设置
#[derive(Debug, Clone)]
pub struct EnrichmentSettings {
    pub chart: bool,
    pub news: bool,
    /// 单次抓取超时
    pub fetch_timeout: Duration,
}

impl From<&EnrichmentConfig> for EnrichmentSettings {
    fn from(config: &EnrichmentConfig) -> Self {
        Self {
            chart: config.chart,
            news: config.news,
            fetch_timeout: config.fetch_timeout(),
        }
    }
}

/// 被丢弃时取消任务的句柄
///
/// 请求被取消（如客户端断开）时，尚未完成的抓取随之终止
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Future for AbortOnDrop<T> {
    type Output = Result<T, tokio::task::JoinError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.0.poll_unpin(cx)
    }
}

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// 一只股票正在进行的附加数据抓取
pub struct Enrichment {
    ticker: String,
    chart: Option<AbortOnDrop<Vec<ChartPoint>>>,
    news: Option<AbortOnDrop<Vec<NewsItem>>>,
}

impl Enrichment {
    /// 立即启动抓取任务，不等待完成
    pub fn launch(source: &Arc<dyn PageSource>, ticker: &str, settings: &EnrichmentSettings) -> Self {
        let chart = settings.chart.then(|| {
            let source = Arc::clone(source);
            let ticker = ticker.to_string();
            let timeout = settings.fetch_timeout;
            AbortOnDrop(tokio::spawn(async move {
                bounded("历史行情", &ticker, timeout, fetch_chart(source.as_ref(), &ticker)).await
            }))
        });

        let news = settings.news.then(|| {
            let source = Arc::clone(source);
            let ticker = ticker.to_string();
            let timeout = settings.fetch_timeout;
            AbortOnDrop(tokio::spawn(async move {
                bounded("新闻", &ticker, timeout, fetch_news(source.as_ref(), &ticker)).await
            }))
        });

        Self {
            ticker: ticker.to_string(),
            chart,
            news,
        }
    }

    /// 等待两个任务都结束
    ///
    /// 任务失败、超时或异常退出时对应结果为空
    pub async fn join(self) -> (Vec<ChartPoint>, Vec<NewsItem>) {
        let ticker = self.ticker;
        futures::join!(settle(&ticker, self.chart), settle(&ticker, self.news))
    }
}

async fn bounded<T, F>(kind: &str, ticker: &str, timeout: Duration, fetch: F) -> Vec<T>
where
    F: Future<Output = Result<Vec<T>, ScrapeError>>,
{
    match tokio::time::timeout(timeout, fetch).await {
        Ok(Ok(items)) => items,
        Ok(Err(e)) => {
            log::warn!("{} {} 抓取失败: {}", ticker, kind, e);
            Vec::new()
        }
        Err(_) => {
            log::warn!("{} {} 抓取超过 {:?}，已放弃", ticker, kind, timeout);
            Vec::new()
        }
    }
}

async fn settle<T>(ticker: &str, task: Option<AbortOnDrop<Vec<T>>>) -> Vec<T> {
    match task {
        Some(task) => task.await.unwrap_or_else(|e| {
            log::warn!("{} 附加数据任务异常结束: {}", ticker, e);
            Vec::new()
        }),
        None => Vec::new(),
    }
}

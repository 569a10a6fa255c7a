//! 测试用页面与页面来源

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::error::ScrapeError;
use super::nasdaq::{PageRequest, PageSource};

/// (代码, 名称, 是否下跌)
pub type Row<'a> = (&'a str, &'a str, bool);

fn snapshot_row(ticker: &str, name: &str, negative: bool) -> String {
    let class = if negative { " class=\"red\"" } else { "" };
    let labels = [
        "Symbol", "Share Volume", "Today's High / Low", "Best Bid", "52 Week High", "EPS", "Open",
        "Close",
    ];
    let values = [
        "", "\n  52,164,470\n", "$ 175.00 / $ 170.10", "$ 172.40", "$ 199.62", "$ 6.13",
        "$ 171.00", "$ 171.25",
    ];
    // 位置 0..=15 为 label/value 交替，24/25 为 52 周最低
    let mut cells = String::new();
    for (label, value) in labels.iter().zip(values.iter()) {
        cells.push_str(&format!("<tr><td>{}</td><td>{}</td></tr>", label, value));
    }
    for _ in 16..24 {
        cells.push_str("<tr><td>-</td></tr>");
    }
    cells.push_str("<tr><td>52 Week Low</td><td>$ 124.17</td></tr>");

    format!(
        r#"<tr><td>
  <div class="infoquote_qn">
    <div>Summary</div>
    <div>
{ticker}
|{name}|Common Stock|Market : NASDAQ-GS</div>
    <a class="iqsumlinku" href="https://www.{lower}.example.com">site</a>
    <table class="genTable"><tbody>{cells}</tbody></table>
  </div>
  <span id="{ticker}_MarketStatus">
    Market Closed
  </span>
  <div class="lastsale_qn"><label>$ 172.50</label><span{class}><label>1.25</label><label>0.73%</label></span></div>
</td></tr>"#,
        lower = ticker.to_lowercase(),
    )
}

fn wrap_snapshot(rows: String) -> String {
    format!(
        r#"<html><body>
<table id="quotes_content_left_InfoQuotesResults"><tbody>
{rows}
</tbody></table>
</body></html>"#
    )
}

/// 快照页面
pub fn snapshot_page(rows: &[Row<'_>]) -> String {
    wrap_snapshot(rows.iter().map(|(t, n, neg)| snapshot_row(t, n, *neg)).collect())
}

/// 第一行之后插入一行信息字段不完整的快照页面
pub fn snapshot_page_with_broken_row(rows: &[Row<'_>]) -> String {
    let mut body = String::new();
    for (i, (t, n, neg)) in rows.iter().enumerate() {
        body.push_str(&snapshot_row(t, n, *neg));
        if i == 0 {
            body.push_str(r#"<tr><td><div class="infoquote_qn"><div></div><div>BRKN|Broken</div></div></td></tr>"#);
        }
    }
    wrap_snapshot(body)
}

/// 历史行情页面，points 为 (日期, 收盘价)，按上游习惯由新到旧传入
pub fn chart_page(points: &[(&str, &str)]) -> String {
    let rows: String = points
        .iter()
        .map(|(date, last)| {
            format!(
                "<tr><td>\n {date} \n</td><td>171.00</td><td>173.00</td><td>170.00</td><td>{last}</td><td>1,234,567</td></tr>"
            )
        })
        .collect();
    format!(
        r#"<html><body><div id="quotes_content_left_pnlAJAX"><table><tbody>
<tr><th>Date</th><th>Open</th><th>High</th><th>Low</th><th>Close/Last</th><th>Volume</th></tr>
{rows}
</tbody></table></div></body></html>"#
    )
}

/// 新闻页面：两条新闻，夹杂带 class/id 的非新闻 div，以及 iframe 之后的内容
pub fn news_page(ticker: &str) -> String {
    let lower = ticker.to_lowercase();
    format!(
        r#"<html><body><div class="news-headlines">
  <div class="ad-slot">advertisement</div>
  <div><span><a href="https://news.example.com/{lower}/1">
     {ticker}   beats
     estimates </a></span><small>  10/17/2026  -  Reuters </small></div>
  <div id="promo"><span><a href="/promo">promo</a></span></div>
  <div><span><a>{ticker} announces   dividend</a></span><small>10/16/2026 - AP</small></div>
  <iframe src="https://ads.example.com"></iframe>
  <div><span><a href="/later">after anchor</a></span></div>
</div></body></html>"#
    )
}

/// 测试用页面来源
///
/// 根据给定的行生成快照、历史行情和新闻页面，并记录每类页面的请求次数
pub struct FixtureSource {
    rows: Vec<(String, String, bool)>,
    failing_news: HashSet<String>,
    slow_news: HashSet<String>,
    snapshot_status: Option<u16>,
    snapshot_calls: AtomicUsize,
    chart_calls: AtomicUsize,
    news_calls: AtomicUsize,
    requests: Mutex<Vec<PageRequest>>,
}

impl FixtureSource {
    pub fn new(rows: &[Row<'_>]) -> Self {
        Self {
            rows: rows.iter().map(|(t, n, neg)| (t.to_string(), n.to_string(), *neg)).collect(),
            failing_news: HashSet::new(),
            slow_news: HashSet::new(),
            snapshot_status: None,
            snapshot_calls: AtomicUsize::new(0),
            chart_calls: AtomicUsize::new(0),
            news_calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// 指定股票的新闻请求返回 500
    pub fn with_failing_news(mut self, ticker: &str) -> Self {
        self.failing_news.insert(ticker.to_string());
        self
    }

    /// 指定股票的新闻请求长时间不返回
    pub fn with_slow_news(mut self, ticker: &str) -> Self {
        self.slow_news.insert(ticker.to_string());
        self
    }

    /// 快照请求返回指定状态码
    pub fn with_snapshot_status(mut self, status: u16) -> Self {
        self.snapshot_status = Some(status);
        self
    }

    pub fn snapshot_calls(&self) -> usize {
        self.snapshot_calls.load(Ordering::SeqCst)
    }

    pub fn chart_calls(&self) -> usize {
        self.chart_calls.load(Ordering::SeqCst)
    }

    pub fn news_calls(&self) -> usize {
        self.news_calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<PageRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageSource for FixtureSource {
    async fn fetch(&self, request: &PageRequest) -> Result<String, ScrapeError> {
        self.requests.lock().unwrap().push(request.clone());
        match request {
            PageRequest::Snapshot { .. } => {
                self.snapshot_calls.fetch_add(1, Ordering::SeqCst);
                if let Some(status) = self.snapshot_status {
                    return Err(ScrapeError::Status(status));
                }
                let rows: Vec<Row<'_>> = self.rows.iter().map(|(t, n, neg)| (t.as_str(), n.as_str(), *neg)).collect();
                Ok(snapshot_page(&rows))
            }
            PageRequest::Chart { .. } => {
                self.chart_calls.fetch_add(1, Ordering::SeqCst);
                Ok(chart_page(&[
                    ("10/17/2026", "172.50"),
                    ("10/16/2026", "171.25"),
                    ("10/15/2026", "170.00"),
                ]))
            }
            PageRequest::News { ticker } => {
                self.news_calls.fetch_add(1, Ordering::SeqCst);
                if self.slow_news.contains(ticker) {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                }
                if self.failing_news.contains(ticker) {
                    return Err(ScrapeError::Status(500));
                }
                Ok(news_page(ticker))
            }
        }
    }
}

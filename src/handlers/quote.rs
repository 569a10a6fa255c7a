//! 行情接口处理器
//!
//! ## API 列表
//! - GET /symbol?tickers=A,B,C - 批量获取行情（含历史走势和新闻）
//! - GET /chart?ticker=X - 获取单只股票历史行情及字符图

use actix_web::http::header::ContentType;
use actix_web::{web, HttpResponse, Result};

use crate::models::{ChartQuery, ErrorBody, SymbolQuery, INVALID_TICKER, NO_TICKERS_PROVIDED};
use crate::services::error::{ScrapeError, ServiceError};
use crate::services::QuoteService;

/// 批量获取行情
///
/// GET /symbol?tickers=aapl,msft
pub async fn get_symbols(
    service: web::Data<QuoteService>,
    query: web::Query<SymbolQuery>,
) -> Result<HttpResponse> {
    match service.symbols(query.tickers.as_deref()).await {
        Ok(body) => Ok(json_body(body)),
        Err(e) => Ok(error_response(e)),
    }
}

/// 获取单只股票历史行情
///
/// GET /chart?ticker=aapl
pub async fn get_chart(
    service: web::Data<QuoteService>,
    query: web::Query<ChartQuery>,
) -> Result<HttpResponse> {
    match service.chart(query.ticker.as_deref()).await {
        Ok(body) => Ok(json_body(body)),
        Err(e) => Ok(error_response(e)),
    }
}

/// 已序列化的 JSON 原样返回，缓存命中与否响应体完全一致
fn json_body(body: String) -> HttpResponse {
    HttpResponse::Ok().content_type(ContentType::json()).body(body)
}

fn error_response(err: ServiceError) -> HttpResponse {
    log::warn!("请求失败: {}", err);
    match err {
        ServiceError::NoTickers => HttpResponse::BadRequest().json(ErrorBody::new(NO_TICKERS_PROVIDED)),
        ServiceError::InvalidTicker(ref ticker) => {
            HttpResponse::BadRequest().json(ErrorBody::with_detail(INVALID_TICKER, ticker.clone()))
        }
        ServiceError::Upstream(ScrapeError::Timeout) => {
            HttpResponse::GatewayTimeout().json(ErrorBody::with_detail("UPSTREAM TIMEOUT", err.to_string()))
        }
        ServiceError::Upstream(_) => {
            HttpResponse::BadGateway().json(ErrorBody::with_detail("UPSTREAM UNAVAILABLE", err.to_string()))
        }
        ServiceError::Serialize(_) => {
            HttpResponse::InternalServerError().json(ErrorBody::with_detail("INTERNAL ERROR", err.to_string()))
        }
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/symbol", web::get().to(get_symbols))
        .route("/chart", web::get().to(get_chart));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::cache::{CacheAside, MemoryCache};
    use crate::services::enrichment::EnrichmentSettings;
    use crate::services::fixtures::FixtureSource;
    use crate::services::nasdaq::PageSource;
    use actix_web::{http::StatusCode, test, App};
    use std::sync::Arc;
    use std::time::Duration;

    fn service(fixture: &Arc<FixtureSource>) -> web::Data<QuoteService> {
        let source: Arc<dyn PageSource> = fixture.clone();
        let cache = CacheAside::new(Arc::new(MemoryCache::new()), Duration::from_secs(300), "test:");
        let settings = EnrichmentSettings {
            chart: true,
            news: true,
            fetch_timeout: Duration::from_secs(5),
        };
        web::Data::new(QuoteService::new(source, cache, settings))
    }

    #[actix_web::test]
    async fn test_symbol_endpoint_caches_body() {
        let fixture = Arc::new(FixtureSource::new(&[("AAPL", "Apple Inc.", false), ("MSFT", "Microsoft Corp.", false)]));
        let app = test::init_service(App::new().app_data(service(&fixture)).configure(config)).await;

        let req = test::TestRequest::get().uri("/symbol?tickers=aapl,msft").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers().get("content-type").unwrap(), "application/json");
        let first = test::read_body(resp).await;

        let value: serde_json::Value = serde_json::from_slice(&first).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 2);
        assert_eq!(value[0]["ticker"], "AAPL");
        assert_eq!(value[0]["chartData"].as_array().unwrap().len(), 3);
        assert_eq!(value[1]["news"].as_array().unwrap().len(), 2);

        let req = test::TestRequest::get().uri("/symbol?tickers=aapl,msft").to_request();
        let second = test::read_body(test::call_service(&app, req).await).await;
        assert_eq!(first, second);
        assert_eq!(fixture.snapshot_calls(), 1);
        assert_eq!(fixture.news_calls(), 2);
    }

    #[actix_web::test]
    async fn test_missing_tickers() {
        let fixture = Arc::new(FixtureSource::new(&[]));
        let app = test::init_service(App::new().app_data(service(&fixture)).configure(config)).await;

        for uri in ["/symbol", "/symbol?tickers=", "/chart"] {
            let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            let body: ErrorBody = test::read_body_json(resp).await;
            assert_eq!(body, ErrorBody::new(NO_TICKERS_PROVIDED));
        }
    }

    #[actix_web::test]
    async fn test_invalid_ticker_is_bad_request() {
        let fixture = Arc::new(FixtureSource::new(&[("AAPL", "Apple Inc.", false)]));
        let app = test::init_service(App::new().app_data(service(&fixture)).configure(config)).await;

        for uri in ["/chart?ticker=%2F%2Fevil.example", "/symbol?tickers=aapl%3Bx%3D1", "/chart?ticker=a%23b"] {
            let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{}", uri);
            let body: ErrorBody = test::read_body_json(resp).await;
            assert_eq!(body.error, INVALID_TICKER);
        }
        assert!(fixture.requests().is_empty());
    }

    #[actix_web::test]
    async fn test_upstream_failure_is_bad_gateway() {
        let fixture = Arc::new(FixtureSource::new(&[("AAPL", "Apple Inc.", false)]).with_snapshot_status(503));
        let app = test::init_service(App::new().app_data(service(&fixture)).configure(config)).await;

        let req = test::TestRequest::get().uri("/symbol?tickers=aapl").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "UPSTREAM UNAVAILABLE");
    }

    #[actix_web::test]
    async fn test_chart_endpoint() {
        let fixture = Arc::new(FixtureSource::new(&[]));
        let app = test::init_service(App::new().app_data(service(&fixture)).configure(config)).await;

        let req = test::TestRequest::get().uri("/chart?ticker=aapl").to_request();
        let body: serde_json::Value = test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 3);
        assert!(body["ascii"].as_str().unwrap().contains('┤'));
    }
}

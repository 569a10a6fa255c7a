//! 跨域中间件
//!
//! 只开放 GET；预检请求直接应答，其余请求在响应上补充 CORS 头

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::{
        header::{self, HeaderValue},
        Method,
    },
    Error, HttpResponse,
};
use futures::future::{ok, LocalBoxFuture, Ready};
use std::rc::Rc;

const ALLOWED_METHODS: &str = "GET";
const ALLOWED_HEADERS: &str = "Accept, Authorization, Content-Type, X-CSRF-Token";

/// 跨域策略
#[derive(Debug)]
struct CorsPolicy {
    /// 允许的来源，包含 "*" 时允许任意来源
    origins: Vec<String>,
    /// 预检结果缓存时间（秒）
    max_age: u64,
}

impl CorsPolicy {
    fn any_origin(&self) -> bool {
        self.origins.iter().any(|o| o == "*")
    }

    /// 返回应写入 Access-Control-Allow-Origin 的值，来源不被允许时返回 None
    fn allow_origin(&self, origin: &str) -> Option<String> {
        if self.any_origin() {
            Some("*".to_string())
        } else if self.origins.iter().any(|o| o.eq_ignore_ascii_case(origin)) {
            Some(origin.to_string())
        } else {
            None
        }
    }
}

/// 跨域中间件
pub struct CorsMiddleware {
    policy: Rc<CorsPolicy>,
}

impl CorsMiddleware {
    pub fn new(origins: Vec<String>, max_age: u64) -> Self {
        Self {
            policy: Rc::new(CorsPolicy { origins, max_age }),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for CorsMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = CorsMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(CorsMiddlewareService {
            service: Rc::new(service),
            policy: self.policy.clone(),
        })
    }
}

pub struct CorsMiddlewareService<S> {
    service: Rc<S>,
    policy: Rc<CorsPolicy>,
}

impl<S, B> Service<ServiceRequest> for CorsMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let policy = self.policy.clone();

        Box::pin(async move {
            let origin = req
                .headers()
                .get(header::ORIGIN)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);

            // 没有 Origin 的请求不是跨域请求，直接放行
            let Some(origin) = origin else {
                let res = service.call(req).await?;
                return Ok(res.map_into_left_body());
            };
            let allowed = policy.allow_origin(&origin);

            // 预检请求
            if req.method() == Method::OPTIONS
                && req.headers().contains_key(header::ACCESS_CONTROL_REQUEST_METHOD)
            {
                let method_ok = req
                    .headers()
                    .get(header::ACCESS_CONTROL_REQUEST_METHOD)
                    .and_then(|v| v.to_str().ok())
                    .map(|m| m.eq_ignore_ascii_case(ALLOWED_METHODS))
                    .unwrap_or(false);

                let response = match allowed {
                    Some(allow) if method_ok => HttpResponse::NoContent()
                        .insert_header((header::ACCESS_CONTROL_ALLOW_ORIGIN, allow))
                        .insert_header((header::ACCESS_CONTROL_ALLOW_METHODS, ALLOWED_METHODS))
                        .insert_header((header::ACCESS_CONTROL_ALLOW_HEADERS, ALLOWED_HEADERS))
                        .insert_header((header::ACCESS_CONTROL_MAX_AGE, policy.max_age.to_string()))
                        .insert_header((header::VARY, "Origin"))
                        .finish(),
                    _ => {
                        log::debug!("拒绝跨域预检: origin={}", origin);
                        HttpResponse::Forbidden().finish()
                    }
                };
                return Ok(req.into_response(response).map_into_right_body());
            }

            let mut res = service.call(req).await?;
            if let Some(allow) = allowed {
                if let Ok(value) = HeaderValue::from_str(&allow) {
                    let headers = res.headers_mut();
                    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
                    headers.insert(header::VARY, HeaderValue::from_static("Origin"));
                }
            }
            Ok(res.map_into_left_body())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, web, App};

    async fn ok_handler() -> HttpResponse {
        HttpResponse::Ok().body("ok")
    }

    #[actix_web::test]
    async fn test_any_origin() {
        let app = test::init_service(
            App::new()
                .wrap(CorsMiddleware::new(vec!["*".to_string()], 300))
                .route("/symbol", web::get().to(ok_handler)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/symbol")
            .insert_header((header::ORIGIN, "https://app.example.com"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "*");
    }

    #[actix_web::test]
    async fn test_listed_origin_only() {
        let app = test::init_service(
            App::new()
                .wrap(CorsMiddleware::new(vec!["https://app.example.com".to_string()], 300))
                .route("/symbol", web::get().to(ok_handler)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/symbol")
            .insert_header((header::ORIGIN, "https://app.example.com"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(
            resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "https://app.example.com"
        );

        let req = test::TestRequest::get()
            .uri("/symbol")
            .insert_header((header::ORIGIN, "https://evil.example.com"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }

    #[actix_web::test]
    async fn test_preflight() {
        let app = test::init_service(
            App::new()
                .wrap(CorsMiddleware::new(vec!["*".to_string()], 300))
                .route("/symbol", web::get().to(ok_handler)),
        )
        .await;

        let req = test::TestRequest::default()
            .method(Method::OPTIONS)
            .uri("/symbol")
            .insert_header((header::ORIGIN, "https://app.example.com"))
            .insert_header((header::ACCESS_CONTROL_REQUEST_METHOD, "GET"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert_eq!(resp.headers().get(header::ACCESS_CONTROL_MAX_AGE).unwrap(), "300");
        assert_eq!(resp.headers().get(header::ACCESS_CONTROL_ALLOW_METHODS).unwrap(), "GET");

        let req = test::TestRequest::default()
            .method(Method::OPTIONS)
            .uri("/symbol")
            .insert_header((header::ORIGIN, "https://app.example.com"))
            .insert_header((header::ACCESS_CONTROL_REQUEST_METHOD, "POST"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }
}

//! FlashQuote 后端服务
//!
//! 聚合多只股票的实时快照、历史行情和新闻，提供 JSON 接口
//! 数据来源：Nasdaq 网页

mod config;     // 配置
mod handlers;   // HTTP 请求处理器
mod middleware; // 中间件
mod models;     // 数据模型定义
mod services;   // 业务逻辑服务

use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Env;
use std::sync::Arc;

use crate::config::{AppConfig, CacheBackend, CacheConfig};
use crate::middleware::CorsMiddleware;
use crate::services::cache::{CacheAside, CacheStore, MemoryCache, RedisCache};
use crate::services::enrichment::EnrichmentSettings;
use crate::services::nasdaq::{NasdaqSource, PageSource};
use crate::services::QuoteService;

/// 按配置创建缓存存储，Redis 地址无效时退回内存缓存
fn cache_store(config: &CacheConfig) -> Arc<dyn CacheStore> {
    match config.backend {
        CacheBackend::Memory => Arc::new(MemoryCache::new()),
        CacheBackend::Redis => match RedisCache::new(&config.redis_url, config.op_timeout()) {
            Ok(store) => Arc::new(store),
            Err(e) => {
                log::warn!("Redis 配置无效 ({}), 改用内存缓存: {}", config.redis_url, e);
                Arc::new(MemoryCache::new())
            }
        },
    }
}

/// 应用程序入口
#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志系统，默认日志级别为 info
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = AppConfig::load();
    let source: Arc<dyn PageSource> = Arc::new(NasdaqSource::new(&config.upstream)?);
    let cache = CacheAside::new(cache_store(&config.cache), config.cache.ttl(), config.cache.key_prefix.clone());
    let service = web::Data::new(QuoteService::new(
        source,
        cache,
        EnrichmentSettings::from(&config.enrichment),
    ));

    let origins = config.cors.allowed_origins.clone();
    let max_age = config.cache.ttl_secs;
    let bind_addr = config.bind_addr();
    log::info!("启动 FlashQuote 后端服务，监听 {}", bind_addr);

    // 创建并启动 HTTP 服务器
    let mut server = HttpServer::new(move || {
        App::new()
            .app_data(service.clone())
            .wrap(CorsMiddleware::new(origins.clone(), max_age)) // 跨域
            .wrap(Logger::default()) // 请求日志
            .configure(handlers::config) // 配置路由
    });
    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    server.bind(&bind_addr)?.run().await?;
    Ok(())
}

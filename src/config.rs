//! 配置模块
//!
//! 支持从 JSON 文件加载系统配置，环境变量优先级高于文件

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::services::nasdaq::{NASDAQ_SNAPSHOT_URL, NASDAQ_SYMBOL_BASE_URL};

/// 环境变量前缀
const ENV_PREFIX: &str = "FLASHQUOTE_";

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,
    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
    /// 工作线程数（0 表示使用 CPU 核心数）
    #[serde(default)]
    pub workers: usize,
}

/// 跨域配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// 允许的来源，"*" 表示任意来源
    #[serde(default = "default_origins")]
    pub allowed_origins: Vec<String>,
}

/// 缓存后端
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    Redis,
    Memory,
}

/// 缓存配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// 缓存有效期（秒）
    #[serde(default = "default_ttl")]
    pub ttl_secs: u64,
    #[serde(default = "default_backend")]
    pub backend: CacheBackend,
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
    /// 缓存键前缀
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    /// 单次缓存操作超时（毫秒）
    #[serde(default = "default_cache_op_timeout")]
    pub op_timeout_ms: u64,
}

/// 上游页面配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// 快照页面地址
    #[serde(default = "default_snapshot_url")]
    pub snapshot_url: String,
    /// 历史行情页面前缀
    #[serde(default = "default_symbol_base_url")]
    pub chart_base_url: String,
    /// 新闻页面前缀
    #[serde(default = "default_symbol_base_url")]
    pub news_base_url: String,
    /// 请求超时时间（秒）
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// 连接超时时间（秒）
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

/// 个股附加数据配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    /// 是否抓取历史行情
    #[serde(default = "default_true")]
    pub chart: bool,
    /// 是否抓取新闻
    #[serde(default = "default_true")]
    pub news: bool,
    /// 单次附加请求超时（秒）
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
}

/// 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
}

// 默认值函数
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 7810 }
fn default_origins() -> Vec<String> { vec!["*".to_string()] }
fn default_ttl() -> u64 { 300 }
fn default_backend() -> CacheBackend { CacheBackend::Redis }
fn default_redis_url() -> String { "redis://127.0.0.1:6379/0".to_string() }
fn default_key_prefix() -> String { "flashquote:".to_string() }
fn default_cache_op_timeout() -> u64 { 500 }
fn default_snapshot_url() -> String { NASDAQ_SNAPSHOT_URL.to_string() }
fn default_symbol_base_url() -> String { NASDAQ_SYMBOL_BASE_URL.to_string() }
fn default_timeout() -> u64 { 10 }
fn default_connect_timeout() -> u64 { 5 }
fn default_true() -> bool { true }
fn default_fetch_timeout() -> u64 { 5 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: 0,
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_origins(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl(),
            backend: default_backend(),
            redis_url: default_redis_url(),
            key_prefix: default_key_prefix(),
            op_timeout_ms: default_cache_op_timeout(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            snapshot_url: default_snapshot_url(),
            chart_base_url: default_symbol_base_url(),
            news_base_url: default_symbol_base_url(),
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            chart: true,
            news: true,
            fetch_timeout_secs: default_fetch_timeout(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn op_timeout(&self) -> Duration {
        Duration::from_millis(self.op_timeout_ms)
    }
}

impl EnrichmentConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

impl AppConfig {
    /// 从 JSON 文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// 加载配置，优先从文件，失败则使用默认值，最后应用环境变量
    pub fn load() -> Self {
        let config_paths = ["config.json", "config/config.json"];

        let mut config = config_paths
            .iter()
            .filter(|path| Path::new(path).exists())
            .find_map(|path| match Self::from_file(path) {
                Ok(config) => {
                    log::info!("从 {} 加载配置成功", path);
                    Some(config)
                }
                Err(e) => {
                    log::warn!("加载配置文件 {} 失败: {}", path, e);
                    None
                }
            })
            .unwrap_or_else(|| {
                log::info!("使用默认配置");
                Self::default()
            });

        config.apply_env(|name| std::env::var(name).ok());
        config
    }

    /// 应用环境变量覆盖，无法解析的值记录警告后忽略
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |suffix: &str| {
            lookup(&format!("{}{}", ENV_PREFIX, suffix))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(host) = var("HOST") {
            self.server.host = host;
        }
        if let Some(port) = var("PORT") {
            // 兼容 ":7810" 写法
            match port.trim_start_matches(':').parse() {
                Ok(port) => self.server.port = port,
                Err(_) => log::warn!("忽略无效的端口配置: {}", port),
            }
        }
        if let Some(origins) = var("ALLOWED_ORIGINS") {
            self.cors.allowed_origins = origins
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
        }
        if let Some(ttl) = var("CACHE_TIME") {
            match ttl.parse() {
                Ok(ttl) => self.cache.ttl_secs = ttl,
                Err(_) => log::warn!("忽略无效的缓存时间配置: {}", ttl),
            }
        }
        if let Some(backend) = var("CACHE_BACKEND") {
            match backend.to_lowercase().as_str() {
                "redis" => self.cache.backend = CacheBackend::Redis,
                "memory" => self.cache.backend = CacheBackend::Memory,
                _ => log::warn!("忽略未知的缓存后端: {}", backend),
            }
        }
        if let Some(url) = var("REDIS_URL") {
            self.cache.redis_url = url;
        }
        if let Some(timeout) = var("FETCH_TIMEOUT") {
            match timeout.parse() {
                Ok(secs) => self.enrichment.fetch_timeout_secs = secs,
                Err(_) => log::warn!("忽略无效的请求超时配置: {}", timeout),
            }
        }
    }

    /// 获取服务器绑定地址
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

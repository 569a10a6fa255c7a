//! 响应缓存
//!
//! 旁路缓存：调用方先查缓存，未命中时自行计算并写回。
//! 缓存键由完整的请求形态（股票列表原顺序）决定，不按单只股票拆分，
//! 因此顺序不同的两个请求会分别缓存。
//!
//! 存储层出错时一律按未命中处理，缓存只是优化，不影响请求结果。

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use redis::aio::MultiplexedConnection;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::error::CacheError;

/// 键值存储
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// 读取，不存在或已过期返回 None
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    /// 写入并设置过期时间
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;
}

// ==================== 时钟 ====================

/// 时钟，测试中可替换以模拟时间流逝
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// 系统时钟
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

// ==================== 进程内存储 ====================

/// 进程内存储，过期的条目在读取该键或任意写入时清除
pub struct MemoryCache {
    entries: Mutex<HashMap<String, (String, DateTime<Utc>)>>,
    clock: Arc<dyn Clock>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }
}

#[cfg(test)]
impl MemoryCache {
    fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match entries.get(key) {
            Some((value, expires_at)) if *expires_at > now => Ok(Some(value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let now = self.clock.now();
        let ttl = TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX);
        let expires_at = now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC);
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        // 写入时顺带清掉所有过期条目，不再被读取的键也会被回收
        entries.retain(|_, (_, expires)| *expires > now);
        entries.insert(key.to_string(), (value.to_string(), expires_at));
        Ok(())
    }
}

// ==================== Redis 存储 ====================

/// Redis 存储
///
/// 首次使用时建立连接，连接出错后丢弃，下次操作重新连接
pub struct RedisCache {
    client: redis::Client,
    connection: tokio::sync::Mutex<Option<MultiplexedConnection>>,
    /// 单次操作（含建连）的最长等待时间
    op_timeout: Duration,
}

impl RedisCache {
    pub fn new(url: &str, op_timeout: Duration) -> Result<Self, CacheError> {
        Ok(Self {
            client: redis::Client::open(url)?,
            connection: tokio::sync::Mutex::new(None),
            op_timeout,
        })
    }

    async fn connection(&self) -> Result<MultiplexedConnection, CacheError> {
        let mut guard = self.connection.lock().await;
        if let Some(conn) = guard.as_ref() {
            return Ok(conn.clone());
        }

        let conn = tokio::time::timeout(self.op_timeout, self.client.get_multiplexed_async_connection())
            .await
            .map_err(|_| CacheError::Timeout)??;
        *guard = Some(conn.clone());
        Ok(conn)
    }

    async fn query<T: redis::FromRedisValue>(&self, cmd: redis::Cmd) -> Result<T, CacheError> {
        let mut conn = self.connection().await?;
        let result = match tokio::time::timeout(self.op_timeout, cmd.query_async::<_, T>(&mut conn)).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(CacheError::Redis(e)),
            Err(_) => Err(CacheError::Timeout),
        };
        if result.is_err() {
            *self.connection.lock().await = None;
        }
        result
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut cmd = redis::cmd("GET");
        cmd.arg(key);
        self.query::<Option<String>>(cmd).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value).arg("EX").arg(ttl.as_secs().max(1));
        self.query::<()>(cmd).await
    }
}

// ==================== 旁路缓存 ====================

/// 旁路缓存
///
/// 包装存储层，统一加键前缀和过期时间，并吞掉存储错误
#[derive(Clone)]
pub struct CacheAside {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
    prefix: String,
}

impl CacheAside {
    pub fn new(store: Arc<dyn CacheStore>, ttl: Duration, prefix: impl Into<String>) -> Self {
        Self {
            store,
            ttl,
            prefix: prefix.into(),
        }
    }

    /// 完整缓存键
    pub fn key(&self, namespace: &str, request: &str) -> String {
        format!("{}{}{}", self.prefix, namespace, request.to_lowercase())
    }

    /// 查询缓存，存储出错按未命中处理
    pub async fn lookup(&self, key: &str) -> Option<String> {
        match self.store.get(key).await {
            Ok(Some(payload)) => {
                log::debug!("缓存命中: {}", key);
                Some(payload)
            }
            Ok(None) => None,
            Err(e) => {
                log::warn!("读取缓存 {} 失败，按未命中处理: {}", key, e);
                None
            }
        }
    }

    /// 写回缓存，失败只记录日志
    pub async fn store(&self, key: &str, payload: &str) {
        if let Err(e) = self.store.set(key, payload, self.ttl).await {
            log::warn!("写入缓存 {} 失败: {}", key, e);
        }
    }
}

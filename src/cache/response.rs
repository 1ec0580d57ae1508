use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::keys::{api_path_key, api_prefix_pattern};
use super::store::CacheStore;

/// 接口响应缓存的默认过期时间（1小时）
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

/// 可缓存的响应体上限
const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// 接口响应缓存
///
/// 所有存储错误都只记录日志，不影响请求本身。
#[derive(Clone)]
pub struct ResponseCache {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
    max_body_bytes: usize,
}

impl ResponseCache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self {
            store,
            ttl: DEFAULT_CACHE_TTL,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }

    pub fn store(&self) -> &dyn CacheStore {
        self.store.as_ref()
    }

    pub async fn lookup(&self, key: &str) -> Option<String> {
        match self.store.get(key).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!(cache = "api", key, "cache lookup failed: {}", e);
                None
            }
        }
    }

    pub async fn put(&self, key: &str, body: &str) {
        match self.store.set_ex(key, body, self.ttl).await {
            Ok(()) => debug!(cache = "api", key, ttl = self.ttl.as_secs(), "response cached"),
            Err(e) => warn!(cache = "api", key, "cache write failed: {}", e),
        }
    }

    /// 删除某个路径前缀下的所有缓存（含各种查询串）
    pub async fn invalidate_prefix(&self, prefix: &str) -> u64 {
        self.invalidate_pattern(&api_prefix_pattern(prefix)).await
    }

    /// 按 glob 模式删除缓存，需要扫描键空间
    pub async fn invalidate_pattern(&self, pattern: &str) -> u64 {
        let keys = match self.store.scan_match(pattern).await {
            Ok(keys) => keys,
            Err(e) => {
                warn!(cache = "api", pattern, "cache scan failed: {}", e);
                return 0;
            }
        };
        self.delete_keys(&keys).await
    }

    /// 按精确路径删除缓存，不需要扫描
    pub async fn invalidate_paths(&self, paths: &[&str]) -> u64 {
        let keys: Vec<String> = paths.iter().map(|p| api_path_key(p)).collect();
        self.delete_keys(&keys).await
    }

    async fn delete_keys(&self, keys: &[String]) -> u64 {
        if keys.is_empty() {
            return 0;
        }
        match self.store.delete(keys).await {
            Ok(removed) => {
                debug!(cache = "api", removed, "cache invalidated");
                removed
            }
            Err(e) => {
                warn!(cache = "api", "cache invalidation failed: {}", e);
                0
            }
        }
    }
}

use std::time::Duration;

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("cache store unavailable: {0}")]
    Unavailable(String),
}

/// 缓存存储的最小接口，键值均为字符串
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// 写入并设置过期时间
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    /// 删除给定的键，返回实际删除的数量
    async fn delete(&self, keys: &[String]) -> Result<u64, CacheError>;

    /// 按 glob 模式列出键
    async fn scan_match(&self, pattern: &str) -> Result<Vec<String>, CacheError>;
}

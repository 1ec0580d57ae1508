// 缓存模块
// 包含缓存键、缓存存储以及接口响应缓存

pub mod keys;
pub mod models;
pub mod operations;
mod response;
mod store;

pub use operations::{MemoryCacheStore, RedisCacheStore, TokenCacheOperations};
pub use response::{DEFAULT_CACHE_TTL, ResponseCache};
pub use store::{CacheError, CacheStore};

/// 缓存操作
/// 提供缓存存储实现和令牌相关的缓存操作
mod memory_store;
mod redis_store;
pub mod token;

pub use memory_store::MemoryCacheStore;
pub use redis_store::RedisCacheStore;
pub use token::TokenCacheOperations;

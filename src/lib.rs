use std::sync::Arc;

use config::Config;
use sqlx::PgPool;

pub mod cache;
pub mod client;
pub mod common;
pub mod config;
pub mod error;
pub mod middleware;
pub mod notify;
pub mod routes;
pub mod user;
pub mod utils;

use cache::{CacheStore, ResponseCache};
use notify::Notifier;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    /// Redis 存储，保存吊销令牌和密码重置令牌
    pub store: Arc<dyn CacheStore>,
    pub cache: ResponseCache,
    pub notifier: Notifier,
}

mod auth;
mod cache;
mod error_handler;

pub use auth::{BearerToken, auth_middleware};
pub use cache::{CACHE_STATUS_HEADER, cache_response};
pub use error_handler::log_errors;

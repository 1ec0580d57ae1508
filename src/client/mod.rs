//! 应用客户端
//!
//! 所有请求经过 [`ApiClient`]，它持有自己的请求头、存储与会话状态，
//! 在程序启动时构造一次后以 `Arc` 传递。[`AuthManager`] 在其上维护登录状态。

pub mod auth;
pub mod catalog;
pub mod error;
pub mod http;
pub mod navigation;
pub mod normalize;
pub mod notifications;
pub mod reports;
pub mod routing;
pub mod session;
pub mod storage;

pub use auth::{AuthManager, Credentials, Registration};
pub use error::ClientError;
pub use http::{ApiClient, Download, RequestConfig};
pub use navigation::{MemoryNavigator, Navigator};
pub use normalize::AuthPayload;
pub use notifications::{NotificationHandler, NotificationListener, dispatch};
pub use reports::{ReportKind, ReportOutput, fetch_report};
pub use routing::landing_path;
pub use session::{AuthStatus, SessionState};
pub use storage::{FileSessionStorage, MemorySessionStorage, SessionStorage, Theme};

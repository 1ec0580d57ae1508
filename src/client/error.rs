use crate::common::FieldError;

pub const CONNECTION_MESSAGE: &str = "Unable to reach the server. Please check your connection.";
pub const TIMEOUT_MESSAGE: &str = "The server took too long to respond. Please try again.";
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again.";
pub const GENERIC_MESSAGE: &str = "Something went wrong. Please try again.";

/// 客户端错误分类
///
/// 界面只需要读取 [`ClientError::custom_message`] 作为展示文字。
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// 没有收到任何响应
    #[error("network error: {source}")]
    Network {
        #[source]
        source: reqwest::Error,
    },
    #[error("request timed out: {source}")]
    Timeout {
        #[source]
        source: reqwest::Error,
    },
    #[error("session expired: {message}")]
    SessionExpired { message: String },
    #[error("unauthorized: {}", message.as_deref().unwrap_or("no message"))]
    Unauthorized { message: Option<String> },
    #[error("validation failed: {} field error(s)", errors.len())]
    Validation {
        message: Option<String>,
        errors: Vec<FieldError>,
    },
    #[error("server responded with {status}: {}", message.as_deref().unwrap_or("no message"))]
    Server { status: u16, message: Option<String> },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("storage error: {0}")]
    Storage(#[from] super::storage::StorageError),
    #[error("notification channel error: {0}")]
    Channel(#[from] tokio_tungstenite::tungstenite::Error),
}

impl ClientError {
    pub(crate) fn from_transport(source: reqwest::Error) -> Self {
        if source.is_timeout() {
            ClientError::Timeout { source }
        } else if source.is_builder() {
            ClientError::InvalidRequest(source.to_string())
        } else {
            ClientError::Network { source }
        }
    }

    /// 规范化的展示消息：优先使用服务端消息，其次是通用提示
    pub fn custom_message(&self) -> String {
        match self {
            ClientError::Network { .. } | ClientError::Channel(_) => CONNECTION_MESSAGE.to_string(),
            ClientError::Timeout { .. } => TIMEOUT_MESSAGE.to_string(),
            ClientError::SessionExpired { .. } => SESSION_EXPIRED_MESSAGE.to_string(),
            ClientError::Unauthorized { message }
            | ClientError::Validation { message, .. }
            | ClientError::Server { message, .. } => message
                .clone()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| GENERIC_MESSAGE.to_string()),
            ClientError::MalformedResponse(_)
            | ClientError::InvalidRequest(_)
            | ClientError::Storage(_) => GENERIC_MESSAGE.to_string(),
        }
    }

    /// 服务端消息优先，其次是连接层提示，最后使用调用方给出的兜底文字
    pub fn message_or(&self, fallback: &str) -> String {
        match self {
            ClientError::Unauthorized { message }
            | ClientError::Validation { message, .. }
            | ClientError::Server { message, .. } => message
                .clone()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| fallback.to_string()),
            ClientError::SessionExpired { message } if !message.trim().is_empty() => {
                message.clone()
            }
            ClientError::Network { .. } | ClientError::Timeout { .. } => self.custom_message(),
            _ => fallback.to_string(),
        }
    }

    /// 字段级错误，供表单逐项展示
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            ClientError::Validation { errors, .. } => errors,
            _ => &[],
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::SessionExpired { .. } | ClientError::Unauthorized { .. } => Some(401),
            ClientError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// 是否为连接层面的失败（未收到响应）
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Network { .. } | ClientError::Timeout { .. })
    }

    /// 是否为服务端拒绝了身份
    pub fn is_auth_rejection(&self) -> bool {
        matches!(
            self,
            ClientError::SessionExpired { .. } | ClientError::Unauthorized { .. }
        )
    }

    /// 传输层错误的原始描述
    pub fn transport_message(&self) -> Option<String> {
        match self {
            ClientError::Network { source } | ClientError::Timeout { source } => {
                Some(source.to_string())
            }
            _ => None,
        }
    }
}

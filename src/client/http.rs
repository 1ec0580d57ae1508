use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use reqwest::header::{
    AUTHORIZATION, CONTENT_DISPOSITION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue,
};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::ClientError;
use super::navigation::{EXPIRED_LOGIN_PATH, LOGIN_PATH, Navigator};
use super::normalize::{extract_field_errors, extract_message, unwrap_envelope};
use super::session::SessionState;
use super::storage::{REDIRECT_KEY, SessionStorage, TOKEN_KEY, USER_KEY};
use crate::config::ClientConfig;

/// 单个请求的附加参数
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    pub query: Vec<(String, String)>,
    /// 指定本次请求使用的令牌，忽略存储中的令牌
    pub bearer: Option<String>,
    pub timeout: Option<Duration>,
}

impl RequestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// 二进制下载结果
#[derive(Debug, Clone)]
pub struct Download {
    pub content_type: Option<String>,
    pub content_disposition: Option<String>,
    pub bytes: Vec<u8>,
}

/// 服务端消息是否表示会话过期
pub fn is_expiry_message(message: &str) -> bool {
    message.to_ascii_lowercase().contains("expired")
}

fn bearer_value(token: &str) -> Result<HeaderValue, ClientError> {
    HeaderValue::from_str(&format!("Bearer {}", token))
        .map_err(|_| ClientError::InvalidRequest("token is not a valid header value".into()))
}

/// 所有客户端请求的唯一出口
///
/// 负责附加令牌、统一错误分类，以及会话过期后的清理与跳转。
pub struct ApiClient {
    http: reqwest::Client,
    config: ClientConfig,
    default_headers: RwLock<HeaderMap>,
    storage: Arc<dyn SessionStorage>,
    navigator: Arc<dyn Navigator>,
    session: SessionState,
}

impl ApiClient {
    pub fn new(
        config: ClientConfig,
        storage: Arc<dyn SessionStorage>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(ClientError::from_transport)?;

        let mut headers = HeaderMap::new();
        if let Some(token) = storage.get(TOKEN_KEY) {
            headers.insert(AUTHORIZATION, bearer_value(&token)?);
        }

        Ok(Self {
            http,
            config,
            default_headers: RwLock::new(headers),
            storage,
            navigator,
            session: SessionState::new(),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn storage(&self) -> &Arc<dyn SessionStorage> {
        &self.storage
    }

    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// 当前保存的令牌
    pub fn token(&self) -> Option<String> {
        self.storage.get(TOKEN_KEY).filter(|t| !t.is_empty())
    }

    /// 设置或移除令牌，同时更新默认请求头和持久化存储
    pub fn set_auth_token(&self, token: Option<&str>) -> Result<(), ClientError> {
        let mut headers = self
            .default_headers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        match token {
            Some(token) => {
                let value = bearer_value(token)?;
                self.storage.set(TOKEN_KEY, token)?;
                headers.insert(AUTHORIZATION, value);
            }
            None => {
                headers.remove(AUTHORIZATION);
                self.storage.remove(TOKEN_KEY)?;
            }
        }
        Ok(())
    }

    /// 同时清除令牌、备用身份和内存中的用户
    pub fn clear_session(&self) {
        let mut session = self.session.lock();
        self.default_headers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(AUTHORIZATION);
        for key in [TOKEN_KEY, USER_KEY] {
            if let Err(e) = self.storage.remove(key) {
                tracing::warn!(key, "Failed to clear session storage: {}", e);
            }
        }
        session.user = None;
        session.status = super::AuthStatus::Anonymous;
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// 发送请求并返回解析后的 JSON，失败时返回分类后的错误
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        config: Option<RequestConfig>,
    ) -> Result<Value, ClientError> {
        let response = self
            .send(method, path, body, config.unwrap_or_default())
            .await?;
        let bytes = response
            .bytes()
            .await
            .map_err(ClientError::from_transport)?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes)
            .map_err(|e| ClientError::MalformedResponse(format!("invalid JSON body: {}", e)))
    }

    /// 解开信封并反序列化为指定类型
    pub async fn request_data<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        config: Option<RequestConfig>,
    ) -> Result<T, ClientError> {
        let value = self.request(method, path, body, config).await?;
        serde_json::from_value(unwrap_envelope(value))
            .map_err(|e| ClientError::MalformedResponse(e.to_string()))
    }

    /// 以二进制形式获取响应
    pub async fn download(
        &self,
        path: &str,
        config: RequestConfig,
    ) -> Result<Download, ClientError> {
        let response = self.send(Method::GET, path, None, config).await?;
        let header = |name: HeaderName| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let content_type = header(CONTENT_TYPE);
        let content_disposition = header(CONTENT_DISPOSITION);
        let bytes = response
            .bytes()
            .await
            .map_err(ClientError::from_transport)?
            .to_vec();
        Ok(Download {
            content_type,
            content_disposition,
            bytes,
        })
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        config: RequestConfig,
    ) -> Result<reqwest::Response, ClientError> {
        let url = self.url(path);

        // 令牌在发送时读取，之后的变化不影响已发出的请求
        let mut headers = self
            .default_headers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        // 指定令牌的请求不属于当前会话，过期时不清理会话
        let session_token = match config.bearer {
            Some(_) => None,
            None => self.token(),
        };
        match config.bearer.clone().or_else(|| session_token.clone()) {
            Some(token) => {
                headers.insert(AUTHORIZATION, bearer_value(&token)?);
            }
            None => {
                headers.remove(AUTHORIZATION);
            }
        }

        let mut builder = self
            .http
            .request(method.clone(), &url)
            .headers(headers)
            .timeout(config.timeout.unwrap_or(self.config.request_timeout));
        if !config.query.is_empty() {
            builder = builder.query(&config.query);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        tracing::debug!(%method, %url, "sending request");
        let response = builder.send().await.map_err(|e| {
            tracing::warn!(%method, %url, "Request failed without response: {}", e);
            ClientError::from_transport(e)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let bytes = response.bytes().await.unwrap_or_default();
        let payload: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        tracing::debug!(%method, %url, %status, "request rejected");
        Err(self.classify_failure(status, &payload, session_token.as_deref()))
    }

    /// `sent_with` 为请求发出时附加的会话令牌
    fn classify_failure(
        &self,
        status: StatusCode,
        payload: &Value,
        sent_with: Option<&str>,
    ) -> ClientError {
        let message = extract_message(payload);

        if status == StatusCode::UNAUTHORIZED {
            if let Some(message) = message.as_deref().filter(|m| is_expiry_message(m)) {
                if let Some(token) = sent_with {
                    self.handle_session_expired(token);
                }
                return ClientError::SessionExpired {
                    message: message.to_string(),
                };
            }
            return ClientError::Unauthorized { message };
        }

        let errors = extract_field_errors(payload);
        if !errors.is_empty() {
            return ClientError::Validation { message, errors };
        }

        ClientError::Server {
            status: status.as_u16(),
            message,
        }
    }

    /// 仅当过期的令牌仍是当前令牌时清理会话并跳转
    fn handle_session_expired(&self, expired: &str) {
        if self.token().as_deref() != Some(expired) {
            tracing::debug!("Ignoring expiry of a replaced token");
            return;
        }
        let current = self.navigator.current_path();
        self.clear_session();

        if !current.starts_with(LOGIN_PATH) {
            if let Err(e) = self.storage.set(REDIRECT_KEY, &current) {
                tracing::warn!("Failed to store redirect path: {}", e);
            }
        }
        tracing::info!(from = %current, "Session expired, redirecting to login");
        self.navigator.navigate(EXPIRED_LOGIN_PATH);
    }
}

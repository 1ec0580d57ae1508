use std::sync::Arc;

use reqwest::Method;
use serde::Serialize;
use serde_json::{Value, json};

use super::error::ClientError;
use super::http::{ApiClient, RequestConfig};
use super::normalize::{AuthPayload, extract_message, normalize_auth_response, normalize_user};
use super::routing;
use super::session::AuthStatus;
use super::storage::{REDIRECT_KEY, StorageError, USER_KEY};
use crate::user::{Role, UserProfile};

pub const LOGIN_FAILED_MESSAGE: &str = "Login failed. Please try again.";
pub const REGISTRATION_FAILED_MESSAGE: &str = "Registration failed. Please try again.";
const FORGOT_PASSWORD_DEFAULT: &str =
    "If that email is registered, a password reset link has been sent.";
const PASSWORD_UPDATED_DEFAULT: &str = "Password updated";
const PASSWORD_RESET_DEFAULT: &str = "Password has been reset";

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

/// 客户端认证状态管理
///
/// 状态机：`Uninitialized -> Checking -> Authenticated | Anonymous`，
/// 登录、登出和服务端报告的会话过期都会触发转换。
#[derive(Clone)]
pub struct AuthManager {
    api: Arc<ApiClient>,
}

impl AuthManager {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &Arc<ApiClient> {
        &self.api
    }

    pub fn status(&self) -> AuthStatus {
        self.api.session().status()
    }

    pub fn current_user(&self) -> Option<UserProfile> {
        self.api.session().user()
    }

    pub fn is_authenticated(&self) -> bool {
        self.status() == AuthStatus::Authenticated
    }

    pub fn landing_path(&self) -> &'static str {
        routing::landing_path(self.current_user().and_then(|u| u.role()))
    }

    /// 取出并移除登录前保存的页面
    pub fn take_redirect(&self) -> Option<String> {
        let path = self.api.storage().get(REDIRECT_KEY)?;
        if let Err(e) = self.api.storage().remove(REDIRECT_KEY) {
            tracing::warn!("Failed to clear redirect path: {}", e);
        }
        Some(path)
    }

    fn fallback_user(&self) -> Option<UserProfile> {
        let raw = self.api.storage().get(USER_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::warn!("Ignoring unreadable stored user: {}", e);
                None
            }
        }
    }

    fn remember_user(&self, user: &UserProfile) {
        let stored = serde_json::to_string(user)
            .map_err(StorageError::from)
            .and_then(|raw| self.api.storage().set(USER_KEY, &raw));
        if let Err(e) = stored {
            tracing::warn!("Failed to store fallback user: {}", e);
        }
    }

    /// 启动时恢复会话
    ///
    /// 有令牌时先设置到请求头，再通过 `/auth/me` 确认身份。确认因网络或服务端
    /// 故障失败时使用本地保存的身份；令牌被服务端拒绝时清除会话。
    pub async fn initialize(&self) -> AuthStatus {
        let Some(token) = self.api.token() else {
            self.api.session().set_anonymous();
            return AuthStatus::Anonymous;
        };

        self.api.session().set_checking();
        if let Err(e) = self.api.set_auth_token(Some(&token)) {
            tracing::warn!("Failed to restore auth token: {}", e);
        }

        let confirmed = match self.api.request(Method::GET, "/auth/me", None, None).await {
            Ok(value) => normalize_user(value),
            Err(e) => Err(e),
        };

        match confirmed {
            Ok(user) => {
                self.remember_user(&user);
                self.api.session().authenticate(user);
            }
            Err(e) if e.is_auth_rejection() => {
                tracing::info!("Stored session rejected: {}", e);
                self.api.clear_session();
            }
            Err(e) => match self.fallback_user() {
                Some(user) => {
                    tracing::warn!("Identity check failed, using stored user: {}", e);
                    self.api.session().authenticate(user);
                }
                None => {
                    tracing::warn!("Identity check failed with no stored user: {}", e);
                    self.api.clear_session();
                }
            },
        }

        self.status()
    }

    /// 登录成功后保存令牌和身份；失败时不修改任何保存的状态
    pub async fn login(&self, credentials: &Credentials) -> Result<UserProfile, ClientError> {
        let body = json!(credentials);
        let value = self
            .api
            .request(Method::POST, "/auth/login", Some(&body), None)
            .await
            .inspect_err(|e| tracing::info!("Login failed: {}", e))?;
        self.establish(normalize_auth_response(value)?)
    }

    pub async fn register(&self, registration: &Registration) -> Result<UserProfile, ClientError> {
        let body = json!(registration);
        let value = self
            .api
            .request(Method::POST, "/auth/register", Some(&body), None)
            .await
            .inspect_err(|e| tracing::info!("Registration failed: {}", e))?;
        self.establish(normalize_auth_response(value)?)
    }

    fn establish(&self, payload: AuthPayload) -> Result<UserProfile, ClientError> {
        let AuthPayload { token, user } = payload;
        self.api.set_auth_token(Some(&token))?;
        let raw = serde_json::to_string(&user).map_err(StorageError::from)?;
        if let Err(e) = self.api.storage().set(USER_KEY, &raw) {
            self.api.clear_session();
            return Err(e.into());
        }
        self.api.session().authenticate(user.clone());
        tracing::info!(role = ?user.role(), "Signed in");
        Ok(user)
    }

    /// 本地状态立即清除，服务端登出只是尽力而为
    pub async fn logout(&self) {
        let token = self.api.token();
        self.api.clear_session();

        let Some(token) = token else {
            return;
        };
        let config = RequestConfig::new().bearer(token);
        if let Err(e) = self
            .api
            .request(Method::POST, "/auth/logout", None, Some(config))
            .await
        {
            tracing::warn!("Server-side logout failed: {}", e);
        }
    }

    pub async fn update_password(
        &self,
        current_password: &str,
        new_password: &str,
    ) -> Result<String, ClientError> {
        let body = json!({
            "current_password": current_password,
            "new_password": new_password,
        });
        let value = self
            .api
            .request(Method::PUT, "/auth/update-password", Some(&body), None)
            .await?;
        Ok(message_or(&value, PASSWORD_UPDATED_DEFAULT))
    }

    pub async fn forgot_password(&self, email: &str) -> Result<String, ClientError> {
        let body = json!({ "email": email });
        let value = self
            .api
            .request(Method::POST, "/auth/forgot-password", Some(&body), None)
            .await?;
        Ok(message_or(&value, FORGOT_PASSWORD_DEFAULT))
    }

    /// 使用邮件中的重置令牌设置新密码，不改变当前会话
    pub async fn reset_password(
        &self,
        reset_token: &str,
        new_password: &str,
    ) -> Result<String, ClientError> {
        let body = json!({ "token": reset_token, "new_password": new_password });
        let value = self
            .api
            .request(Method::POST, "/auth/reset-password", Some(&body), None)
            .await?;
        Ok(message_or(&value, PASSWORD_RESET_DEFAULT))
    }
}

fn message_or(value: &Value, fallback: &str) -> String {
    extract_message(value).unwrap_or_else(|| fallback.to_string())
}

/// 登录失败时展示的文字
pub fn login_error_message(err: &ClientError) -> String {
    err.message_or(LOGIN_FAILED_MESSAGE)
}

pub fn registration_error_message(err: &ClientError) -> String {
    err.message_or(REGISTRATION_FAILED_MESSAGE)
}

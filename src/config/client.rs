use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// 客户端配置
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API 根地址，例如 `http://localhost:5000/api`
    pub base_url: String,
    /// 通知通道地址，例如 `ws://localhost:5000/api/ws`
    pub ws_url: String,
    /// 每个请求的超时时间，请求从不重试
    pub request_timeout: Duration,
    /// 会话文件所在目录
    pub state_dir: PathBuf,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let ws_url = default_ws_url(&base_url);
        Self {
            base_url,
            ws_url,
            request_timeout: Duration::from_secs(30),
            state_dir: PathBuf::from(".sathira"),
        }
    }

    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        let mut config = Self::new(
            env::var("SATHIRA_API_URL").unwrap_or_else(|_| "http://localhost:5000/api".into()),
        );
        if let Ok(ws_url) = env::var("SATHIRA_WS_URL") {
            config.ws_url = ws_url;
        }
        if let Some(secs) = env::var("SATHIRA_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Ok(dir) = env::var("SATHIRA_STATE_DIR") {
            config.state_dir = PathBuf::from(dir);
        }
        config
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

fn default_ws_url(base_url: &str) -> String {
    let ws = if let Some(rest) = base_url.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = base_url.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        base_url.to_string()
    };
    format!("{}/ws", ws)
}

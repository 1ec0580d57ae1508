use serde::{Deserialize, Serialize};

/// 已吊销令牌缓存数据模型
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RevokedToken {
    pub user_id: String,
    pub expires_at: i64, // Unix timestamp
}

/// 密码重置令牌缓存数据模型
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PasswordReset {
    pub user_id: String,
    pub email: String,
    pub created_at: i64, // Unix timestamp
}

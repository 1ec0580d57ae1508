use std::time::Duration;

use crate::cache::keys::{password_reset_key, revoked_token_key};
use crate::cache::models::token::{PasswordReset, RevokedToken};
use crate::cache::store::{CacheError, CacheStore};
use crate::utils::token_fingerprint;

/// 令牌缓存操作
pub struct TokenCacheOperations;

impl TokenCacheOperations {
    /// 吊销令牌，缓存保留到令牌自身过期为止
    pub async fn revoke_token(
        store: &dyn CacheStore,
        token: &str,
        user_id: &str,
        expires_at: i64,
    ) -> Result<(), CacheError> {
        let ttl = expires_at - chrono::Utc::now().timestamp();
        if ttl <= 0 {
            return Ok(());
        }

        let revoked = RevokedToken {
            user_id: user_id.to_string(),
            expires_at,
        };
        let json = serde_json::to_string(&revoked)?;
        store
            .set_ex(
                &revoked_token_key(&token_fingerprint(token)),
                &json,
                Duration::from_secs(ttl as u64),
            )
            .await
    }

    /// 检查令牌是否已被吊销
    pub async fn is_revoked(store: &dyn CacheStore, token: &str) -> Result<bool, CacheError> {
        let key = revoked_token_key(&token_fingerprint(token));
        Ok(store.get(&key).await?.is_some())
    }

    /// 保存密码重置令牌
    pub async fn store_password_reset(
        store: &dyn CacheStore,
        reset_token: &str,
        user_id: &str,
        email: &str,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let reset = PasswordReset {
            user_id: user_id.to_string(),
            email: email.to_string(),
            created_at: chrono::Utc::now().timestamp(),
        };
        let json = serde_json::to_string(&reset)?;
        store
            .set_ex(&password_reset_key(reset_token), &json, ttl)
            .await
    }

    /// 取出并删除密码重置令牌，每个令牌只能使用一次
    pub async fn take_password_reset(
        store: &dyn CacheStore,
        reset_token: &str,
    ) -> Result<Option<PasswordReset>, CacheError> {
        let key = password_reset_key(reset_token);
        let Some(json) = store.get(&key).await? else {
            return Ok(None);
        };
        if store.delete(&[key]).await? == 0 {
            // 并发请求已经用掉了这个令牌
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&json)?))
    }
}

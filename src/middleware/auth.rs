use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};

use crate::{
    AppState,
    cache::TokenCacheOperations,
    error::AppError,
    utils::{token_error_to_app_error, verify_token},
};

/// 当前请求携带的原始令牌，供登出时吊销
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let token = match req.headers().typed_get::<Authorization<Bearer>>() {
        Some(Authorization(bearer)) => bearer.token().to_string(),
        None => return AppError::Unauthorized.into_response(),
    };

    let claims = match verify_token(&token, &state.config) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!("Token rejected: {}", e);
            return token_error_to_app_error(&e).into_response();
        }
    };

    // 吊销列表查询失败时放行，只记录日志
    match TokenCacheOperations::is_revoked(state.store.as_ref(), &token).await {
        Ok(true) => return AppError::Unauthorized.into_response(),
        Ok(false) => {}
        Err(e) => tracing::warn!("Failed to check token revocation: {}", e),
    }

    req.extensions_mut().insert(claims);
    req.extensions_mut().insert(BearerToken(token));
    next.run(req).await
}

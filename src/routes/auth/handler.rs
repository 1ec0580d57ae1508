use axum::{
    extract::{Extension, Json, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    AppState,
    cache::TokenCacheOperations,
    error::AppError,
    middleware::BearerToken,
    user::Role,
    utils::{
        Claims, generate_reset_token, generate_token, hash_password, message_to_api_response,
        success_to_api_response, validation::Validator, verify_password,
    },
};

use super::model::{
    AuthResponse, ForgotPasswordRequest, LoginRequest, RegisterRequest, ResetPasswordRequest,
    UpdatePasswordRequest, User,
};

fn issue_token(user: &User, state: &AppState) -> Result<AuthResponse, AppError> {
    let (token, expires_at) = generate_token(&user.id, user.role(), &state.config)
        .map_err(|e| AppError::Internal(format!("failed to generate token: {}", e)))?;
    Ok(AuthResponse {
        token,
        expires_at,
        user: user.profile(),
    })
}

fn hash(password: &str) -> Result<String, AppError> {
    hash_password(password).map_err(|e| AppError::Internal(format!("failed to hash password: {}", e)))
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    Validator::new()
        .require("username", &req.username, "Username")
        .require("password", &req.password, "Password")
        .finish()?;

    let user = User::find_by_username(&state.pool, &req.username)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let valid = verify_password(&req.password, &user.password_hash)
        .map_err(|e| AppError::Internal(format!("failed to verify password: {}", e)))?;
    if !valid {
        tracing::info!("Failed login attempt for {}", user.username);
        return Err(AppError::InvalidCredentials);
    }

    Ok(success_to_api_response(issue_token(&user, &state)?))
}

#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    Validator::new()
        .require("username", &req.username, "Username")
        .length("username", &req.username, 3, 32)
        .username("username", &req.username)
        .require("email", &req.email, "Email")
        .email("email", req.email.trim())
        .require("display_name", &req.display_name, "Display name")
        .length("display_name", &req.display_name, 2, 64)
        .password("password", &req.password)
        .finish()?;

    // 自助注册只能是商店或销售员；系统中还没有用户时允许创建第一个店主
    let role = match req.role.unwrap_or(Role::Shop) {
        role @ (Role::Shop | Role::Salesman) => role,
        Role::Owner if User::count(&state.pool).await? == 0 => Role::Owner,
        Role::Unknown => {
            return Err(AppError::Validation(vec![crate::common::FieldError::new(
                "role",
                "Unknown role",
            )]));
        }
        _ => return Err(AppError::Forbidden),
    };

    if User::find_by_username(&state.pool, &req.username).await?.is_some() {
        return Err(AppError::Conflict("Username is already taken".into()));
    }
    if User::find_by_email(&state.pool, &req.email).await?.is_some() {
        return Err(AppError::Conflict("Email is already registered".into()));
    }

    let password_hash = hash(&req.password)?;
    let user = match User::create(&state.pool, &req, role, &password_hash).await {
        Ok(user) => user,
        // 并发注册时由唯一约束兜底
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            return Err(AppError::Conflict("User already exists".into()));
        }
        Err(e) => return Err(e.into()),
    };

    Ok((
        StatusCode::CREATED,
        success_to_api_response(issue_token(&user, &state)?),
    ))
}

#[axum::debug_handler]
pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user = User::find_by_id(&state.pool, claims.user_id()?)
        .await?
        .ok_or(AppError::Unauthorized)?;
    Ok(success_to_api_response(user.profile()))
}

#[axum::debug_handler]
pub async fn logout(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Extension(BearerToken(token)): Extension<BearerToken>,
) -> impl IntoResponse {
    if let Err(e) =
        TokenCacheOperations::revoke_token(state.store.as_ref(), &token, &claims.sub, claims.exp)
            .await
    {
        tracing::warn!("Failed to revoke token for {}: {}", claims.sub, e);
    }
    message_to_api_response("Logged out")
}

#[axum::debug_handler]
pub async fn update_password(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdatePasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    Validator::new()
        .require("current_password", &req.current_password, "Current password")
        .password("new_password", &req.new_password)
        .check(
            "new_password",
            req.new_password != req.current_password,
            "New password must differ from the current password",
        )
        .finish()?;

    let user = User::find_by_id(&state.pool, claims.user_id()?)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let valid = verify_password(&req.current_password, &user.password_hash)
        .map_err(|e| AppError::Internal(format!("failed to verify password: {}", e)))?;
    if !valid {
        return Err(AppError::Validation(vec![crate::common::FieldError::new(
            "current_password",
            "Current password is incorrect",
        )]));
    }

    User::update_password(&state.pool, user.id, &hash(&req.new_password)?).await?;
    tracing::info!("Password updated for {}", user.username);
    Ok(message_to_api_response("Password updated"))
}

/// 无论邮箱是否存在都返回相同的消息
#[axum::debug_handler]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    Validator::new()
        .require("email", &req.email, "Email")
        .email("email", req.email.trim())
        .finish()?;

    if let Some(user) = User::find_by_email(&state.pool, &req.email).await? {
        let reset_token = generate_reset_token();
        match TokenCacheOperations::store_password_reset(
            state.store.as_ref(),
            &reset_token,
            &user.id.to_string(),
            &user.email,
            state.config.password_reset_ttl(),
        )
        .await
        {
            Ok(()) => tracing::info!(user = %user.username, "password reset issued"),
            Err(e) => tracing::warn!("Failed to store password reset token: {}", e),
        }
    }

    Ok(message_to_api_response(
        "If that email is registered, password reset instructions have been sent",
    ))
}

#[axum::debug_handler]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    Validator::new()
        .require("token", &req.token, "Reset token")
        .password("new_password", &req.new_password)
        .finish()?;

    let invalid = || {
        AppError::Validation(vec![crate::common::FieldError::new(
            "token",
            "Reset link is invalid or has expired",
        )])
    };
    let reset = TokenCacheOperations::take_password_reset(state.store.as_ref(), req.token.trim())
        .await
        .map_err(|e| AppError::Internal(format!("failed to read password reset: {}", e)))?
        .ok_or_else(invalid)?;
    let user_id = reset
        .user_id
        .parse::<uuid::Uuid>()
        .map_err(|_| invalid())?;

    let user = User::find_by_id(&state.pool, user_id)
        .await?
        .ok_or_else(invalid)?;
    User::update_password(&state.pool, user.id, &hash(&req.new_password)?).await?;
    tracing::info!("Password reset for {}", user.username);
    Ok(message_to_api_response("Password has been reset"))
}

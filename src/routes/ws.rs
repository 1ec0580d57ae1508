use axum::{
    Extension,
    extract::{
        Json, Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast::{self, error::RecvError};

use crate::{
    AppState,
    cache::TokenCacheOperations,
    error::AppError,
    notify::Notification,
    user::Role,
    utils::{
        Claims, message_to_api_response, token_error_to_app_error, validation::Validator,
        verify_token,
    },
};

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct AnnouncementRequest {
    pub message: String,
}

/// 只有店主可以发布公告
fn announcement(role: Role, req: &AnnouncementRequest) -> Result<Notification, AppError> {
    if role != Role::Owner {
        return Err(AppError::Forbidden);
    }
    let message = req.message.trim();
    Validator::new()
        .require("message", message, "Message")
        .length("message", message, 1, 500)
        .finish()?;
    Ok(Notification::Announcement {
        message: message.to_string(),
    })
}

#[axum::debug_handler]
pub async fn announce(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<AnnouncementRequest>,
) -> Result<impl IntoResponse, AppError> {
    let notification = announcement(claims.role, &req)?;
    tracing::info!(user_id = %claims.sub, "announcement published");
    state.notifier.publish(notification);
    Ok(message_to_api_response("Announcement sent"))
}

/// 浏览器无法为 WebSocket 设置请求头，令牌通过查询参数传入
pub async fn notifications(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
) -> Response {
    let claims = match verify_token(&query.token, &state.config) {
        Ok(claims) => claims,
        Err(e) => return token_error_to_app_error(&e).into_response(),
    };
    match TokenCacheOperations::is_revoked(state.store.as_ref(), &query.token).await {
        Ok(true) => return AppError::Unauthorized.into_response(),
        Ok(false) => {}
        Err(e) => tracing::warn!("Failed to check token revocation: {}", e),
    }

    let rx = state.notifier.subscribe();
    let user_id = claims.sub;
    ws.on_upgrade(move |socket| forward_notifications(socket, rx, user_id))
}

async fn forward_notifications(
    socket: WebSocket,
    mut rx: broadcast::Receiver<Notification>,
    user_id: String,
) {
    tracing::info!(%user_id, "notification channel opened");
    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            published = rx.recv() => match published {
                Ok(notification) => {
                    let text = match notification.to_json() {
                        Ok(text) => text,
                        Err(e) => {
                            tracing::error!("Failed to encode notification: {}", e);
                            continue;
                        }
                    };
                    if sender.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(%user_id, skipped, "notification subscriber lagged");
                }
                Err(RecvError::Closed) => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!(%user_id, "notification socket error: {}", e);
                    break;
                }
            },
        }
    }

    tracing::info!(%user_id, "notification channel closed");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(message: &str) -> AnnouncementRequest {
        AnnouncementRequest {
            message: message.to_string(),
        }
    }

    #[test]
    fn owner_announcement_is_trimmed() {
        let notification = announcement(Role::Owner, &request("  Stocktake at 5pm ")).unwrap();
        assert_eq!(
            notification,
            Notification::Announcement {
                message: "Stocktake at 5pm".into()
            }
        );
    }

    #[test]
    fn other_roles_cannot_announce() {
        for role in [Role::WarehouseManager, Role::Salesman, Role::Shop] {
            assert!(matches!(
                announcement(role, &request("hello")),
                Err(AppError::Forbidden)
            ));
        }
    }

    #[test]
    fn blank_announcement_is_rejected() {
        assert!(matches!(
            announcement(Role::Owner, &request("   ")),
            Err(AppError::Validation(_))
        ));
    }
}

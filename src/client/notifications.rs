use futures_util::StreamExt;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use uuid::Uuid;

use super::error::ClientError;
use super::http::ApiClient;
use crate::notify::Notification;

/// 每种通知对应一个方法，新增通知类型时编译器会要求补全
pub trait NotificationHandler: Send {
    fn product_created(&mut self, product_id: Uuid, name: &str);
    fn product_updated(&mut self, product_id: Uuid, name: &str);
    fn product_deleted(&mut self, product_id: Uuid);
    fn low_stock(&mut self, product_id: Uuid, name: &str, stock_quantity: i32, threshold: i32);
    fn supplier_updated(&mut self, supplier_id: Uuid, name: &str);
    fn announcement(&mut self, message: &str);
}

pub fn dispatch<H: NotificationHandler + ?Sized>(handler: &mut H, notification: &Notification) {
    match notification {
        Notification::ProductCreated { product_id, name } => {
            handler.product_created(*product_id, name)
        }
        Notification::ProductUpdated { product_id, name } => {
            handler.product_updated(*product_id, name)
        }
        Notification::ProductDeleted { product_id } => handler.product_deleted(*product_id),
        Notification::LowStock {
            product_id,
            name,
            stock_quantity,
            threshold,
        } => handler.low_stock(*product_id, name, *stock_quantity, *threshold),
        Notification::SupplierUpdated { supplier_id, name } => {
            handler.supplier_updated(*supplier_id, name)
        }
        Notification::Announcement { message } => handler.announcement(message),
    }
}

/// 处理一帧文本，无法解析的帧记录后跳过
pub fn handle_frame<H: NotificationHandler + ?Sized>(handler: &mut H, text: &str) -> bool {
    match Notification::from_json(text) {
        Ok(notification) => {
            dispatch(handler, &notification);
            true
        }
        Err(e) => {
            tracing::warn!("Skipping undecodable notification: {}", e);
            false
        }
    }
}

/// 通知通道的客户端
#[derive(Debug, Clone)]
pub struct NotificationListener {
    url: String,
}

impl NotificationListener {
    /// 使用当前会话的令牌
    pub fn for_session(api: &ApiClient) -> Result<Self, ClientError> {
        let token = api.token().ok_or_else(|| ClientError::Unauthorized {
            message: Some("Sign in to receive notifications".into()),
        })?;
        Self::with_token(&api.config().ws_url, &token)
    }

    pub fn with_token(ws_url: &str, token: &str) -> Result<Self, ClientError> {
        let url = reqwest::Url::parse_with_params(ws_url, &[("token", token)])
            .map_err(|e| ClientError::InvalidRequest(format!("invalid ws url: {}", e)))?;
        Ok(Self {
            url: url.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// 按到达顺序依次处理通知，直到服务端关闭连接
    pub async fn run<H: NotificationHandler + ?Sized>(
        &self,
        handler: &mut H,
    ) -> Result<(), ClientError> {
        let (mut socket, _) = connect_async(self.url.as_str()).await?;
        tracing::info!("Notification channel connected");

        while let Some(frame) = socket.next().await {
            match frame? {
                Message::Text(text) => {
                    handle_frame(handler, &text);
                }
                Message::Close(_) => break,
                _ => {}
            }
        }

        tracing::info!("Notification channel closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl NotificationHandler for Recorder {
        fn product_created(&mut self, _product_id: Uuid, name: &str) {
            self.events.push(format!("created {}", name));
        }
        fn product_updated(&mut self, _product_id: Uuid, name: &str) {
            self.events.push(format!("updated {}", name));
        }
        fn product_deleted(&mut self, _product_id: Uuid) {
            self.events.push("deleted".into());
        }
        fn low_stock(&mut self, _product_id: Uuid, name: &str, stock_quantity: i32, threshold: i32) {
            self.events
                .push(format!("low {} {}/{}", name, stock_quantity, threshold));
        }
        fn supplier_updated(&mut self, _supplier_id: Uuid, name: &str) {
            self.events.push(format!("supplier {}", name));
        }
        fn announcement(&mut self, message: &str) {
            self.events.push(format!("announce {}", message));
        }
    }

    #[test]
    fn frames_dispatch_in_arrival_order() {
        let id = Uuid::new_v4();
        let frames = [
            Notification::LowStock {
                product_id: id,
                name: "Kokis".into(),
                stock_quantity: 3,
                threshold: 10,
            }
            .to_json()
            .unwrap(),
            r#"{"type":"price_changed","product_id":"x"}"#.to_string(),
            r#"{"type":"announcement","message":"Stocktake at 5pm"}"#.to_string(),
        ];

        let mut recorder = Recorder::default();
        let handled: Vec<bool> = frames
            .iter()
            .map(|f| handle_frame(&mut recorder, f))
            .collect();

        assert_eq!(handled, vec![true, false, true]);
        assert_eq!(
            recorder.events,
            vec!["low Kokis 3/10", "announce Stocktake at 5pm"]
        );
    }

    #[test]
    fn token_is_query_encoded() {
        let listener = NotificationListener::with_token("ws://localhost:5000/api/ws", "a b").unwrap();
        assert_eq!(listener.url(), "ws://localhost:5000/api/ws?token=a+b");
    }
}

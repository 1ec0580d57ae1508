//! 实时通知
//!
//! 服务端在数据变更后通过广播通道发布通知，WebSocket 连接把每条通知
//! 以 JSON 文本帧转发给客户端。

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// 通知消息，`type` 字段区分变体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    ProductCreated { product_id: Uuid, name: String },
    ProductUpdated { product_id: Uuid, name: String },
    ProductDeleted { product_id: Uuid },
    LowStock {
        product_id: Uuid,
        name: String,
        stock_quantity: i32,
        threshold: i32,
    },
    SupplierUpdated { supplier_id: Uuid, name: String },
    Announcement { message: String },
}

impl Notification {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

const CHANNEL_CAPACITY: usize = 256;

/// 通知发布端，克隆后共享同一个广播通道
#[derive(Clone)]
pub struct Notifier {
    sender: broadcast::Sender<Notification>,
}

impl Notifier {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// 发布通知；没有订阅者时直接丢弃
    pub fn publish(&self, notification: Notification) {
        match self.sender.send(notification) {
            Ok(receivers) => tracing::debug!(receivers, "notification published"),
            Err(_) => tracing::debug!("notification dropped, no subscribers"),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

use async_trait::async_trait;
use domain::{Message, RoomId};
use thiserror::Error;

/// 广播到某个房间的一条已持久化消息。
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct MessageBroadcast {
    pub room_id: RoomId,
    pub message: Message,
}

impl MessageBroadcast {
    pub fn new(room_id: RoomId, message: Message) -> Self {
        Self { room_id, message }
    }
}

#[derive(Debug, Error)]
pub enum BroadcastError {
    #[error("broadcast failed: {0}")]
    Failed(String),
}

impl BroadcastError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// 消息实时分发接口。
///
/// 分发是尽力而为的低延迟便捷路径，消息的持久性由 `MessageRepository` 保证。
#[async_trait]
pub trait MessageBroadcaster: Send + Sync {
    async fn broadcast(&self, payload: MessageBroadcast) -> Result<(), BroadcastError>;
}

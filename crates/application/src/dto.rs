//! 对外暴露的数据传输对象。

use chrono::{DateTime, Utc};
use domain::{ChatRoom, Message, MessageType};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomDto {
    pub id: Uuid,
    pub product_id: Uuid,
    pub buyer_id: Uuid,
    pub seller_id: Uuid,
    pub last_message: Option<String>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ChatRoom> for RoomDto {
    fn from(room: ChatRoom) -> Self {
        Self {
            id: room.id.into(),
            product_id: room.product_id.into(),
            buyer_id: room.buyer_id.into(),
            seller_id: room.seller_id.into(),
            last_message: room.last_message,
            last_message_at: room.last_message_at,
            created_at: room.created_at,
            updated_at: room.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageDto {
    pub id: Uuid,
    pub room_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub message_type: MessageType,
    pub created_at: DateTime<Utc>,
}

impl From<Message> for MessageDto {
    fn from(message: Message) -> Self {
        Self {
            id: message.id.into(),
            room_id: message.room_id.into(),
            sender_id: message.sender_id.into(),
            content: message.content.into_inner(),
            message_type: message.message_type,
            created_at: message.created_at,
        }
    }
}

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;
use crate::value_objects::{ProductId, RoomId, Timestamp, UserId};

/// 聊天室实体。
///
/// 一个聊天室把一个买家、一个卖家和一个商品绑定在一起，
/// `(product_id, buyer_id, seller_id)` 三元组全局唯一。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRoom {
    pub id: RoomId,
    pub product_id: ProductId,
    pub buyer_id: UserId,
    pub seller_id: UserId,
    /// 最近一条消息的内容快照，用于会话列表展示
    pub last_message: Option<String>,
    pub last_message_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ChatRoom {
    pub fn new(
        id: RoomId,
        product_id: ProductId,
        buyer_id: UserId,
        seller_id: UserId,
        created_at: Timestamp,
    ) -> Result<Self, DomainError> {
        if buyer_id == seller_id {
            return Err(DomainError::invalid_argument(
                "buyer_id",
                "buyer and seller cannot be the same user",
            ));
        }
        Ok(Self {
            id,
            product_id,
            buyer_id,
            seller_id,
            last_message: None,
            last_message_at: None,
            created_at,
            updated_at: created_at,
        })
    }

    /// 判断某个用户是否为该房间的参与者（买家或卖家）。
    pub fn is_participant(&self, user_id: UserId) -> bool {
        self.buyer_id == user_id || self.seller_id == user_id
    }

    /// 记录最新一条消息的快照。
    pub fn touch_last_message(&mut self, preview: impl Into<String>, at: Timestamp) {
        self.last_message = Some(preview.into());
        self.last_message_at = Some(at);
        self.updated_at = at;
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;

    fn room() -> ChatRoom {
        ChatRoom::new(
            RoomId::new(Uuid::new_v4()),
            ProductId::new(Uuid::new_v4()),
            UserId::new(Uuid::new_v4()),
            UserId::new(Uuid::new_v4()),
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn rejects_self_chat() {
        let user = UserId::new(Uuid::new_v4());
        let result = ChatRoom::new(
            RoomId::new(Uuid::new_v4()),
            ProductId::new(Uuid::new_v4()),
            user,
            user,
            Utc::now(),
        );
        assert!(matches!(
            result,
            Err(DomainError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn participant_check_covers_both_sides() {
        let room = room();
        assert!(room.is_participant(room.buyer_id));
        assert!(room.is_participant(room.seller_id));
        assert!(!room.is_participant(UserId::new(Uuid::new_v4())));
    }

    #[test]
    fn touch_last_message_updates_snapshot() {
        let mut room = room();
        let at = Utc::now();
        room.touch_last_message("hello", at);
        assert_eq!(room.last_message.as_deref(), Some("hello"));
        assert_eq!(room.last_message_at, Some(at));
        assert_eq!(room.updated_at, at);
    }
}

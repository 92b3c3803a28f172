use std::sync::Arc;

use domain::{
    ChatRoom, DomainError, Message, MessageContent, MessageId, MessageType, ProductId,
    RepositoryError, RoomId, UserId,
};
use uuid::Uuid;

use crate::{
    broadcaster::{MessageBroadcast, MessageBroadcaster},
    clock::Clock,
    error::ApplicationError,
    repository::{ChatRoomRepository, MessageRepository, ProductDirectory},
};

/// 会话意向请求。
///
/// 买家发起时 `buyer_id` 留空，买家就是请求者本人；
/// 卖家发起时必须显式指定对话的买家。
#[derive(Debug, Clone)]
pub struct OpenRoomRequest {
    pub product_id: Uuid,
    pub requester_id: Uuid,
    pub buyer_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct SendMessageRequest {
    pub room_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub message_type: MessageType,
}

pub struct ChatServiceDependencies {
    pub room_repository: Arc<dyn ChatRoomRepository>,
    pub message_repository: Arc<dyn MessageRepository>,
    pub product_directory: Arc<dyn ProductDirectory>,
    pub clock: Arc<dyn Clock>,
    pub broadcaster: Arc<dyn MessageBroadcaster>,
}

pub struct ChatService {
    deps: ChatServiceDependencies,
}

impl ChatService {
    pub fn new(deps: ChatServiceDependencies) -> Self {
        Self { deps }
    }

    /// 解析会话意向并返回唯一的房间。
    ///
    /// 并发创建同一三元组时，数据库的唯一约束是唯一的仲裁者：
    /// 先读，不存在则创建，创建因约束冲突失败就重读一次返回赢家的行。
    /// 不加进程内锁，也不做重试循环。
    pub async fn open_room(&self, request: OpenRoomRequest) -> Result<ChatRoom, ApplicationError> {
        let product_id = ProductId::from(request.product_id);
        let requester_id = UserId::from(request.requester_id);

        let owner_id = self
            .deps
            .product_directory
            .find_owner(product_id)
            .await?
            .ok_or(DomainError::ProductNotFound)?;

        // 角色解析：商品归属者是卖家，另一方是买家
        let (buyer_id, seller_id) = if requester_id == owner_id {
            let buyer_id = request.buyer_id.map(UserId::from).ok_or_else(|| {
                DomainError::invalid_argument(
                    "buyer_id",
                    "required when the seller initiates the chat",
                )
            })?;
            (buyer_id, owner_id)
        } else {
            (requester_id, owner_id)
        };

        if buyer_id == seller_id {
            return Err(DomainError::invalid_argument(
                "buyer_id",
                "buyer and seller cannot be the same user",
            )
            .into());
        }

        if let Some(existing) = self
            .deps
            .room_repository
            .find_by_triple(product_id, buyer_id, seller_id)
            .await?
        {
            return Ok(existing);
        }

        let now = self.deps.clock.now();
        let room = ChatRoom::new(
            RoomId::from(Uuid::new_v4()),
            product_id,
            buyer_id,
            seller_id,
            now,
        )?;

        match self.deps.room_repository.create(room).await {
            Ok(created) => Ok(created),
            Err(RepositoryError::Conflict) => {
                // 并发请求抢先创建了同一房间，重读一次返回已存在的行
                tracing::debug!(
                    %product_id, %buyer_id, %seller_id,
                    "room creation lost the race, re-reading existing room"
                );
                self.deps
                    .room_repository
                    .find_by_triple(product_id, buyer_id, seller_id)
                    .await?
                    .ok_or_else(|| ApplicationError::from(DomainError::RoomNotFound))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// 发送消息：校验参与者身份，持久化，更新房间快照，再广播。
    pub async fn send_message(
        &self,
        request: SendMessageRequest,
    ) -> Result<Message, ApplicationError> {
        let room_id = RoomId::from(request.room_id);
        let sender_id = UserId::from(request.sender_id);

        self.ensure_participant(room_id, sender_id).await?;

        let content = MessageContent::parse(request.content)?;
        let now = self.deps.clock.now();
        let message = Message::new(
            MessageId::from(Uuid::new_v4()),
            room_id,
            sender_id,
            content,
            request.message_type,
            now,
        );

        let stored = self.deps.message_repository.create(message).await?;

        // 房间快照是尽力而为的簿记，失败时消息本身已落库，
        // 快照会在下一次成功发送时追上
        if let Err(err) = self
            .deps
            .room_repository
            .update_last_message(room_id, stored.content.as_str(), now)
            .await
        {
            tracing::warn!(%room_id, error = %err, "failed to update room last-message snapshot");
        }

        // 实时分发同样是尽力而为，订阅者可随时从消息历史补齐
        if let Err(err) = self
            .deps
            .broadcaster
            .broadcast(MessageBroadcast::new(room_id, stored.clone()))
            .await
        {
            tracing::warn!(%room_id, message_id = %stored.id, error = %err, "message persisted but broadcast failed");
        }

        Ok(stored)
    }

    /// 房间的完整消息历史，按创建时间升序。
    pub async fn list_messages(
        &self,
        room_id: Uuid,
        requester_id: Uuid,
    ) -> Result<Vec<Message>, ApplicationError> {
        let room_id = RoomId::from(room_id);
        let requester_id = UserId::from(requester_id);

        self.ensure_participant(room_id, requester_id).await?;

        let messages = self.deps.message_repository.list_by_room(room_id).await?;
        Ok(messages)
    }

    /// 用户参与的所有会话，最近更新的在前。
    pub async fn list_rooms(&self, user_id: Uuid) -> Result<Vec<ChatRoom>, ApplicationError> {
        let rooms = self
            .deps
            .room_repository
            .list_for_user(UserId::from(user_id))
            .await?;
        Ok(rooms)
    }

    /// 校验用户是该房间的买家或卖家，返回房间本身。
    ///
    /// WebSocket 加入房间前由门面层调用，分发器自身不做鉴权。
    pub async fn ensure_participant(
        &self,
        room_id: RoomId,
        user_id: UserId,
    ) -> Result<ChatRoom, ApplicationError> {
        let room = self
            .deps
            .room_repository
            .find_by_id(room_id)
            .await?
            .ok_or(DomainError::RoomNotFound)?;

        if !room.is_participant(user_id) {
            return Err(DomainError::NotParticipant.into());
        }

        Ok(room)
    }
}

//! 应用层仓储端口的 PostgreSQL 实现。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{
    ChatRoom, Message, MessageContent, MessageId, MessageType, ProductId, RepositoryError, RoomId,
    Timestamp, UserId,
};
use application::repository::{ChatRoomRepository, MessageRepository, ProductDirectory};
use sqlx::{query, query_as, query_scalar, FromRow, PgPool};
use uuid::Uuid;

fn map_sqlx_err(err: sqlx::Error) -> RepositoryError {
    match &err {
        sqlx::Error::RowNotFound => RepositoryError::NotFound,
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => RepositoryError::Conflict,
        _ => RepositoryError::storage(err.to_string()),
    }
}

fn invalid_data(message: impl Into<String>) -> RepositoryError {
    RepositoryError::storage(message)
}

#[derive(Debug, FromRow)]
struct RoomRecord {
    id: Uuid,
    product_id: Uuid,
    buyer_id: Uuid,
    seller_id: Uuid,
    last_message: Option<String>,
    last_message_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<RoomRecord> for ChatRoom {
    fn from(value: RoomRecord) -> Self {
        ChatRoom {
            id: RoomId::from(value.id),
            product_id: ProductId::from(value.product_id),
            buyer_id: UserId::from(value.buyer_id),
            seller_id: UserId::from(value.seller_id),
            last_message: value.last_message,
            last_message_at: value.last_message_at,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct MessageRecord {
    id: Uuid,
    room_id: Uuid,
    sender_id: Uuid,
    content: String,
    message_type: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<MessageRecord> for Message {
    type Error = RepositoryError;

    fn try_from(value: MessageRecord) -> Result<Self, Self::Error> {
        let content =
            MessageContent::parse(value.content).map_err(|err| invalid_data(err.to_string()))?;
        let message_type = match value.message_type.as_str() {
            "text" => MessageType::Text,
            "image" => MessageType::Image,
            "video" => MessageType::Video,
            other => return Err(invalid_data(format!("unknown message type: {other}"))),
        };

        Ok(Message {
            id: MessageId::from(value.id),
            room_id: RoomId::from(value.room_id),
            sender_id: UserId::from(value.sender_id),
            content,
            message_type,
            created_at: value.created_at,
        })
    }
}

fn message_type_column(message_type: MessageType) -> &'static str {
    match message_type {
        MessageType::Text => "text",
        MessageType::Image => "image",
        MessageType::Video => "video",
    }
}

/// 聊天室注册表的 PostgreSQL 实现。
///
/// `(product_id, buyer_id, seller_id)` 的唯一性由表上的唯一约束保证，
/// 冲突以 `RepositoryError::Conflict` 的形式交给服务层处理。
pub struct PgChatRoomRepository {
    pool: PgPool,
}

impl PgChatRoomRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChatRoomRepository for PgChatRoomRepository {
    async fn create(&self, room: ChatRoom) -> Result<ChatRoom, RepositoryError> {
        let record = query_as::<_, RoomRecord>(
            r#"
            INSERT INTO chat_rooms (id, product_id, buyer_id, seller_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, product_id, buyer_id, seller_id,
                      last_message, last_message_at, created_at, updated_at
            "#,
        )
        .bind(Uuid::from(room.id))
        .bind(Uuid::from(room.product_id))
        .bind(Uuid::from(room.buyer_id))
        .bind(Uuid::from(room.seller_id))
        .bind(room.created_at)
        .bind(room.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(record.into())
    }

    async fn find_by_id(&self, id: RoomId) -> Result<Option<ChatRoom>, RepositoryError> {
        let record = query_as::<_, RoomRecord>(
            r#"
            SELECT id, product_id, buyer_id, seller_id,
                   last_message, last_message_at, created_at, updated_at
            FROM chat_rooms WHERE id = $1
            "#,
        )
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(record.map(Into::into))
    }

    async fn find_by_triple(
        &self,
        product_id: ProductId,
        buyer_id: UserId,
        seller_id: UserId,
    ) -> Result<Option<ChatRoom>, RepositoryError> {
        let record = query_as::<_, RoomRecord>(
            r#"
            SELECT id, product_id, buyer_id, seller_id,
                   last_message, last_message_at, created_at, updated_at
            FROM chat_rooms
            WHERE product_id = $1 AND buyer_id = $2 AND seller_id = $3
            "#,
        )
        .bind(Uuid::from(product_id))
        .bind(Uuid::from(buyer_id))
        .bind(Uuid::from(seller_id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(record.map(Into::into))
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<ChatRoom>, RepositoryError> {
        let records = query_as::<_, RoomRecord>(
            r#"
            SELECT id, product_id, buyer_id, seller_id,
                   last_message, last_message_at, created_at, updated_at
            FROM chat_rooms
            WHERE buyer_id = $1 OR seller_id = $1
            ORDER BY updated_at DESC
            "#,
        )
        .bind(Uuid::from(user_id))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(records.into_iter().map(Into::into).collect())
    }

    async fn update_last_message(
        &self,
        room_id: RoomId,
        preview: &str,
        at: Timestamp,
    ) -> Result<(), RepositoryError> {
        let result = query(
            r#"
            UPDATE chat_rooms
            SET last_message = $2, last_message_at = $3, updated_at = $3
            WHERE id = $1
            "#,
        )
        .bind(Uuid::from(room_id))
        .bind(preview)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

/// 消息存储的 PostgreSQL 实现。
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    async fn create(&self, message: Message) -> Result<Message, RepositoryError> {
        let record = query_as::<_, MessageRecord>(
            r#"
            INSERT INTO messages (id, room_id, sender_id, content, message_type, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, room_id, sender_id, content, message_type, created_at
            "#,
        )
        .bind(Uuid::from(message.id))
        .bind(Uuid::from(message.room_id))
        .bind(Uuid::from(message.sender_id))
        .bind(message.content.as_str())
        .bind(message_type_column(message.message_type))
        .bind(message.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.try_into()
    }

    async fn list_by_room(&self, room_id: RoomId) -> Result<Vec<Message>, RepositoryError> {
        // seq 列保证同一时刻的消息按插入顺序稳定排序
        let records = query_as::<_, MessageRecord>(
            r#"
            SELECT id, room_id, sender_id, content, message_type, created_at
            FROM messages
            WHERE room_id = $1
            ORDER BY created_at ASC, seq ASC
            "#,
        )
        .bind(Uuid::from(room_id))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(TryInto::try_into).collect()
    }
}

/// 商品目录查询的 PostgreSQL 实现。
///
/// `products` 表归商品模块所有，这里只读取卖家归属。
pub struct PgProductDirectory {
    pool: PgPool,
}

impl PgProductDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductDirectory for PgProductDirectory {
    async fn find_owner(&self, product_id: ProductId) -> Result<Option<UserId>, RepositoryError> {
        let owner: Option<Uuid> = query_scalar("SELECT seller_id FROM products WHERE id = $1")
            .bind(Uuid::from(product_id))
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        Ok(owner.map(UserId::from))
    }
}

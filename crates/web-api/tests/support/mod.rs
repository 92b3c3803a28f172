//! 集成测试支撑：内存仓储 + 完整路由。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use domain::{ChatRoom, Message, ProductId, RepositoryError, RoomId, Timestamp, UserId};
use tokio::sync::RwLock;
use uuid::Uuid;

use application::{
    ChatRoomRepository, ChatService, ChatServiceDependencies, LocalMessageBroadcaster,
    MessageBroadcaster, MessageRepository, ProductDirectory, SystemClock,
};
use web_api::{router, AppState, JwtConfig, JwtService};

#[derive(Default)]
struct InMemoryRoomRepository {
    rooms: RwLock<Vec<ChatRoom>>,
}

#[async_trait]
impl ChatRoomRepository for InMemoryRoomRepository {
    async fn create(&self, room: ChatRoom) -> Result<ChatRoom, RepositoryError> {
        let mut rooms = self.rooms.write().await;
        let duplicate = rooms.iter().any(|r| {
            r.product_id == room.product_id
                && r.buyer_id == room.buyer_id
                && r.seller_id == room.seller_id
        });
        if duplicate {
            return Err(RepositoryError::Conflict);
        }
        rooms.push(room.clone());
        Ok(room)
    }

    async fn find_by_id(&self, id: RoomId) -> Result<Option<ChatRoom>, RepositoryError> {
        let rooms = self.rooms.read().await;
        Ok(rooms.iter().find(|r| r.id == id).cloned())
    }

    async fn find_by_triple(
        &self,
        product_id: ProductId,
        buyer_id: UserId,
        seller_id: UserId,
    ) -> Result<Option<ChatRoom>, RepositoryError> {
        let rooms = self.rooms.read().await;
        Ok(rooms
            .iter()
            .find(|r| {
                r.product_id == product_id && r.buyer_id == buyer_id && r.seller_id == seller_id
            })
            .cloned())
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<ChatRoom>, RepositoryError> {
        let rooms = self.rooms.read().await;
        let mut result: Vec<ChatRoom> = rooms
            .iter()
            .filter(|r| r.is_participant(user_id))
            .cloned()
            .collect();
        result.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(result)
    }

    async fn update_last_message(
        &self,
        room_id: RoomId,
        preview: &str,
        at: Timestamp,
    ) -> Result<(), RepositoryError> {
        let mut rooms = self.rooms.write().await;
        let room = rooms
            .iter_mut()
            .find(|r| r.id == room_id)
            .ok_or(RepositoryError::NotFound)?;
        room.touch_last_message(preview, at);
        Ok(())
    }
}

#[derive(Default)]
struct InMemoryMessageRepository {
    messages: RwLock<Vec<Message>>,
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn create(&self, message: Message) -> Result<Message, RepositoryError> {
        let mut messages = self.messages.write().await;
        messages.push(message.clone());
        Ok(message)
    }

    async fn list_by_room(&self, room_id: RoomId) -> Result<Vec<Message>, RepositoryError> {
        let messages = self.messages.read().await;
        let mut result: Vec<Message> = messages
            .iter()
            .filter(|m| m.room_id == room_id)
            .cloned()
            .collect();
        result.sort_by_key(|m| m.created_at);
        Ok(result)
    }
}

struct StaticProductDirectory {
    owners: HashMap<ProductId, UserId>,
}

#[async_trait]
impl ProductDirectory for StaticProductDirectory {
    async fn find_owner(&self, product_id: ProductId) -> Result<Option<UserId>, RepositoryError> {
        Ok(self.owners.get(&product_id).copied())
    }
}

pub struct TestApp {
    pub router: Router,
    pub jwt_service: Arc<JwtService>,
}

/// 构建一个挂满内存适配器的完整路由。
/// `products` 是 (商品ID, 卖家ID) 的种子数据。
pub fn build_app(products: &[(Uuid, Uuid)]) -> TestApp {
    let owners = products
        .iter()
        .map(|(product_id, seller_id)| (ProductId::from(*product_id), UserId::from(*seller_id)))
        .collect();

    let broadcaster = Arc::new(LocalMessageBroadcaster::new());
    let chat_service = Arc::new(ChatService::new(ChatServiceDependencies {
        room_repository: Arc::new(InMemoryRoomRepository::default()),
        message_repository: Arc::new(InMemoryMessageRepository::default()),
        product_directory: Arc::new(StaticProductDirectory { owners }),
        clock: Arc::new(SystemClock),
        broadcaster: broadcaster.clone() as Arc<dyn MessageBroadcaster>,
    }));

    let jwt_service = Arc::new(JwtService::new(JwtConfig {
        secret: "test-secret-key".to_string(),
        expiration_hours: 24,
    }));

    let state = AppState::new(chat_service, broadcaster, jwt_service.clone());

    TestApp {
        router: router(state),
        jwt_service,
    }
}

pub fn bearer(jwt_service: &JwtService, user_id: Uuid) -> String {
    let token = jwt_service.generate_token(user_id).expect("token");
    format!("Bearer {}", token)
}

/// 发送一次请求并把响应体解析成 JSON。
pub async fn send_request(
    router: &Router,
    method: &str,
    uri: &str,
    auth: Option<&str>,
    body: Option<serde_json::Value>,
) -> (axum::http::StatusCode, serde_json::Value) {
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        builder = builder.header("authorization", auth);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

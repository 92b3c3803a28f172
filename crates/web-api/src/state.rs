use std::sync::Arc;

use application::{ChatService, LocalMessageBroadcaster};

use crate::JwtService;

#[derive(Clone)]
pub struct AppState {
    pub chat_service: Arc<ChatService>,
    /// WebSocket 订阅需要具体类型，服务层只依赖 trait
    pub broadcaster: Arc<LocalMessageBroadcaster>,
    pub jwt_service: Arc<JwtService>,
}

impl AppState {
    pub fn new(
        chat_service: Arc<ChatService>,
        broadcaster: Arc<LocalMessageBroadcaster>,
        jwt_service: Arc<JwtService>,
    ) -> Self {
        Self {
            chat_service,
            broadcaster,
            jwt_service,
        }
    }
}

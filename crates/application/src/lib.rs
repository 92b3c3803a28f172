//! 应用层实现。
//!
//! 这里提供围绕领域模型的用例服务，处理输入校验、角色解析、
//! 以及对外部适配器（商品目录、消息广播、时钟）的抽象。

pub mod broadcaster;
pub mod clock;
pub mod dto;
pub mod error;
pub mod local_broadcast;
pub mod repository;
pub mod services;

pub use broadcaster::{BroadcastError, MessageBroadcast, MessageBroadcaster};
pub use clock::{Clock, SystemClock};
pub use dto::{MessageDto, RoomDto};
pub use error::ApplicationError;
pub use local_broadcast::{LocalMessageBroadcaster, MessageStream};
pub use repository::{ChatRoomRepository, MessageRepository, ProductDirectory};
pub use services::{ChatService, ChatServiceDependencies};

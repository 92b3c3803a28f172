//! 二手交易平台聊天子系统的核心领域模型
//!
//! 包含聊天室、消息两个实体，以及相关的值对象和错误定义。
//! 领域层不依赖任何 I/O，持久化和传输由外层适配。

pub mod chat_room;
pub mod errors;
pub mod message;
pub mod value_objects;

// 重新导出常用类型
pub use chat_room::ChatRoom;
pub use errors::{DomainError, RepositoryError};
pub use message::{Message, MessageType};
pub use value_objects::{MessageContent, MessageId, ProductId, RoomId, Timestamp, UserId};

//! 基础设施层。
//!
//! 提供应用层端口的 PostgreSQL 实现：聊天室注册表、消息存储、
//! 商品目录查询，以及连接池构建。

pub mod db;
pub mod repository;

pub use db::create_pg_pool;
pub use repository::{PgChatRoomRepository, PgMessageRepository, PgProductDirectory};

//! 领域错误定义。
//!
//! `DomainError` 描述业务规则失败，`RepositoryError` 描述持久化层失败，
//! 两者由应用层统一汇聚为 `ApplicationError`。

use thiserror::Error;

/// 领域错误类型
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("invalid argument {field}: {reason}")]
    InvalidArgument { field: String, reason: String },
    #[error("product not found")]
    ProductNotFound,
    #[error("chat room not found")]
    RoomNotFound,
    #[error("user is not a participant of this room")]
    NotParticipant,
}

impl DomainError {
    pub fn invalid_argument(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// 持久化层错误类型
///
/// `Conflict` 对应数据库唯一约束冲突，是聊天室注册表并发创建时
/// 唯一会在内部恢复的错误。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("unique constraint violated")]
    Conflict,
    #[error("storage error: {message}")]
    Storage { message: String },
}

impl RepositoryError {
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }
}

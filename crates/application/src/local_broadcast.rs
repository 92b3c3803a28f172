//! 进程内的房间级消息分发器。
//!
//! 每个房间对应一个 `tokio::sync::broadcast` 通道，订阅者注册表由
//! `RwLock<HashMap>` 保护。状态只存在于当前进程，多实例部署需要
//! 外部消息中间件，这是已知的设计边界。

use std::collections::HashMap;

use async_trait::async_trait;
use domain::RoomId;
use tokio::sync::{broadcast, RwLock};

use crate::broadcaster::{BroadcastError, MessageBroadcast, MessageBroadcaster};

const DEFAULT_CAPACITY: usize = 256;

pub struct LocalMessageBroadcaster {
    capacity: usize,
    channels: RwLock<HashMap<RoomId, broadcast::Sender<MessageBroadcast>>>,
}

impl LocalMessageBroadcaster {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            channels: RwLock::new(HashMap::new()),
        }
    }

    /// 订阅某个房间的消息流。通道不存在时惰性创建。
    ///
    /// 订阅者只会收到订阅之后发布的消息，历史消息走 `MessageRepository`。
    pub async fn subscribe(&self, room_id: RoomId) -> MessageStream {
        let mut channels = self.channels.write().await;
        let sender = channels
            .entry(room_id)
            .or_insert_with(|| broadcast::channel(self.capacity).0);
        MessageStream {
            receiver: sender.subscribe(),
        }
    }

    /// 当前注册的房间通道数量，供测试和诊断使用。
    pub async fn channel_count(&self) -> usize {
        self.channels.read().await.len()
    }
}

impl Default for LocalMessageBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageBroadcaster for LocalMessageBroadcaster {
    async fn broadcast(&self, payload: MessageBroadcast) -> Result<(), BroadcastError> {
        let room_id = payload.room_id;
        let stale = {
            let channels = self.channels.read().await;
            match channels.get(&room_id) {
                // send 失败表示已经没有存活的订阅者
                Some(sender) => sender.send(payload).is_err(),
                // 房间没人在线，消息只走持久化路径
                None => false,
            }
        };

        if stale {
            let mut channels = self.channels.write().await;
            if let Some(sender) = channels.get(&room_id) {
                if sender.receiver_count() == 0 {
                    channels.remove(&room_id);
                }
            }
        }

        Ok(())
    }
}

/// 单个订阅者持有的消息流。
pub struct MessageStream {
    receiver: broadcast::Receiver<MessageBroadcast>,
}

impl MessageStream {
    /// 接收下一条广播。通道关闭时返回 `None`；
    /// 订阅者落后被挤出缓冲区时跳过丢失的部分继续接收。
    pub async fn recv(&mut self) -> Option<MessageBroadcast> {
        loop {
            match self.receiver.recv().await {
                Ok(broadcast) => return Some(broadcast),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "message stream lagged, dropping missed broadcasts");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

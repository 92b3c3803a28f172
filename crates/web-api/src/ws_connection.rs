//! WebSocket 连接处理。
//!
//! 每个连接先通过 JWT 确认身份，之后客户端发送 `join_room` 意向，
//! 门面层在订阅前校验参与者资格，再把房间广播转发给客户端。
//! 连接断开即丢弃全部订阅状态，重连需要重新 join。

use application::MessageDto;
use axum::extract::ws::{Message as WsMessage, WebSocket};
use domain::{RoomId, UserId};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::state::AppState;

/// 客户端发来的控制帧
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientFrame {
    JoinRoom { room_id: Uuid },
}

/// 服务端推送的事件帧
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerFrame {
    Joined { room_id: Uuid },
    NewMessage { message: MessageDto },
    Error { message: String },
}

pub struct WebSocketConnection {
    socket: Option<WebSocket>,
    state: AppState,
    user_id: Uuid,
}

impl WebSocketConnection {
    pub fn new(socket: WebSocket, state: AppState, user_id: Uuid) -> Self {
        Self {
            socket: Some(socket),
            state,
            user_id,
        }
    }

    /// 连接主循环：处理客户端控制帧，并把当前房间的广播转发出去。
    pub async fn run(mut self) {
        let user_id = self.user_id;
        tracing::info!(%user_id, "websocket connection established");

        let socket = self.socket.take().expect("socket should be available");
        let (mut ws_tx, mut ws_rx) = socket.split();

        // 订阅转发任务通过 mpsc 与写端解耦
        let (out_tx, mut out_rx) = mpsc::channel::<ServerFrame>(32);
        let mut forward_task: Option<JoinHandle<()>> = None;

        loop {
            tokio::select! {
                Some(frame) = out_rx.recv() => {
                    let payload = match serde_json::to_string(&frame) {
                        Ok(json) => json,
                        Err(err) => {
                            tracing::warn!(error = %err, "failed to serialize websocket frame");
                            continue;
                        }
                    };
                    if ws_tx.send(WsMessage::Text(payload.into())).await.is_err() {
                        break;
                    }
                }
                maybe = ws_rx.next() => {
                    match maybe {
                        Some(Ok(WsMessage::Text(text))) => {
                            self.handle_client_frame(text.as_str(), &out_tx, &mut forward_task)
                                .await;
                        }
                        Some(Ok(WsMessage::Ping(data))) => {
                            if ws_tx.send(WsMessage::Pong(data)).await.is_err() {
                                break;
                            }
                        }
                        Some(Ok(WsMessage::Close(_))) | None => break,
                        Some(Ok(_)) => {}
                        Some(Err(err)) => {
                            tracing::debug!(%user_id, error = %err, "websocket receive error");
                            break;
                        }
                    }
                }
            }
        }

        if let Some(task) = forward_task {
            task.abort();
        }
        tracing::info!(%user_id, "websocket connection closed");
    }

    async fn handle_client_frame(
        &mut self,
        text: &str,
        out_tx: &mpsc::Sender<ServerFrame>,
        forward_task: &mut Option<JoinHandle<()>>,
    ) {
        let frame = match serde_json::from_str::<ClientFrame>(text) {
            Ok(frame) => frame,
            Err(err) => {
                let _ = out_tx
                    .send(ServerFrame::Error {
                        message: format!("malformed frame: {}", err),
                    })
                    .await;
                return;
            }
        };

        match frame {
            ClientFrame::JoinRoom { room_id } => {
                self.join_room(room_id, out_tx, forward_task).await;
            }
        }
    }

    /// 加入房间：鉴权在订阅之前，分发器本身不做任何权限判断。
    async fn join_room(
        &mut self,
        room_id: Uuid,
        out_tx: &mpsc::Sender<ServerFrame>,
        forward_task: &mut Option<JoinHandle<()>>,
    ) {
        let check = self
            .state
            .chat_service
            .ensure_participant(RoomId::from(room_id), UserId::from(self.user_id))
            .await;

        if let Err(err) = check {
            tracing::debug!(user_id = %self.user_id, %room_id, error = %err, "join_room rejected");
            let _ = out_tx
                .send(ServerFrame::Error {
                    message: format!("cannot join room: {}", err),
                })
                .await;
            return;
        }

        // 新的 join 替换旧订阅，一个连接同一时刻只跟随一个房间
        if let Some(task) = forward_task.take() {
            task.abort();
        }

        let mut stream = self.state.broadcaster.subscribe(RoomId::from(room_id)).await;
        let tx = out_tx.clone();
        *forward_task = Some(tokio::spawn(async move {
            while let Some(broadcast) = stream.recv().await {
                let frame = ServerFrame::NewMessage {
                    message: broadcast.message.into(),
                };
                if tx.send(frame).await.is_err() {
                    break;
                }
            }
        }));

        let _ = out_tx.send(ServerFrame::Joined { room_id }).await;
        tracing::info!(user_id = %self.user_id, %room_id, "joined room stream");
    }
}

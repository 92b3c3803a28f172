use axum::{
    extract::{Path, Query, State, WebSocketUpgrade},
    http::{HeaderMap, StatusCode},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use application::{
    services::{OpenRoomRequest, SendMessageRequest},
    MessageDto, RoomDto,
};
use domain::MessageType;

use crate::{error::ApiError, state::AppState, ws_connection::WebSocketConnection};

#[derive(Debug, Deserialize)]
struct OpenRoomPayload {
    product_id: Uuid,
    /// 卖家主动发起会话时必填，买家发起时留空
    buyer_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
struct SendMessagePayload {
    chat_room_id: Uuid,
    content: String,
    #[serde(default)]
    message_type: MessageType,
}

#[derive(Debug, Deserialize)]
struct WebSocketQuery {
    token: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/chat/rooms", post(open_room).get(list_rooms))
        .route("/chat/messages", post(send_message))
        .route("/chat/messages/{room_id}", get(list_messages))
        .route("/chat/ws", get(websocket_upgrade))
}

async fn health() -> StatusCode {
    StatusCode::OK
}

/// 会话意向：解析买卖双方角色并返回唯一的房间。
async fn open_room(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<OpenRoomPayload>,
) -> Result<(StatusCode, Json<RoomDto>), ApiError> {
    let requester_id = state.jwt_service.extract_user_from_headers(&headers)?;

    let room = state
        .chat_service
        .open_room(OpenRoomRequest {
            product_id: payload.product_id,
            requester_id,
            buyer_id: payload.buyer_id,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(room.into())))
}

async fn list_rooms(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<RoomDto>>, ApiError> {
    let requester_id = state.jwt_service.extract_user_from_headers(&headers)?;

    let rooms = state.chat_service.list_rooms(requester_id).await?;
    Ok(Json(rooms.into_iter().map(Into::into).collect()))
}

async fn send_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<SendMessagePayload>,
) -> Result<(StatusCode, Json<MessageDto>), ApiError> {
    let sender_id = state.jwt_service.extract_user_from_headers(&headers)?;

    let message = state
        .chat_service
        .send_message(SendMessageRequest {
            room_id: payload.chat_room_id,
            sender_id,
            content: payload.content,
            message_type: payload.message_type,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(message.into())))
}

async fn list_messages(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(room_id): Path<Uuid>,
) -> Result<Json<Vec<MessageDto>>, ApiError> {
    let requester_id = state.jwt_service.extract_user_from_headers(&headers)?;

    let messages = state
        .chat_service
        .list_messages(room_id, requester_id)
        .await?;
    Ok(Json(messages.into_iter().map(Into::into).collect()))
}

/// WebSocket 升级。浏览器无法在升级请求上带自定义 header，
/// token 走查询参数。
async fn websocket_upgrade(
    State(state): State<AppState>,
    Query(query): Query<WebSocketQuery>,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    let claims = state.jwt_service.verify_token(&query.token)?;
    let user_id = claims.user_id;

    tracing::info!(%user_id, "websocket upgrade accepted");

    Ok(ws.on_upgrade(move |socket| WebSocketConnection::new(socket, state, user_id).run()))
}

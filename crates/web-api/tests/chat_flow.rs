//! 聊天门面的端到端流程测试（REST 部分）。

mod support;

use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use support::{bearer, build_app, send_request};

#[tokio::test]
async fn full_chat_flow() {
    let product_id = Uuid::new_v4();
    let seller_id = Uuid::new_v4();
    let buyer_id = Uuid::new_v4();
    let outsider_id = Uuid::new_v4();

    let app = build_app(&[(product_id, seller_id)]);
    let buyer_auth = bearer(&app.jwt_service, buyer_id);
    let outsider_auth = bearer(&app.jwt_service, outsider_id);

    // 买家发起会话意向
    let (status, room) = send_request(
        &app.router,
        "POST",
        "/api/v1/chat/rooms",
        Some(&buyer_auth),
        Some(json!({ "product_id": product_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(room["buyer_id"], json!(buyer_id));
    assert_eq!(room["seller_id"], json!(seller_id));
    let room_id = room["id"].as_str().unwrap().to_string();

    // 买家发送消息
    let (status, message) = send_request(
        &app.router,
        "POST",
        "/api/v1/chat/messages",
        Some(&buyer_auth),
        Some(json!({ "chat_room_id": room_id, "content": "hello" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(message["content"], json!("hello"));
    assert_eq!(message["message_type"], json!("text"));

    // 历史按升序返回
    let (status, history) = send_request(
        &app.router,
        "GET",
        &format!("/api/v1/chat/messages/{}", room_id),
        Some(&buyer_auth),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["content"], json!("hello"));

    // 会话列表带最近消息快照
    let (status, rooms) = send_request(
        &app.router,
        "GET",
        "/api/v1/chat/rooms",
        Some(&buyer_auth),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rooms.as_array().unwrap().len(), 1);
    assert_eq!(rooms[0]["last_message"], json!("hello"));

    // 第三方既不能读也不能写
    let (status, body) = send_request(
        &app.router,
        "GET",
        &format!("/api/v1/chat/messages/{}", room_id),
        Some(&outsider_auth),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], json!("NOT_ROOM_PARTICIPANT"));

    let (status, _) = send_request(
        &app.router,
        "POST",
        "/api/v1/chat/messages",
        Some(&outsider_auth),
        Some(json!({ "chat_room_id": room_id, "content": "intruder" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn repeated_intent_returns_same_room() {
    let product_id = Uuid::new_v4();
    let seller_id = Uuid::new_v4();
    let buyer_id = Uuid::new_v4();

    let app = build_app(&[(product_id, seller_id)]);
    let buyer_auth = bearer(&app.jwt_service, buyer_id);
    let payload = json!({ "product_id": product_id });

    let (status, first) = send_request(
        &app.router,
        "POST",
        "/api/v1/chat/rooms",
        Some(&buyer_auth),
        Some(payload.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, second) = send_request(
        &app.router,
        "POST",
        "/api/v1/chat/rooms",
        Some(&buyer_auth),
        Some(payload),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["id"], second["id"]);
}

#[tokio::test]
async fn seller_intent_without_buyer_is_rejected() {
    let product_id = Uuid::new_v4();
    let seller_id = Uuid::new_v4();

    let app = build_app(&[(product_id, seller_id)]);
    let seller_auth = bearer(&app.jwt_service, seller_id);

    let (status, body) = send_request(
        &app.router,
        "POST",
        "/api/v1/chat/rooms",
        Some(&seller_auth),
        Some(json!({ "product_id": product_id })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], json!("INVALID_ARGUMENT"));
}

#[tokio::test]
async fn self_chat_is_rejected() {
    let product_id = Uuid::new_v4();
    let seller_id = Uuid::new_v4();

    let app = build_app(&[(product_id, seller_id)]);
    let seller_auth = bearer(&app.jwt_service, seller_id);

    let (status, body) = send_request(
        &app.router,
        "POST",
        "/api/v1/chat/rooms",
        Some(&seller_auth),
        Some(json!({ "product_id": product_id, "buyer_id": seller_id })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], json!("INVALID_ARGUMENT"));
}

#[tokio::test]
async fn unknown_product_is_not_found() {
    let app = build_app(&[]);
    let auth = bearer(&app.jwt_service, Uuid::new_v4());

    let (status, body) = send_request(
        &app.router,
        "POST",
        "/api/v1/chat/rooms",
        Some(&auth),
        Some(json!({ "product_id": Uuid::new_v4() })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], json!("PRODUCT_NOT_FOUND"));
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let app = build_app(&[]);

    let (status, body) = send_request(&app.router, "GET", "/api/v1/chat/rooms", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], json!("UNAUTHORIZED"));
}

#[tokio::test]
async fn health_endpoint_is_open() {
    let app = build_app(&[]);
    let (status, _) = send_request(&app.router, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

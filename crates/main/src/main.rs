//! 主应用程序入口
//!
//! 启动聊天服务的 Axum Web API。

use std::sync::Arc;

use application::{
    ChatService, ChatServiceDependencies, LocalMessageBroadcaster, MessageBroadcaster, SystemClock,
};
use config::AppConfig;
use infrastructure::{
    create_pg_pool, PgChatRoomRepository, PgMessageRepository, PgProductDirectory,
};
use tracing_subscriber::EnvFilter;
use web_api::{router, AppState, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = AppConfig::from_env_with_defaults();

    tracing::info!(
        "连接数据库: {}",
        config.database.url.split('@').next_back().unwrap_or("unknown")
    );

    let pg_pool = create_pg_pool(&config.database.url, config.database.max_connections).await?;

    // 运行迁移
    sqlx::migrate!("../../migrations").run(&pg_pool).await?;

    // 持久化适配器
    let room_repository = Arc::new(PgChatRoomRepository::new(pg_pool.clone()));
    let message_repository = Arc::new(PgMessageRepository::new(pg_pool.clone()));
    let product_directory = Arc::new(PgProductDirectory::new(pg_pool));

    // 进程内实时分发器
    let broadcaster = Arc::new(LocalMessageBroadcaster::with_capacity(
        config.broadcast.capacity,
    ));

    let chat_service = Arc::new(ChatService::new(ChatServiceDependencies {
        room_repository,
        message_repository,
        product_directory,
        clock: Arc::new(SystemClock),
        broadcaster: broadcaster.clone() as Arc<dyn MessageBroadcaster>,
    }));

    let jwt_service = Arc::new(JwtService::new(config.jwt.clone()));

    let state = AppState::new(chat_service, broadcaster, jwt_service);

    // 启动 Web 服务器
    let app = router(state);
    let listener =
        tokio::net::TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;

    tracing::info!(
        "聊天服务启动在 http://{}:{}",
        config.server.host,
        config.server.port
    );
    axum::serve(listener, app).await?;

    Ok(())
}

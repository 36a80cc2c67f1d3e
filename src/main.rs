use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use huddle::http::router;
use huddle::room::InMemoryRoomRegistry;
use huddle::shared::{AppError, AppState, ServerConfig};
use huddle::websockets::InMemoryConnectionManager;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "huddle=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting huddle room coordinator");

    let config = ServerConfig::from_env()?;

    // Single in-memory instance owns all room state; the HTTP CRUD and
    // persistence layers live in sibling services
    let registry = Arc::new(InMemoryRoomRegistry::new());
    let connections = Arc::new(InMemoryConnectionManager::new());
    let app = router(AppState::new(registry, connections));

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    info!(port = config.port, "Server running");
    axum::serve(listener, app).await?;

    Ok(())
}

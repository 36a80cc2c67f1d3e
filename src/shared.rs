use std::sync::Arc;
use thiserror::Error;

use crate::room::manager::RoomManager;
use crate::room::registry::RoomRegistry;
use crate::signaling::SignalingRelay;
use crate::websockets::connection_manager::ConnectionManager;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<dyn RoomRegistry>,
    pub connections: Arc<dyn ConnectionManager>,
    pub rooms: Arc<RoomManager>,
    pub relay: Arc<SignalingRelay>,
}

impl AppState {
    pub fn new(registry: Arc<dyn RoomRegistry>, connections: Arc<dyn ConnectionManager>) -> Self {
        let rooms = Arc::new(RoomManager::new(
            Arc::clone(&registry),
            Arc::clone(&connections),
        ));
        let relay = Arc::new(SignalingRelay::new(
            Arc::clone(&registry),
            Arc::clone(&connections),
        ));
        Self {
            registry,
            connections,
            rooms,
            relay,
        }
    }
}

/// Process-level failures surfaced from startup
#[derive(Error, Debug)]
pub enum AppError {
    #[error("invalid PORT value: {0}")]
    InvalidPort(#[from] std::num::ParseIntError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Listener configuration, resolved from the environment
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub port: u16,
}

impl ServerConfig {
    pub const DEFAULT_PORT: u16 = 20001;

    /// Reads `PORT`, falling back to the default when unset
    pub fn from_env() -> Result<Self, AppError> {
        let port = match std::env::var("PORT") {
            Ok(value) => value.parse()?,
            Err(_) => Self::DEFAULT_PORT,
        };
        Ok(Self { port })
    }

    pub fn bind_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

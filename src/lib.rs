// Library crate for the huddle room coordinator
// This file exposes the public API for integration tests

pub mod http;
pub mod room;
pub mod shared;
pub mod signaling;
pub mod websockets;

// Re-export commonly used types for easier access in tests
pub use room::{InMemoryRoomRegistry, Room, RoomError, RoomManager, RoomRegistry, RoomSummary};
pub use shared::{AppError, AppState, ServerConfig};
pub use signaling::SignalingRelay;
pub use websockets::{
    ClientEvent, ConnectionId, ConnectionManager, ConnectionSession, InMemoryConnectionManager,
    MessageHandler, ServerEvent,
};

// Public API
pub use manager::{RoomError, RoomManager, MAX_MESSAGE_CHARS};
pub use models::{Room, RoomSummary};
pub use registry::{InMemoryRoomRegistry, RoomRegistry};

// Internal modules
pub mod manager;
pub mod models;
pub mod registry;

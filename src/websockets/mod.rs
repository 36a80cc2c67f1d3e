// Public API
pub use connection_manager::{ConnectionId, ConnectionManager, InMemoryConnectionManager};
pub use handler::{websocket_handler, EventDispatcher};
pub use messages::{ClientEvent, ServerEvent};
pub use session::ConnectionSession;
pub use socket::MessageHandler;

// Internal modules
pub mod connection_manager;
mod handler;
pub mod messages;
pub mod session;
mod socket;

use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use huddle::room::{InMemoryRoomRegistry, RoomManager};
use huddle::signaling::SignalingRelay;
use huddle::websockets::{ConnectionId, ConnectionManager, ConnectionSession};

use super::mocks::MockConnectionManager;

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

/// A simulated client: transport id plus the session its connection task
/// would own.
pub struct TestClient {
    pub id: ConnectionId,
    pub session: ConnectionSession,
}

pub struct TestSetup {
    pub registry: Arc<InMemoryRoomRegistry>,
    pub transport: Arc<MockConnectionManager>,
    pub rooms: Arc<RoomManager>,
    pub relay: Arc<SignalingRelay>,
}

impl TestSetup {
    pub fn new() -> Self {
        let registry = Arc::new(InMemoryRoomRegistry::new());
        let transport = Arc::new(MockConnectionManager::new());
        let rooms = Arc::new(RoomManager::new(registry.clone(), transport.clone()));
        let relay = Arc::new(SignalingRelay::new(registry.clone(), transport.clone()));
        Self {
            registry,
            transport,
            rooms,
            relay,
        }
    }

    /// Open a connection that has not yet identified itself
    pub async fn connect_unidentified(&self) -> TestClient {
        let id = Uuid::new_v4();
        let (sender, _receiver) = mpsc::unbounded_channel();
        self.transport.add_connection(id, sender).await;
        TestClient {
            id,
            session: ConnectionSession::new(),
        }
    }

    /// Open a connection and identify it with a display name
    pub async fn connect(&self, name: &str) -> TestClient {
        let mut client = self.connect_unidentified().await;
        client.session.identity = Some(name.to_string());
        self.transport.set_identity(&client.id, name).await;
        client
    }

    /// Shorthand: connect, create a room, join it
    pub async fn connect_into_room(&self, name: &str, room: &str) -> TestClient {
        let mut client = self.connect(name).await;
        let _ = self.rooms.create_room(&client.id, &client.session, room).await;
        self.rooms
            .join_room(&client.id, &mut client.session, room)
            .await
            .expect("join of freshly created room must succeed");
        client
    }
}

impl Default for TestSetup {
    fn default() -> Self {
        Self::new()
    }
}

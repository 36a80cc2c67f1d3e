use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

/// Transport-level key for a live socket. Display names are not unique
/// process-wide, so connections are addressed by id and identities are
/// only resolved inside a room group.
pub type ConnectionId = Uuid;

/// The connection multiplexer the room manager and signaling relay
/// address messages through: per-room groups, unicast by identity within
/// a group, and process-wide broadcast.
#[async_trait]
pub trait ConnectionManager: Send + Sync {
    async fn add_connection(&self, id: ConnectionId, sender: mpsc::UnboundedSender<String>);

    async fn remove_connection(&self, id: &ConnectionId);

    /// Record the display name this connection answers to
    async fn set_identity(&self, id: &ConnectionId, identity: &str);

    async fn join_group(&self, room: &str, id: ConnectionId);

    async fn leave_group(&self, room: &str, id: &ConnectionId);

    /// Forcibly detach every connection from a group (room deletion)
    async fn clear_group(&self, room: &str);

    async fn send_to_connection(&self, id: &ConnectionId, message: &str);

    /// Deliver to the connection in `room` whose identity matches, if any.
    /// Returns false when no such connection is in the group.
    async fn send_to_identity_in_group(&self, room: &str, identity: &str, message: &str) -> bool;

    async fn send_to_group(&self, room: &str, message: &str);

    async fn send_to_group_except(&self, room: &str, except: &ConnectionId, message: &str);

    /// Process-wide broadcast (room-list updates)
    async fn broadcast(&self, message: &str);
}

struct ConnectionEntry {
    identity: Option<String>,
    sender: mpsc::UnboundedSender<String>,
}

#[derive(Default)]
struct ManagerState {
    connections: HashMap<ConnectionId, ConnectionEntry>,
    // room name -> connection ids in that room's group
    groups: HashMap<String, HashSet<ConnectionId>>,
}

/// In-memory multiplexer over per-connection outbound channels
pub struct InMemoryConnectionManager {
    state: Arc<RwLock<ManagerState>>,
}

impl Default for InMemoryConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryConnectionManager {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(ManagerState::default())),
        }
    }
}

#[async_trait]
impl ConnectionManager for InMemoryConnectionManager {
    async fn add_connection(&self, id: ConnectionId, sender: mpsc::UnboundedSender<String>) {
        let mut state = self.state.write().await;
        state.connections.insert(
            id,
            ConnectionEntry {
                identity: None,
                sender,
            },
        );
    }

    async fn remove_connection(&self, id: &ConnectionId) {
        let mut state = self.state.write().await;
        state.connections.remove(id);
        for group in state.groups.values_mut() {
            group.remove(id);
        }
        state.groups.retain(|_, group| !group.is_empty());
    }

    async fn set_identity(&self, id: &ConnectionId, identity: &str) {
        let mut state = self.state.write().await;
        if let Some(entry) = state.connections.get_mut(id) {
            entry.identity = Some(identity.to_string());
        }
    }

    async fn join_group(&self, room: &str, id: ConnectionId) {
        let mut state = self.state.write().await;
        state.groups.entry(room.to_string()).or_default().insert(id);
    }

    async fn leave_group(&self, room: &str, id: &ConnectionId) {
        let mut state = self.state.write().await;
        let emptied = match state.groups.get_mut(room) {
            Some(group) => {
                group.remove(id);
                group.is_empty()
            }
            None => false,
        };
        if emptied {
            state.groups.remove(room);
        }
    }

    async fn clear_group(&self, room: &str) {
        let mut state = self.state.write().await;
        state.groups.remove(room);
    }

    async fn send_to_connection(&self, id: &ConnectionId, message: &str) {
        let state = self.state.read().await;
        if let Some(entry) = state.connections.get(id) {
            let _ = entry.sender.send(message.to_string());
        }
    }

    async fn send_to_identity_in_group(&self, room: &str, identity: &str, message: &str) -> bool {
        let state = self.state.read().await;
        let Some(group) = state.groups.get(room) else {
            return false;
        };
        for id in group {
            if let Some(entry) = state.connections.get(id) {
                if entry.identity.as_deref() == Some(identity) {
                    let _ = entry.sender.send(message.to_string());
                    return true;
                }
            }
        }
        false
    }

    async fn send_to_group(&self, room: &str, message: &str) {
        let state = self.state.read().await;
        if let Some(group) = state.groups.get(room) {
            for id in group {
                if let Some(entry) = state.connections.get(id) {
                    let _ = entry.sender.send(message.to_string());
                }
            }
        }
    }

    async fn send_to_group_except(&self, room: &str, except: &ConnectionId, message: &str) {
        let state = self.state.read().await;
        if let Some(group) = state.groups.get(room) {
            for id in group {
                if id == except {
                    continue;
                }
                if let Some(entry) = state.connections.get(id) {
                    let _ = entry.sender.send(message.to_string());
                }
            }
        }
    }

    async fn broadcast(&self, message: &str) {
        let state = self.state.read().await;
        for entry in state.connections.values() {
            let _ = entry.sender.send(message.to_string());
        }
    }
}

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

use huddle::websockets::{ConnectionId, ConnectionManager, ServerEvent};

// ============================================================================
// Mock Infrastructure
// ============================================================================

#[derive(Default)]
struct MockState {
    identities: HashMap<ConnectionId, String>,
    groups: HashMap<String, HashSet<ConnectionId>>,
    connected: HashSet<ConnectionId>,
    sent: HashMap<ConnectionId, Vec<String>>,
}

/// Transport double that records every frame instead of writing to a
/// socket, while reproducing the real group/identity addressing rules.
#[derive(Clone, Default)]
pub struct MockConnectionManager {
    state: Arc<RwLock<MockState>>,
}

impl MockConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn frames_for(&self, id: &ConnectionId) -> Vec<String> {
        self.state
            .read()
            .await
            .sent
            .get(id)
            .cloned()
            .unwrap_or_default()
    }

    /// Recorded frames decoded back into server events
    pub async fn events_for(&self, id: &ConnectionId) -> Vec<ServerEvent> {
        self.frames_for(id)
            .await
            .iter()
            .map(|frame| serde_json::from_str(frame).expect("recorded frame must decode"))
            .collect()
    }

    pub async fn clear_frames(&self) {
        self.state.write().await.sent.clear();
    }

    pub async fn is_in_group(&self, room: &str, id: &ConnectionId) -> bool {
        self.state
            .read()
            .await
            .groups
            .get(room)
            .is_some_and(|group| group.contains(id))
    }
}

#[async_trait]
impl ConnectionManager for MockConnectionManager {
    async fn add_connection(&self, id: ConnectionId, _sender: mpsc::UnboundedSender<String>) {
        self.state.write().await.connected.insert(id);
    }

    async fn remove_connection(&self, id: &ConnectionId) {
        let mut state = self.state.write().await;
        state.connected.remove(id);
        state.identities.remove(id);
        for group in state.groups.values_mut() {
            group.remove(id);
        }
    }

    async fn set_identity(&self, id: &ConnectionId, identity: &str) {
        self.state
            .write()
            .await
            .identities
            .insert(*id, identity.to_string());
    }

    async fn join_group(&self, room: &str, id: ConnectionId) {
        self.state
            .write()
            .await
            .groups
            .entry(room.to_string())
            .or_default()
            .insert(id);
    }

    async fn leave_group(&self, room: &str, id: &ConnectionId) {
        if let Some(group) = self.state.write().await.groups.get_mut(room) {
            group.remove(id);
        }
    }

    async fn clear_group(&self, room: &str) {
        self.state.write().await.groups.remove(room);
    }

    async fn send_to_connection(&self, id: &ConnectionId, message: &str) {
        let mut state = self.state.write().await;
        state.sent.entry(*id).or_default().push(message.to_string());
    }

    async fn send_to_identity_in_group(&self, room: &str, identity: &str, message: &str) -> bool {
        let mut state = self.state.write().await;
        let Some(group) = state.groups.get(room).cloned() else {
            return false;
        };
        for id in group {
            if state.identities.get(&id).map(String::as_str) == Some(identity) {
                state.sent.entry(id).or_default().push(message.to_string());
                return true;
            }
        }
        false
    }

    async fn send_to_group(&self, room: &str, message: &str) {
        let mut state = self.state.write().await;
        let Some(group) = state.groups.get(room).cloned() else {
            return;
        };
        for id in group {
            state.sent.entry(id).or_default().push(message.to_string());
        }
    }

    async fn send_to_group_except(&self, room: &str, except: &ConnectionId, message: &str) {
        let mut state = self.state.write().await;
        let Some(group) = state.groups.get(room).cloned() else {
            return;
        };
        for id in group {
            if id != *except {
                state.sent.entry(id).or_default().push(message.to_string());
            }
        }
    }

    async fn broadcast(&self, message: &str) {
        let mut state = self.state.write().await;
        let connected: Vec<ConnectionId> = state.connected.iter().copied().collect();
        for id in connected {
            state.sent.entry(id).or_default().push(message.to_string());
        }
    }
}

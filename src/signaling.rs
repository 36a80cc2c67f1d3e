use std::sync::Arc;
use tracing::debug;

use crate::room::registry::RoomRegistry;
use crate::websockets::connection_manager::{ConnectionId, ConnectionManager};
use crate::websockets::messages::ServerEvent;
use crate::websockets::session::ConnectionSession;

/// Stateless router for WebRTC negotiation traffic.
///
/// Targets are resolved by display name inside the sender's current room
/// only. A miss (peer just left, name never existed here) is an expected
/// race and is dropped without telling the sender.
pub struct SignalingRelay {
    registry: Arc<dyn RoomRegistry>,
    connections: Arc<dyn ConnectionManager>,
}

impl SignalingRelay {
    pub fn new(registry: Arc<dyn RoomRegistry>, connections: Arc<dyn ConnectionManager>) -> Self {
        Self {
            registry,
            connections,
        }
    }

    /// Announce the sender to everyone already in its room so existing
    /// participants open the negotiation (existing peer offers, newcomer
    /// answers).
    pub async fn announce_join(&self, conn: &ConnectionId, session: &ConnectionSession) {
        let (Some(identity), Some(room)) = (&session.identity, &session.current_room) else {
            return;
        };

        self.connections
            .send_to_group_except(
                room,
                conn,
                &ServerEvent::RtcPeerJoined {
                    username: identity.clone(),
                }
                .encode(),
            )
            .await;
    }

    pub async fn relay_offer(&self, session: &ConnectionSession, to: &str, sdp: String) {
        if sdp.is_empty() {
            return;
        }
        self.relay(session, to, |from| ServerEvent::RtcOffer { from, sdp })
            .await;
    }

    pub async fn relay_answer(&self, session: &ConnectionSession, to: &str, sdp: String) {
        if sdp.is_empty() {
            return;
        }
        self.relay(session, to, |from| ServerEvent::RtcAnswer { from, sdp })
            .await;
    }

    pub async fn relay_candidate(
        &self,
        session: &ConnectionSession,
        to: &str,
        candidate: serde_json::Value,
    ) {
        if candidate.is_null() {
            return;
        }
        self.relay(session, to, |from| ServerEvent::RtcCandidate { from, candidate })
            .await;
    }

    /// Shared addressing contract: sender must be identified and in a
    /// room, target must be named, and the target must be a member of the
    /// sender's room per the registry before the group lookup runs.
    async fn relay<F>(&self, session: &ConnectionSession, to: &str, event: F)
    where
        F: FnOnce(String) -> ServerEvent,
    {
        let (Some(from), Some(room)) = (&session.identity, &session.current_room) else {
            return;
        };
        if to.is_empty() {
            return;
        }

        let is_member = self
            .registry
            .members(room)
            .await
            .is_some_and(|members| members.iter().any(|m| m == to));
        if !is_member {
            debug!(room = %room, target = %to, "Signal target not in sender's room, dropping");
            return;
        }

        let delivered = self
            .connections
            .send_to_identity_in_group(room, to, &event(from.clone()).encode())
            .await;
        if !delivered {
            // Membership said yes but no live socket answered to the name;
            // the peer is mid-disconnect. Normal race, not a fault.
            debug!(room = %room, target = %to, "Signal target had no live connection");
        }
    }
}

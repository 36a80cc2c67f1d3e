use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument};

use super::registry::{
    CreateOutcome, DeleteOutcome, Departure, JoinOutcome, LeaveOutcome, RoomRegistry,
};
use crate::websockets::connection_manager::{ConnectionId, ConnectionManager};
use crate::websockets::messages::ServerEvent;
use crate::websockets::session::ConnectionSession;

/// Chat messages are cut at this many characters before broadcast
pub const MAX_MESSAGE_CHARS: usize = 500;

/// Failures reported to the invoking connection only, never broadcast.
/// Silent conditions (empty room name, absent relay target, chat while
/// not in a room) have no variant here on purpose.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RoomError {
    #[error("not identified")]
    Unauthenticated,
    #[error("room already exists")]
    RoomExists,
    #[error("room not found")]
    RoomNotFound,
    #[error("only the room creator can delete it")]
    NotCreator,
}

/// Serializes every mutation of room state and produces the notification
/// set for each transition. Registry transitions are atomic; this layer
/// decides which connections hear about them.
pub struct RoomManager {
    registry: Arc<dyn RoomRegistry>,
    connections: Arc<dyn ConnectionManager>,
}

impl RoomManager {
    pub fn new(registry: Arc<dyn RoomRegistry>, connections: Arc<dyn ConnectionManager>) -> Self {
        Self {
            registry,
            connections,
        }
    }

    fn identity(session: &ConnectionSession) -> Result<&str, RoomError> {
        session.identity.as_deref().ok_or(RoomError::Unauthenticated)
    }

    /// Push the current room summaries to every connection
    async fn broadcast_room_list(&self) {
        let summaries = self.registry.summaries().await;
        self.connections
            .broadcast(&ServerEvent::RoomList(summaries).encode())
            .await;
    }

    /// Fan out the notifications for a membership removal: the vacating
    /// connection is detached from the group first so it hears none of
    /// them, then the room (and everyone, for the list) is told.
    async fn notify_departure(
        &self,
        conn: &ConnectionId,
        identity: &str,
        departure: &Departure,
    ) {
        self.connections.leave_group(&departure.room, conn).await;
        self.connections
            .send_to_group(
                &departure.room,
                &ServerEvent::UserLeft {
                    username: identity.to_string(),
                }
                .encode(),
            )
            .await;
        self.broadcast_room_list().await;
        self.connections
            .send_to_group(
                &departure.room,
                &ServerEvent::RoomMembers {
                    users: departure.members.clone(),
                }
                .encode(),
            )
            .await;

        if departure.expired {
            // Auto-expire: unconditional deletion notification, then the
            // refreshed list. The group is empty at this point, so the
            // deletion event has no audience; clearing keeps the transport
            // in step with the registry regardless.
            self.connections
                .send_to_group(
                    &departure.room,
                    &ServerEvent::RoomDeleted {
                        room_name: departure.room.clone(),
                    }
                    .encode(),
                )
                .await;
            self.connections.clear_group(&departure.room).await;
            self.broadcast_room_list().await;
            info!(room = %departure.room, "Empty room auto-expired");
        }
    }

    /// Reply to an explicit room-list request; no identity required
    pub async fn send_room_list(&self, conn: &ConnectionId) {
        let summaries = self.registry.summaries().await;
        self.connections
            .send_to_connection(conn, &ServerEvent::RoomList(summaries).encode())
            .await;
    }

    #[instrument(skip(self, session))]
    pub async fn create_room(
        &self,
        conn: &ConnectionId,
        session: &ConnectionSession,
        name: &str,
    ) -> Result<(), RoomError> {
        let identity = Self::identity(session)?;

        let name = name.trim();
        if name.is_empty() {
            // Empty names are dropped without an error surface
            debug!(identity = %identity, "Ignoring create with empty room name");
            return Ok(());
        }

        match self.registry.create(name, identity).await {
            CreateOutcome::AlreadyExists => Err(RoomError::RoomExists),
            CreateOutcome::Created => {
                self.connections
                    .send_to_connection(
                        conn,
                        &ServerEvent::RoomCreated {
                            room_name: name.to_string(),
                        }
                        .encode(),
                    )
                    .await;
                self.broadcast_room_list().await;
                Ok(())
            }
        }
    }

    #[instrument(skip(self, session))]
    pub async fn join_room(
        &self,
        conn: &ConnectionId,
        session: &mut ConnectionSession,
        name: &str,
    ) -> Result<(), RoomError> {
        let identity = Self::identity(session)?.to_string();

        // The implicit leave applies only when moving between rooms;
        // re-joining the current room keeps its membership entry
        let previous = session
            .current_room
            .as_deref()
            .filter(|room| *room != name)
            .map(str::to_string);

        match self
            .registry
            .join(name, &identity, previous.as_deref())
            .await
        {
            JoinOutcome::RoomNotFound => Err(RoomError::RoomNotFound),
            JoinOutcome::Joined { departed, members } => {
                if let Some(departure) = departed {
                    self.notify_departure(conn, &identity, &departure).await;
                }

                self.connections.join_group(name, *conn).await;
                session.current_room = Some(name.to_string());

                // A re-join of a room one is already in still notifies;
                // clients tolerate the duplicate
                self.connections
                    .send_to_group(
                        name,
                        &ServerEvent::UserJoined {
                            username: identity.clone(),
                        }
                        .encode(),
                    )
                    .await;
                self.broadcast_room_list().await;
                self.connections
                    .send_to_group(name, &ServerEvent::RoomMembers { users: members }.encode())
                    .await;
                Ok(())
            }
        }
    }

    #[instrument(skip(self, session))]
    pub async fn leave_room(
        &self,
        conn: &ConnectionId,
        session: &mut ConnectionSession,
        name: &str,
    ) -> Result<(), RoomError> {
        let identity = Self::identity(session)?.to_string();

        match self.registry.remove_member(name, &identity).await {
            // Leaving a missing room or one you are not in is not an error
            LeaveOutcome::RoomNotFound | LeaveOutcome::NotAMember => Ok(()),
            LeaveOutcome::Left(departure) => {
                if session.current_room.as_deref() == Some(name) {
                    session.current_room = None;
                }
                self.notify_departure(conn, &identity, &departure).await;
                Ok(())
            }
        }
    }

    #[instrument(skip(self, session))]
    pub async fn delete_room(
        &self,
        conn: &ConnectionId,
        session: &mut ConnectionSession,
        name: &str,
    ) -> Result<(), RoomError> {
        let identity = Self::identity(session)?;

        match self.registry.delete(name, identity).await {
            DeleteOutcome::RoomNotFound => Ok(()),
            DeleteOutcome::NotCreator => Err(RoomError::NotCreator),
            DeleteOutcome::Deleted => {
                self.connections
                    .send_to_group(
                        name,
                        &ServerEvent::RoomDeleted {
                            room_name: name.to_string(),
                        }
                        .encode(),
                    )
                    .await;
                self.connections.clear_group(name).await;
                if session.current_room.as_deref() == Some(name) {
                    session.current_room = None;
                }
                self.broadcast_room_list().await;
                Ok(())
            }
        }
    }

    /// Teardown for a closed connection: the same membership delta as an
    /// explicit leave of the current room, with no acknowledgment sent
    /// to the (now gone) socket.
    #[instrument(skip(self, session))]
    pub async fn disconnect(&self, conn: &ConnectionId, session: &ConnectionSession) {
        let (Some(identity), Some(room)) = (&session.identity, &session.current_room) else {
            return;
        };

        if let LeaveOutcome::Left(departure) =
            self.registry.remove_member(room, identity).await
        {
            info!(identity = %identity, room = %room, "Disconnected while in room");
            self.notify_departure(conn, identity, &departure).await;
        }
    }

    /// Broadcast a chat line to the sender's current room. Drops silently
    /// when the sender is not identified or not in a room, and when the
    /// truncated text is empty.
    pub async fn send_chat(&self, session: &ConnectionSession, text: &str) {
        let (Some(identity), Some(room)) = (&session.identity, &session.current_room) else {
            debug!("Dropping chat message from connection outside any room");
            return;
        };

        let message = truncate_message(text);
        if message.is_empty() {
            return;
        }

        self.connections
            .send_to_group(
                room,
                &ServerEvent::NewMessage {
                    username: identity.clone(),
                    message,
                    timestamp: Utc::now().timestamp_millis(),
                }
                .encode(),
            )
            .await;
    }
}

/// Cut a chat message at the 500-character cap without splitting a
/// code point
fn truncate_message(text: &str) -> String {
    text.chars().take(MAX_MESSAGE_CHARS).collect()
}

use async_trait::async_trait;
use axum::{
    extract::{State, WebSocketUpgrade},
    response::Response,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::room::manager::RoomError;
use crate::shared::AppState;

use super::connection_manager::ConnectionId;
use super::messages::{ClientEvent, ServerEvent};
use super::session::ConnectionSession;
use super::socket::{Connection, MessageHandler};

/// Routes parsed client events to the room manager and signaling relay.
/// Operation failures go back to the invoking connection only, as an
/// `error` event; malformed frames are logged and ignored.
pub struct EventDispatcher {
    state: AppState,
}

impl EventDispatcher {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    async fn dispatch(
        &self,
        conn: &ConnectionId,
        session: &mut ConnectionSession,
        event: ClientEvent,
    ) -> Result<(), RoomError> {
        match event {
            ClientEvent::Identify(name) => {
                let name = name.trim();
                if !name.is_empty() {
                    // Accepted even after a first identify; membership
                    // recorded under the old name is not rewritten
                    session.identity = Some(name.to_string());
                    self.state.connections.set_identity(conn, name).await;
                    info!(conn = %conn, identity = %name, "Connection identified");
                }
                Ok(())
            }
            ClientEvent::ListRooms => {
                self.state.rooms.send_room_list(conn).await;
                Ok(())
            }
            ClientEvent::CreateRoom(name) => {
                self.state.rooms.create_room(conn, session, &name).await
            }
            ClientEvent::JoinRoom(name) => self.state.rooms.join_room(conn, session, &name).await,
            ClientEvent::LeaveRoom(name) => {
                self.state.rooms.leave_room(conn, session, &name).await
            }
            ClientEvent::DeleteRoom(name) => {
                self.state.rooms.delete_room(conn, session, &name).await
            }
            ClientEvent::SendMessage { message } => {
                self.state.rooms.send_chat(session, &message).await;
                Ok(())
            }
            ClientEvent::RtcJoin => {
                self.state.relay.announce_join(conn, session).await;
                Ok(())
            }
            ClientEvent::RtcOffer { to, sdp } => {
                self.state.relay.relay_offer(session, &to, sdp).await;
                Ok(())
            }
            ClientEvent::RtcAnswer { to, sdp } => {
                self.state.relay.relay_answer(session, &to, sdp).await;
                Ok(())
            }
            ClientEvent::RtcCandidate { to, candidate } => {
                self.state.relay.relay_candidate(session, &to, candidate).await;
                Ok(())
            }
        }
    }
}

#[async_trait]
impl MessageHandler for EventDispatcher {
    async fn handle_message(
        &self,
        conn: &ConnectionId,
        session: &mut ConnectionSession,
        message: String,
    ) {
        let event = match serde_json::from_str::<ClientEvent>(&message) {
            Ok(event) => event,
            Err(e) => {
                warn!(conn = %conn, error = %e, "Failed to parse client event");
                return;
            }
        };

        if let Err(err) = self.dispatch(conn, session, event).await {
            self.state
                .connections
                .send_to_connection(
                    conn,
                    &ServerEvent::Error {
                        message: err.to_string(),
                    }
                    .encode(),
                )
                .await;
        }
    }
}

/// WebSocket endpoint: GET /ws. Authentication happened at the HTTP layer
/// before the client got here; the coordinator trusts the display name
/// supplied later via `identify`.
pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_websocket_connection(socket, state))
}

/// Handle the upgraded WebSocket connection
async fn handle_websocket_connection(socket: axum::extract::ws::WebSocket, state: AppState) {
    let conn_id = Uuid::new_v4();
    info!(conn = %conn_id, "WebSocket connection established");

    // Outbound channel (app -> client), registered with the multiplexer
    let (outbound_sender, outbound_receiver) = mpsc::unbounded_channel::<String>();
    state
        .connections
        .add_connection(conn_id, outbound_sender)
        .await;

    let message_handler = Arc::new(EventDispatcher::new(state.clone()));
    let connection = Connection::new(
        conn_id,
        Box::new(socket),
        outbound_receiver,
        message_handler,
    );

    // Run the connection until disconnect
    let (session, result) = connection.run().await;
    match result {
        Ok(()) => info!(conn = %conn_id, "WebSocket connection closed cleanly"),
        Err(e) => warn!(conn = %conn_id, error = ?e, "WebSocket connection error"),
    }

    // Unconditional cleanup: the same membership delta as an explicit
    // leave, then drop the transport entry
    state.rooms.disconnect(&conn_id, &session).await;
    state.connections.remove_connection(&conn_id).await;

    info!(conn = %conn_id, "WebSocket connection cleaned up");
}

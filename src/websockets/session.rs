/// Per-connection mutable state, owned by the connection task for the
/// lifetime of the socket and passed by reference into the room manager
/// and signaling relay.
#[derive(Debug, Default, Clone)]
pub struct ConnectionSession {
    /// Display name claimed via `identify`. Later identify calls overwrite
    /// it without touching membership recorded under the old name; the
    /// registry stays the only authority on who is in a room.
    pub identity: Option<String>,
    /// The single room this connection currently occupies
    pub current_room: Option<String>,
}

impl ConnectionSession {
    pub fn new() -> Self {
        Self::default()
    }
}

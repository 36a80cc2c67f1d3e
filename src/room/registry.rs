use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, info, instrument};

use super::models::{Room, RoomSummary};

/// Result of attempting to create a room
#[derive(Debug, Clone, PartialEq)]
pub enum CreateOutcome {
    /// Room was inserted with the invoker as creator and no members
    Created,
    /// The trimmed name is already a key in the registry
    AlreadyExists,
}

/// Membership removal applied to a room the identity vacated
#[derive(Debug, Clone, PartialEq)]
pub struct Departure {
    pub room: String,
    /// Member list after the removal, in join order
    pub members: Vec<String>,
    /// True if the room became empty and was deleted in the same transition
    pub expired: bool,
}

/// Result of attempting to join a room
#[derive(Debug, Clone, PartialEq)]
pub enum JoinOutcome {
    Joined {
        /// Implicit leave of the previously occupied room, if any
        departed: Option<Departure>,
        /// Member list of the joined room after the join, in join order
        members: Vec<String>,
    },
    RoomNotFound,
}

/// Result of attempting to remove a member from a room
#[derive(Debug, Clone, PartialEq)]
pub enum LeaveOutcome {
    Left(Departure),
    NotAMember,
    RoomNotFound,
}

/// Result of attempting to delete a room
#[derive(Debug, Clone, PartialEq)]
pub enum DeleteOutcome {
    Deleted,
    NotCreator,
    RoomNotFound,
}

/// Authoritative store for live rooms.
///
/// Each operation is a single atomic transition: compound read-modify-write
/// sequences (check existence then insert, remove member then expire) never
/// interleave with another connection's operation. No business rules beyond
/// the transitions themselves live here; the RoomManager decides who gets
/// notified of what.
#[async_trait]
pub trait RoomRegistry: Send + Sync {
    /// Insert-if-absent with the invoker as creator
    async fn create(&self, name: &str, creator: &str) -> CreateOutcome;

    /// Add `identity` to `name`, leaving `previous` first if given.
    /// The implicit leave (including auto-expire of the vacated room) and
    /// the join happen in one transition.
    async fn join(&self, name: &str, identity: &str, previous: Option<&str>) -> JoinOutcome;

    /// Remove `identity` from `name`, deleting the room in the same
    /// transition if it becomes empty
    async fn remove_member(&self, name: &str, identity: &str) -> LeaveOutcome;

    /// Remove the room if `requester` is its creator
    async fn delete(&self, name: &str, requester: &str) -> DeleteOutcome;

    /// Member list of a room, in join order
    async fn members(&self, name: &str) -> Option<Vec<String>>;

    /// Summaries of every live room for the room-list broadcast
    async fn summaries(&self) -> Vec<RoomSummary>;
}

/// In-memory registry; the single serialization domain for all room state
pub struct InMemoryRoomRegistry {
    rooms: Mutex<HashMap<String, Room>>,
}

impl Default for InMemoryRoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRoomRegistry {
    pub fn new() -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
        }
    }

    /// Removes `identity` from `room`, deleting the room if it empties.
    /// Caller holds the lock.
    fn depart_locked(
        rooms: &mut HashMap<String, Room>,
        room_name: &str,
        identity: &str,
    ) -> Option<Departure> {
        let room = rooms.get_mut(room_name)?;
        if !room.has_member(identity) {
            return None;
        }
        room.remove_member(identity);
        let members = room.members.clone();
        let expired = members.is_empty();
        if expired {
            rooms.remove(room_name);
        }
        Some(Departure {
            room: room_name.to_string(),
            members,
            expired,
        })
    }
}

#[async_trait]
impl RoomRegistry for InMemoryRoomRegistry {
    #[instrument(skip(self))]
    async fn create(&self, name: &str, creator: &str) -> CreateOutcome {
        let mut rooms = self.rooms.lock().unwrap();
        if rooms.contains_key(name) {
            debug!(room = %name, "Room already exists");
            return CreateOutcome::AlreadyExists;
        }
        rooms.insert(
            name.to_string(),
            Room::new(name.to_string(), creator.to_string()),
        );

        info!(room = %name, creator = %creator, "Room created");
        CreateOutcome::Created
    }

    #[instrument(skip(self))]
    async fn join(&self, name: &str, identity: &str, previous: Option<&str>) -> JoinOutcome {
        let mut rooms = self.rooms.lock().unwrap();

        if !rooms.contains_key(name) {
            debug!(room = %name, "Room not found");
            return JoinOutcome::RoomNotFound;
        }

        // Vacate the previous room inside the same transition so no other
        // connection can observe the identity in two rooms at once. A
        // re-join of the current room must not vacate the join target.
        let departed = previous
            .filter(|prev| *prev != name)
            .and_then(|prev| Self::depart_locked(&mut rooms, prev, identity));

        // Checked above, and the departure cannot have touched `name`
        let room = rooms.get_mut(name).expect("join target vanished");
        room.add_member(identity.to_string());

        info!(
            room = %name,
            identity = %identity,
            member_count = room.member_count(),
            "Member joined room"
        );

        JoinOutcome::Joined {
            departed,
            members: room.members.clone(),
        }
    }

    #[instrument(skip(self))]
    async fn remove_member(&self, name: &str, identity: &str) -> LeaveOutcome {
        let mut rooms = self.rooms.lock().unwrap();

        if !rooms.contains_key(name) {
            debug!(room = %name, "Room not found");
            return LeaveOutcome::RoomNotFound;
        }

        match Self::depart_locked(&mut rooms, name, identity) {
            Some(departure) => {
                info!(
                    room = %name,
                    identity = %identity,
                    expired = departure.expired,
                    "Member left room"
                );
                LeaveOutcome::Left(departure)
            }
            None => {
                debug!(room = %name, identity = %identity, "Identity not a member");
                LeaveOutcome::NotAMember
            }
        }
    }

    #[instrument(skip(self))]
    async fn delete(&self, name: &str, requester: &str) -> DeleteOutcome {
        let mut rooms = self.rooms.lock().unwrap();

        let room = match rooms.get(name) {
            Some(room) => room,
            None => {
                debug!(room = %name, "Room not found");
                return DeleteOutcome::RoomNotFound;
            }
        };

        if room.creator != requester {
            debug!(room = %name, requester = %requester, "Delete refused, not the creator");
            return DeleteOutcome::NotCreator;
        }

        rooms.remove(name);
        info!(room = %name, requester = %requester, "Room deleted by creator");
        DeleteOutcome::Deleted
    }

    async fn members(&self, name: &str) -> Option<Vec<String>> {
        let rooms = self.rooms.lock().unwrap();
        rooms.get(name).map(|room| room.members.clone())
    }

    async fn summaries(&self) -> Vec<RoomSummary> {
        let rooms = self.rooms.lock().unwrap();
        rooms.values().map(Room::summary).collect()
    }
}

use serde::{Deserialize, Serialize};

/// In-memory state for a single live room
#[derive(Debug, Clone)]
pub struct Room {
    pub name: String,         // Unique key, trimmed, case-sensitive
    pub creator: String,      // Identity that created the room; immutable
    pub members: Vec<String>, // Insertion-ordered, duplicate-free
}

impl Room {
    /// Creates a new room with no members (creation does not imply membership)
    pub fn new(name: String, creator: String) -> Self {
        Self {
            name,
            creator,
            members: vec![],
        }
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Check if an identity is a member of this room
    pub fn has_member(&self, identity: &str) -> bool {
        self.members.iter().any(|m| m == identity)
    }

    /// Add a member, preserving insertion order. Re-adding an existing
    /// member is a no-op on the list.
    pub fn add_member(&mut self, identity: String) {
        if !self.has_member(&identity) {
            self.members.push(identity);
        }
    }

    pub fn remove_member(&mut self, identity: &str) {
        self.members.retain(|m| m != identity);
    }

    pub fn summary(&self) -> RoomSummary {
        RoomSummary {
            name: self.name.clone(),
            creator: self.creator.clone(),
            member_count: self.member_count(),
        }
    }
}

/// Room-list entry pushed to every connection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub name: String,
    pub creator: String,
    pub member_count: usize,
}

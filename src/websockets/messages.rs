use serde::{Deserialize, Serialize};

use crate::room::models::RoomSummary;

/// Commands a client may send over the real-time channel.
///
/// Wire shape is a `{"type": ..., "payload": ...}` envelope with kebab-case
/// event names; the simple room commands carry the room name as a bare
/// string payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// Claim a display name; the coordinator trusts it as-is
    Identify(String),
    ListRooms,
    CreateRoom(String),
    JoinRoom(String),
    LeaveRoom(String),
    DeleteRoom(String),
    SendMessage { message: String },
    /// Announce readiness to negotiate; existing peers send the offers
    RtcJoin,
    RtcOffer { to: String, sdp: String },
    RtcAnswer { to: String, sdp: String },
    RtcCandidate { to: String, candidate: serde_json::Value },
}

/// Events the coordinator pushes to clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    RoomList(Vec<RoomSummary>),
    RoomCreated { room_name: String },
    UserJoined { username: String },
    UserLeft { username: String },
    RoomDeleted { room_name: String },
    /// Member list in join order; drives the client's video-tile layout
    RoomMembers { users: Vec<String> },
    NewMessage { username: String, message: String, timestamp: i64 },
    RtcPeerJoined { username: String },
    RtcOffer { from: String, sdp: String },
    RtcAnswer { from: String, sdp: String },
    RtcCandidate { from: String, candidate: serde_json::Value },
    Error { message: String },
}

impl ServerEvent {
    /// Serialize for the wire. These enums contain no non-string map keys
    /// or other unserializable shapes, so this cannot fail.
    pub fn encode(&self) -> String {
        serde_json::to_string(self).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn client_events_decode_from_envelope() {
        let identify: ClientEvent =
            serde_json::from_value(json!({"type": "identify", "payload": "alice"})).unwrap();
        assert_eq!(identify, ClientEvent::Identify("alice".to_string()));

        let list: ClientEvent = serde_json::from_value(json!({"type": "list-rooms"})).unwrap();
        assert_eq!(list, ClientEvent::ListRooms);

        let join: ClientEvent =
            serde_json::from_value(json!({"type": "join-room", "payload": "lobby"})).unwrap();
        assert_eq!(join, ClientEvent::JoinRoom("lobby".to_string()));

        let chat: ClientEvent = serde_json::from_value(
            json!({"type": "send-message", "payload": {"message": "hi"}}),
        )
        .unwrap();
        assert_eq!(
            chat,
            ClientEvent::SendMessage {
                message: "hi".to_string()
            }
        );

        let offer: ClientEvent = serde_json::from_value(
            json!({"type": "rtc-offer", "payload": {"to": "bob", "sdp": "v=0"}}),
        )
        .unwrap();
        assert_eq!(
            offer,
            ClientEvent::RtcOffer {
                to: "bob".to_string(),
                sdp: "v=0".to_string()
            }
        );
    }

    #[test]
    fn server_events_use_camel_case_payload_keys() {
        let encoded = ServerEvent::RoomCreated {
            room_name: "lobby".to_string(),
        }
        .encode();
        let value: serde_json::Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(value["type"], "room-created");
        assert_eq!(value["payload"]["roomName"], "lobby");

        let encoded = ServerEvent::RoomList(vec![RoomSummary {
            name: "lobby".to_string(),
            creator: "alice".to_string(),
            member_count: 2,
        }])
        .encode();
        let value: serde_json::Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(value["payload"][0]["memberCount"], 2);
    }

    #[test]
    fn relayed_events_tag_the_origin() {
        let encoded = ServerEvent::RtcCandidate {
            from: "carol".to_string(),
            candidate: json!({"sdpMid": "0", "candidate": "candidate:1"}),
        }
        .encode();
        let value: serde_json::Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(value["type"], "rtc-candidate");
        assert_eq!(value["payload"]["from"], "carol");
        assert_eq!(value["payload"]["candidate"]["sdpMid"], "0");
    }

    #[test]
    fn server_events_round_trip() {
        let event = ServerEvent::NewMessage {
            username: "alice".to_string(),
            message: "hello".to_string(),
            timestamp: 1_700_000_000_000,
        };
        let back: ServerEvent = serde_json::from_str(&event.encode()).unwrap();
        assert_eq!(back, event);
    }
}

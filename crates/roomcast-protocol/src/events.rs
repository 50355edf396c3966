//! Named events exchanged between Roomcast clients and servers.
//!
//! Every frame on the wire is a JSON object `{"event": <name>, "data": <payload>}`.
//! Inbound and outbound events are modeled as separate enums because the two
//! directions share only a few payload shapes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A room identifier.
pub type RoomId = String;

/// The kind of a room in the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomKind {
    /// The shared root room everyone can see.
    Public,
    /// A team room, child of the root.
    Team,
    /// A match room, child of a team.
    Match,
}

/// Display metadata for a single room in the directory.
///
/// Rooms form a forest: every non-root room names exactly one parent and
/// parents carry an ordered list of their children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomInfo {
    /// Unique room identifier.
    pub id: RoomId,
    /// Human-readable display name.
    pub name: String,
    /// Room kind.
    pub kind: RoomKind,
    /// Display icon.
    pub icon: String,
    /// Parent room, absent for the root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<RoomId>,
    /// Ordered child rooms.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RoomId>,
    /// Whether the room is rendered expanded in tree views.
    #[serde(default)]
    pub expanded: bool,
}

/// Payload of the `exit` relay, also reused for `enter`-style notices that
/// carry a user name plus arbitrary client fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExitNotice {
    /// Display name of the departing user.
    #[serde(default)]
    pub user_name: String,
    /// Client fields relayed untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Inbound chat message, before the server stamps room and time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishRequest {
    /// Display name of the sender.
    #[serde(default)]
    pub user_name: String,
    /// Message body.
    #[serde(default)]
    pub content: String,
    /// Client fields relayed untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Outbound chat message, stamped with its room and server timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomMessage {
    /// Display name of the sender.
    pub user_name: String,
    /// Message body.
    pub content: String,
    /// Room the message was published to.
    pub room_id: RoomId,
    /// Server receive time in milliseconds since the Unix epoch.
    pub timestamp: u64,
    /// Client fields relayed untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Request to join (or migrate to) a room.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoomRequest {
    /// Target room. Absent means the request is dropped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<RoomId>,
    /// Display name of the joining user.
    #[serde(default)]
    pub user_name: String,
}

/// Request to leave a room.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRoomRequest {
    /// Room to leave. Absent means the request is dropped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<RoomId>,
    /// Display name of the leaving user.
    #[serde(default)]
    pub user_name: String,
}

/// Ephemeral strategy-state update, relayed verbatim to the named room.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyUpdate {
    /// Target room. Absent means the update is dropped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<RoomId>,
    /// Opaque strategy payload, relayed only when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<Value>,
    /// Client fields relayed untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Advisory message-deletion notice, relayed verbatim to the named room.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteMessage {
    /// Target room. Absent means the notice is dropped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<RoomId>,
    /// Identifier of the message to delete client-side.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
}

/// Request to create a room, or fetch the directory when the name is empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequest {
    /// Requested display name; an empty name degrades into a directory read.
    #[serde(default)]
    pub name: String,
}

/// Notice that a user joined or left a room, sent to the other members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomNotice {
    /// Display name of the user.
    pub user_name: String,
    /// Room the notice concerns.
    pub room_id: RoomId,
    /// Human-readable notice text.
    pub message: String,
}

/// Join confirmation sent to the joining connection only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinConfirm {
    /// Room that was joined.
    pub room_id: RoomId,
    /// Human-readable confirmation text.
    pub message: String,
    /// Member count of the room after the join.
    pub member_count: usize,
}

/// Events a client sends to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Announce arrival; relayed to everyone else.
    Enter(Value),
    /// Announce departure; leaves the current room, then relayed to everyone else.
    Exit(ExitNotice),
    /// Publish a chat message into the sender's current room.
    Publish(PublishRequest),
    /// Join a room, migrating out of the previous one if needed.
    JoinRoom(JoinRoomRequest),
    /// Leave a room.
    LeaveRoom(LeaveRoomRequest),
    /// Relay an ephemeral strategy update to a room.
    StrategyUpdate(StrategyUpdate),
    /// Relay an advisory message deletion to a room.
    DeleteMessage(DeleteMessage),
    /// Create a room, or fetch the directory when the name is empty.
    CreateRoom(CreateRoomRequest),
    /// Request a directory snapshot broadcast.
    ListRooms,
}

/// Events the server sends to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    /// Relayed arrival announcement.
    Enter(Value),
    /// Relayed departure announcement.
    Exit(ExitNotice),
    /// A chat message stamped with room and timestamp.
    PublishEvent(RoomMessage),
    /// A user joined the recipient's room.
    UserJoinedRoom(RoomNotice),
    /// A user left the recipient's room.
    UserLeftRoom(RoomNotice),
    /// Confirmation of the recipient's own join.
    JoinedRoom(JoinConfirm),
    /// Relayed strategy update.
    StrategyUpdate(StrategyUpdate),
    /// Relayed message deletion.
    DeleteMessage(DeleteMessage),
    /// Full directory snapshot after a room was created.
    OnNewRoom(Vec<RoomInfo>),
    /// Full directory snapshot on request.
    FetchServerRooms(Vec<RoomInfo>),
}

impl ServerEvent {
    /// Get the wire name of this event.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::Enter(_) => "enter",
            ServerEvent::Exit(_) => "exit",
            ServerEvent::PublishEvent(_) => "publishEvent",
            ServerEvent::UserJoinedRoom(_) => "userJoinedRoom",
            ServerEvent::UserLeftRoom(_) => "userLeftRoom",
            ServerEvent::JoinedRoom(_) => "joinedRoom",
            ServerEvent::StrategyUpdate(_) => "strategyUpdate",
            ServerEvent::DeleteMessage(_) => "deleteMessage",
            ServerEvent::OnNewRoom(_) => "onNewRoom",
            ServerEvent::FetchServerRooms(_) => "fetchServerRooms",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_event_names() {
        let event: ClientEvent =
            serde_json::from_value(json!({"event": "joinRoom", "data": {"roomId": "team-a", "userName": "Alice"}}))
                .unwrap();
        assert_eq!(
            event,
            ClientEvent::JoinRoom(JoinRoomRequest {
                room_id: Some("team-a".to_string()),
                user_name: "Alice".to_string(),
            })
        );

        let event: ClientEvent =
            serde_json::from_value(json!({"event": "listRooms"})).unwrap();
        assert_eq!(event, ClientEvent::ListRooms);
    }

    #[test]
    fn test_missing_fields_degrade() {
        // Required-ish fields default instead of failing deserialization.
        let event: ClientEvent =
            serde_json::from_value(json!({"event": "joinRoom", "data": {}})).unwrap();
        assert_eq!(event, ClientEvent::JoinRoom(JoinRoomRequest::default()));

        let event: ClientEvent =
            serde_json::from_value(json!({"event": "publish", "data": {"content": "hi"}})).unwrap();
        match event {
            ClientEvent::Publish(req) => {
                assert_eq!(req.content, "hi");
                assert_eq!(req.user_name, "");
            }
            other => panic!("Expected Publish, got {other:?}"),
        }
    }

    #[test]
    fn test_extra_fields_preserved() {
        let event: ClientEvent = serde_json::from_value(json!({
            "event": "exit",
            "data": {"userName": "Alice", "mood": "tired"}
        }))
        .unwrap();

        match event {
            ClientEvent::Exit(notice) => {
                assert_eq!(notice.user_name, "Alice");
                assert_eq!(notice.extra.get("mood"), Some(&json!("tired")));
            }
            other => panic!("Expected Exit, got {other:?}"),
        }
    }

    #[test]
    fn test_strategy_update_relays_verbatim() {
        // An update without a strategy field must not grow one on the way out.
        let event: ClientEvent = serde_json::from_value(json!({
            "event": "strategyUpdate",
            "data": {"roomId": "team-a", "phase": "setup"}
        }))
        .unwrap();

        let ClientEvent::StrategyUpdate(update) = event else {
            panic!("Expected StrategyUpdate");
        };
        assert_eq!(update.strategy, None);

        let out = serde_json::to_value(ServerEvent::StrategyUpdate(update)).unwrap();
        assert!(out["data"].get("strategy").is_none());
        assert_eq!(out["data"]["phase"], "setup");
    }

    #[test]
    fn test_server_event_wire_names() {
        let event = ServerEvent::JoinedRoom(JoinConfirm {
            room_id: "team-a".to_string(),
            message: "joined team-a".to_string(),
            member_count: 2,
        });
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "joinedRoom");
        assert_eq!(value["data"]["memberCount"], 2);
        assert_eq!(event.name(), "joinedRoom");
    }

    #[test]
    fn test_room_info_serialization() {
        let info = RoomInfo {
            id: "lobby".to_string(),
            name: "Lobby".to_string(),
            kind: RoomKind::Public,
            icon: "🏠".to_string(),
            parent: None,
            children: vec!["team-a".to_string()],
            expanded: true,
        };

        let value = serde_json::to_value(&info).unwrap();
        assert_eq!(value["kind"], "public");
        assert!(value.get("parent").is_none());

        let back: RoomInfo = serde_json::from_value(value).unwrap();
        assert_eq!(back, info);
    }
}

//! # roomcast-protocol
//!
//! Wire protocol definitions for the Roomcast realtime room router.
//!
//! Clients and servers exchange named events as JSON text frames of the
//! form `{"event": <name>, "data": <payload>}`.
//!
//! ## Event directions
//!
//! - [`ClientEvent`] - everything a client can send (`joinRoom`, `publish`,
//!   `createRoom`, ...)
//! - [`ServerEvent`] - everything the server emits (`publishEvent`,
//!   `userJoinedRoom`, `onNewRoom`, ...)
//!
//! ## Example
//!
//! ```rust
//! use roomcast_protocol::{codec, ClientEvent};
//!
//! let event = codec::decode(
//!     r#"{"event": "joinRoom", "data": {"roomId": "team-a", "userName": "Alice"}}"#,
//! )
//! .unwrap();
//! assert!(matches!(event, ClientEvent::JoinRoom(_)));
//! ```

pub mod codec;
pub mod events;

pub use codec::{decode, encode, ProtocolError};
pub use events::{
    ClientEvent, CreateRoomRequest, DeleteMessage, ExitNotice, JoinConfirm, JoinRoomRequest,
    LeaveRoomRequest, PublishRequest, RoomId, RoomInfo, RoomKind, RoomMessage, RoomNotice,
    ServerEvent, StrategyUpdate,
};

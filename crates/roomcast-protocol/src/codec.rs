//! Codec for encoding and decoding Roomcast event frames.
//!
//! Frames are single JSON text messages of the form
//! `{"event": <name>, "data": <payload>}`, matching the named-event
//! channel the clients speak.

use thiserror::Error;

use crate::events::{ClientEvent, ServerEvent};

/// Maximum accepted frame size (256 KiB).
pub const MAX_FRAME_SIZE: usize = 256 * 1024;

/// Protocol errors that can occur during encoding/decoding.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Frame exceeds maximum size.
    #[error("Frame size {0} exceeds maximum {MAX_FRAME_SIZE}")]
    FrameTooLarge(usize),

    /// JSON encoding error.
    #[error("Encoding error: {0}")]
    Encode(serde_json::Error),

    /// JSON decoding error, including unknown event names.
    #[error("Decoding error: {0}")]
    Decode(serde_json::Error),
}

/// Encode a server event to a text frame.
///
/// # Errors
///
/// Returns an error if the event is too large or serialization fails.
pub fn encode(event: &ServerEvent) -> Result<String, ProtocolError> {
    let text = serde_json::to_string(event).map_err(ProtocolError::Encode)?;
    if text.len() > MAX_FRAME_SIZE {
        return Err(ProtocolError::FrameTooLarge(text.len()));
    }
    Ok(text)
}

/// Decode a client event from a text frame.
///
/// # Errors
///
/// Returns an error if the frame is too large, malformed JSON, or names
/// an unknown event.
pub fn decode(text: &str) -> Result<ClientEvent, ProtocolError> {
    if text.len() > MAX_FRAME_SIZE {
        return Err(ProtocolError::FrameTooLarge(text.len()));
    }
    serde_json::from_str(text).map_err(ProtocolError::Decode)
}

/// Encode a client event to a text frame (client side).
///
/// # Errors
///
/// Returns an error if the event is too large or serialization fails.
pub fn encode_client(event: &ClientEvent) -> Result<String, ProtocolError> {
    let text = serde_json::to_string(event).map_err(ProtocolError::Encode)?;
    if text.len() > MAX_FRAME_SIZE {
        return Err(ProtocolError::FrameTooLarge(text.len()));
    }
    Ok(text)
}

/// Decode a server event from a text frame (client side).
///
/// # Errors
///
/// Returns an error if the frame is too large, malformed JSON, or names
/// an unknown event.
pub fn decode_server(text: &str) -> Result<ServerEvent, ProtocolError> {
    if text.len() > MAX_FRAME_SIZE {
        return Err(ProtocolError::FrameTooLarge(text.len()));
    }
    serde_json::from_str(text).map_err(ProtocolError::Decode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{CreateRoomRequest, JoinConfirm, PublishRequest};

    #[test]
    fn test_encode_decode_roundtrip() {
        let events = vec![
            ClientEvent::Publish(PublishRequest {
                user_name: "Alice".to_string(),
                content: "Hello, world!".to_string(),
                extra: serde_json::Map::new(),
            }),
            ClientEvent::CreateRoom(CreateRoomRequest {
                name: "New Team".to_string(),
            }),
            ClientEvent::ListRooms,
        ];

        for event in events {
            let encoded = encode_client(&event).unwrap();
            let decoded = decode(&encoded).unwrap();
            assert_eq!(event, decoded);
        }
    }

    #[test]
    fn test_server_roundtrip() {
        let event = ServerEvent::JoinedRoom(JoinConfirm {
            room_id: "team-a".to_string(),
            message: "joined team-a".to_string(),
            member_count: 3,
        });

        let encoded = encode(&event).unwrap();
        let decoded = decode_server(&encoded).unwrap();
        assert_eq!(event, decoded);
    }

    #[test]
    fn test_decode_unknown_event() {
        match decode(r#"{"event": "selfDestruct", "data": {}}"#) {
            Err(ProtocolError::Decode(_)) => {}
            other => panic!("Expected Decode error, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_malformed() {
        assert!(decode("not json").is_err());
        assert!(decode("{}").is_err());
    }

    #[test]
    fn test_frame_too_large() {
        let big = "x".repeat(MAX_FRAME_SIZE + 1);
        match decode(&big) {
            Err(ProtocolError::FrameTooLarge(_)) => {}
            other => panic!("Expected FrameTooLarge error, got {other:?}"),
        }
    }
}

//! Delivery seam between the router and the transport.
//!
//! The router never talks to a socket directly; it addresses connections
//! by [`ConnectionId`] and hands outbound events to an injected
//! [`EventSink`]. This keeps the routing logic testable without a live
//! transport.

use roomcast_protocol::ServerEvent;
use std::fmt;

/// Unique identifier for a connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub String);

impl ConnectionId {
    /// Create a new connection ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh connection ID from the current time.
    #[must_use]
    pub fn generate() -> Self {
        use std::time::{SystemTime, UNIX_EPOCH};
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        Self(format!("conn_{timestamp}"))
    }

    /// Get the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ConnectionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ConnectionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// One-way, fire-and-forget event delivery.
///
/// Implementations must not block and must swallow delivery failures: a
/// slow or dead receiver is the transport's problem and never unwinds
/// router state that already mutated.
pub trait EventSink: Send + Sync {
    /// Deliver an event to a single connection, best effort.
    fn deliver(&self, target: &ConnectionId, event: &ServerEvent);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_generate_unique() {
        let a = ConnectionId::generate();
        let b = ConnectionId::generate();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("conn_"));
    }

    #[test]
    fn test_connection_id_display() {
        let id = ConnectionId::new("conn-1");
        assert_eq!(id.to_string(), "conn-1");
    }
}

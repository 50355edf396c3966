//! Connection registry and room membership table.
//!
//! Two maps held in lockstep: room -> member set, and connection ->
//! current room. A connection is in at most one room, and a room key is
//! present iff its member set is non-empty.

use crate::sink::ConnectionId;
use roomcast_protocol::RoomId;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Tracks which connections occupy which room.
#[derive(Debug, Default)]
pub struct Membership {
    /// Members per room. No key maps to an empty set.
    members: HashMap<RoomId, HashSet<ConnectionId>>,
    /// Current room per connection.
    current: HashMap<ConnectionId, RoomId>,
}

impl Membership {
    /// Create an empty membership table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection to a room and make it the connection's current room.
    ///
    /// Re-adding a connection to its current room is a state no-op.
    /// Returns the post-join member count of the room.
    pub fn join(&mut self, conn: &ConnectionId, room: &RoomId) -> usize {
        let set = self.members.entry(room.clone()).or_default();
        set.insert(conn.clone());
        let count = set.len();
        self.current.insert(conn.clone(), room.clone());
        debug!(room = %room, connection = %conn, members = count, "Joined room");
        count
    }

    /// Remove a connection from a room.
    ///
    /// The room's entry is dropped as soon as its set empties, and the
    /// connection's current room is cleared unconditionally. Safe no-op
    /// when the connection was not a member.
    ///
    /// Returns `true` if the connection was actually a member.
    pub fn leave(&mut self, conn: &ConnectionId, room: &RoomId) -> bool {
        let mut was_member = false;
        if let Some(set) = self.members.get_mut(room) {
            was_member = set.remove(conn);
            if set.is_empty() {
                self.members.remove(room);
                debug!(room = %room, "Removed empty room");
            }
        }
        self.current.remove(conn);
        if was_member {
            debug!(room = %room, connection = %conn, "Left room");
        }
        was_member
    }

    /// Get the room a connection currently occupies.
    #[must_use]
    pub fn current_room(&self, conn: &ConnectionId) -> Option<&RoomId> {
        self.current.get(conn)
    }

    /// Get the members of a room.
    #[must_use]
    pub fn members(&self, room: &RoomId) -> Vec<ConnectionId> {
        self.members
            .get(room)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Get the member count of a room.
    #[must_use]
    pub fn member_count(&self, room: &RoomId) -> usize {
        self.members.get(room).map_or(0, HashSet::len)
    }

    /// Check if a room has any members.
    #[must_use]
    pub fn is_occupied(&self, room: &RoomId) -> bool {
        self.members.contains_key(room)
    }

    /// Number of rooms with at least one member.
    #[must_use]
    pub fn occupied_rooms(&self) -> usize {
        self.members.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn(id: &str) -> ConnectionId {
        ConnectionId::new(id)
    }

    /// Both maps must agree: current[c] = r iff c is in members[r].
    fn assert_lockstep(m: &Membership) {
        for (c, r) in &m.current {
            assert!(
                m.members.get(r).is_some_and(|set| set.contains(c)),
                "{c} claims room {r} but is not a member"
            );
        }
        for (r, set) in &m.members {
            assert!(!set.is_empty(), "room {r} has an empty member set");
            for c in set {
                assert_eq!(m.current.get(c), Some(r), "{c} in {r} without current room");
            }
        }
    }

    #[test]
    fn test_join_leave_lockstep() {
        let mut m = Membership::new();
        let room = "team-a".to_string();

        assert_eq!(m.join(&conn("a"), &room), 1);
        assert_eq!(m.join(&conn("b"), &room), 2);
        assert_lockstep(&m);

        assert!(m.leave(&conn("a"), &room));
        assert_lockstep(&m);
        assert_eq!(m.member_count(&room), 1);
        assert_eq!(m.current_room(&conn("a")), None);
    }

    #[test]
    fn test_empty_room_is_removed() {
        let mut m = Membership::new();
        let room = "team-a".to_string();

        m.join(&conn("a"), &room);
        assert!(m.is_occupied(&room));

        m.leave(&conn("a"), &room);
        assert!(!m.is_occupied(&room));
        assert_eq!(m.occupied_rooms(), 0);
        assert_lockstep(&m);
    }

    #[test]
    fn test_rejoin_same_room_is_idempotent() {
        let mut m = Membership::new();
        let room = "team-a".to_string();

        assert_eq!(m.join(&conn("a"), &room), 1);
        assert_eq!(m.join(&conn("a"), &room), 1);
        assert_eq!(m.member_count(&room), 1);
        assert_lockstep(&m);
    }

    #[test]
    fn test_leave_non_member_is_noop() {
        let mut m = Membership::new();
        let room = "team-a".to_string();
        let other = "team-b".to_string();

        m.join(&conn("a"), &room);
        assert!(!m.leave(&conn("b"), &room));
        assert!(!m.leave(&conn("a"), &other));
        // Leave clears the registry unconditionally, even for the wrong room.
        assert_eq!(m.current_room(&conn("a")), None);
        assert_eq!(m.member_count(&room), 1);
    }

    #[test]
    fn test_migration_between_rooms() {
        let mut m = Membership::new();
        let a = "team-a".to_string();
        let b = "team-b".to_string();

        m.join(&conn("x"), &a);
        m.leave(&conn("x"), &a);
        m.join(&conn("x"), &b);

        assert_eq!(m.current_room(&conn("x")), Some(&b));
        assert!(!m.is_occupied(&a));
        assert_lockstep(&m);
    }
}

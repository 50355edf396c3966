//! Event router for Roomcast.
//!
//! The router owns all mutable state (known connections, room membership,
//! room directory) behind one coarse lock, dispatches inbound client
//! events, and fans outbound events out through an injected [`EventSink`].
//!
//! Failure semantics follow a best-effort model: an event missing a
//! required field is dropped with a debug log, never answered with an
//! error. Delivery is fire-and-forget.

use crate::directory::Directory;
use crate::membership::Membership;
use crate::sink::{ConnectionId, EventSink};
use roomcast_protocol::{
    ClientEvent, JoinConfirm, RoomId, RoomMessage, RoomNotice, ServerEvent,
};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

/// Display name used when a connection drops without announcing itself.
pub const UNKNOWN_USER: &str = "Unknown User";

/// An outbound event addressed to one connection.
type Delivery = (ConnectionId, ServerEvent);

/// Mutable router state, guarded as a whole so join/leave read-then-write
/// across membership and registry appears atomic to concurrent senders.
#[derive(Debug, Default)]
struct RouterState {
    /// Every live connection, roomless ones included.
    connections: HashSet<ConnectionId>,
    /// Room membership and current-room registry.
    membership: Membership,
    /// Known rooms and their hierarchy.
    directory: Directory,
}

/// The central event router.
pub struct Router {
    state: Mutex<RouterState>,
    sink: Arc<dyn EventSink>,
}

impl Router {
    /// Create a router over the default seeded directory.
    #[must_use]
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self::with_directory(Directory::seed(), sink)
    }

    /// Create a router over a specific directory.
    #[must_use]
    pub fn with_directory(directory: Directory, sink: Arc<dyn EventSink>) -> Self {
        Self {
            state: Mutex::new(RouterState {
                connections: HashSet::new(),
                membership: Membership::new(),
                directory,
            }),
            sink,
        }
    }

    fn state(&self) -> MutexGuard<'_, RouterState> {
        self.state.lock().expect("router state lock poisoned")
    }

    /// Register a new connection.
    pub fn connect(&self, conn: &ConnectionId) {
        let mut state = self.state();
        state.connections.insert(conn.clone());
        debug!(connection = %conn, connections = state.connections.len(), "Connected");
    }

    /// Tear down a connection: force the leave path for whatever room it
    /// held, then forget it.
    pub fn disconnect(&self, conn: &ConnectionId) {
        let deliveries = {
            let mut state = self.state();
            let mut out = Vec::new();
            if let Some(room) = state.membership.current_room(conn).cloned() {
                out = leave_room(&mut state, conn, &room, UNKNOWN_USER);
            }
            state.connections.remove(conn);
            debug!(connection = %conn, connections = state.connections.len(), "Disconnected");
            out
        };
        self.deliver(deliveries);
    }

    /// Handle one inbound event from a connection.
    pub fn handle(&self, sender: &ConnectionId, event: ClientEvent) {
        let deliveries = {
            let mut state = self.state();
            match event {
                ClientEvent::Enter(data) => {
                    relay_all(&state, sender, ServerEvent::Enter(data))
                }

                ClientEvent::Exit(notice) => {
                    let mut out = Vec::new();
                    if let Some(room) = state.membership.current_room(sender).cloned() {
                        out = leave_room(&mut state, sender, &room, &notice.user_name);
                    }
                    out.extend(relay_all(&state, sender, ServerEvent::Exit(notice)));
                    out
                }

                ClientEvent::Publish(request) => {
                    match state.membership.current_room(sender).cloned() {
                        Some(room) => {
                            // The server stamp is authoritative; drop any
                            // client-sent copies so the wire frame carries
                            // each key exactly once.
                            let mut extra = request.extra;
                            extra.remove("roomId");
                            extra.remove("timestamp");
                            let message = RoomMessage {
                                user_name: request.user_name,
                                content: request.content,
                                room_id: room.clone(),
                                timestamp: now_millis(),
                                extra,
                            };
                            let mut out = relay_room(
                                &state,
                                sender,
                                &room,
                                ServerEvent::PublishEvent(message.clone()),
                            );
                            // Read-your-write confirmation: identical copy to sender.
                            out.push((sender.clone(), ServerEvent::PublishEvent(message)));
                            out
                        }
                        None => {
                            debug!(connection = %sender, "Dropping publish from roomless connection");
                            Vec::new()
                        }
                    }
                }

                ClientEvent::JoinRoom(request) => match request.room_id {
                    Some(room) => join_room(&mut state, sender, &room, &request.user_name),
                    None => {
                        debug!(connection = %sender, "Dropping joinRoom without a room id");
                        Vec::new()
                    }
                },

                ClientEvent::LeaveRoom(request) => match request.room_id.clone() {
                    Some(room) => leave_room(&mut state, sender, &room, &request.user_name),
                    None => {
                        debug!(connection = %sender, "Dropping leaveRoom without a room id");
                        Vec::new()
                    }
                },

                ClientEvent::StrategyUpdate(update) => match update.room_id.clone() {
                    // Trust-the-client relay, no membership check.
                    Some(room) => {
                        relay_room(&state, sender, &room, ServerEvent::StrategyUpdate(update))
                    }
                    None => {
                        debug!(connection = %sender, "Dropping strategyUpdate without a room id");
                        Vec::new()
                    }
                },

                ClientEvent::DeleteMessage(deletion) => match deletion.room_id.clone() {
                    Some(room) => {
                        relay_room(&state, sender, &room, ServerEvent::DeleteMessage(deletion))
                    }
                    None => {
                        debug!(connection = %sender, "Dropping deleteMessage without a room id");
                        Vec::new()
                    }
                },

                ClientEvent::CreateRoom(request) => {
                    if request.name.is_empty() {
                        // Empty name degrades into a directory read for the requester.
                        let snapshot = state.directory.snapshot();
                        vec![(sender.clone(), ServerEvent::FetchServerRooms(snapshot))]
                    } else {
                        let room = state.directory.create_room(&request.name);
                        info!(room = %room, name = %request.name, "Room created");
                        let snapshot = state.directory.snapshot();
                        state
                            .connections
                            .iter()
                            .map(|conn| (conn.clone(), ServerEvent::OnNewRoom(snapshot.clone())))
                            .collect()
                    }
                }

                ClientEvent::ListRooms => {
                    let snapshot = state.directory.snapshot();
                    state
                        .connections
                        .iter()
                        .map(|conn| (conn.clone(), ServerEvent::FetchServerRooms(snapshot.clone())))
                        .collect()
                }
            }
        };
        self.deliver(deliveries);
    }

    /// The room a connection currently occupies.
    #[must_use]
    pub fn current_room(&self, conn: &ConnectionId) -> Option<RoomId> {
        self.state().membership.current_room(conn).cloned()
    }

    /// Member count of a room.
    #[must_use]
    pub fn member_count(&self, room: &RoomId) -> usize {
        self.state().membership.member_count(room)
    }

    /// Whether a room has any members.
    #[must_use]
    pub fn is_occupied(&self, room: &RoomId) -> bool {
        self.state().membership.is_occupied(room)
    }

    /// Whole-directory snapshot.
    #[must_use]
    pub fn directory_snapshot(&self) -> Vec<roomcast_protocol::RoomInfo> {
        self.state().directory.snapshot()
    }

    /// Get router statistics.
    #[must_use]
    pub fn stats(&self) -> RouterStats {
        let state = self.state();
        RouterStats {
            connection_count: state.connections.len(),
            occupied_rooms: state.membership.occupied_rooms(),
            directory_rooms: state.directory.len(),
        }
    }

    /// Hand the collected deliveries to the sink, outside the state lock.
    fn deliver(&self, deliveries: Vec<Delivery>) {
        for (target, event) in deliveries {
            self.sink.deliver(&target, &event);
        }
    }
}

/// Router statistics.
#[derive(Debug, Clone)]
pub struct RouterStats {
    /// Number of live connections.
    pub connection_count: usize,
    /// Number of rooms with at least one member.
    pub occupied_rooms: usize,
    /// Number of rooms in the directory.
    pub directory_rooms: usize,
}

/// Address an event to every connection except the sender.
fn relay_all(state: &RouterState, sender: &ConnectionId, event: ServerEvent) -> Vec<Delivery> {
    state
        .connections
        .iter()
        .filter(|conn| *conn != sender)
        .map(|conn| (conn.clone(), event.clone()))
        .collect()
}

/// Address an event to every member of a room except the sender.
fn relay_room(
    state: &RouterState,
    sender: &ConnectionId,
    room: &RoomId,
    event: ServerEvent,
) -> Vec<Delivery> {
    state
        .membership
        .members(room)
        .into_iter()
        .filter(|conn| conn != sender)
        .map(|conn| (conn, event.clone()))
        .collect()
}

/// Join a room, migrating out of a different current room first.
///
/// Emits `userJoinedRoom` to every other member and `joinedRoom` to the
/// joiner, confirmation included on a redundant re-join.
fn join_room(
    state: &mut RouterState,
    conn: &ConnectionId,
    room: &RoomId,
    user_name: &str,
) -> Vec<Delivery> {
    let mut out = Vec::new();
    if let Some(previous) = state.membership.current_room(conn).cloned() {
        if previous != *room {
            out = leave_room(state, conn, &previous, user_name);
        }
    }

    let member_count = state.membership.join(conn, room);

    let notice = RoomNotice {
        user_name: user_name.to_string(),
        room_id: room.clone(),
        message: format!("{user_name} joined {room}"),
    };
    out.extend(relay_room(state, conn, room, ServerEvent::UserJoinedRoom(notice)));

    out.push((
        conn.clone(),
        ServerEvent::JoinedRoom(JoinConfirm {
            room_id: room.clone(),
            message: format!("joined {room}"),
            member_count,
        }),
    ));
    out
}

/// Leave a room and notify the remaining members.
///
/// Safe no-op for a non-member; the empty notice simply has no recipients.
fn leave_room(
    state: &mut RouterState,
    conn: &ConnectionId,
    room: &RoomId,
    user_name: &str,
) -> Vec<Delivery> {
    state.membership.leave(conn, room);

    let notice = RoomNotice {
        user_name: user_name.to_string(),
        room_id: room.clone(),
        message: format!("{user_name} left {room}"),
    };
    relay_room(state, conn, room, ServerEvent::UserLeftRoom(notice))
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis() as u64
}

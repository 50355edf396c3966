//! Room directory: the forest of known rooms and their display metadata.
//!
//! The directory is independent of who currently occupies a room. Entries
//! are seeded at startup and grown by dynamic creation requests; they are
//! never deleted. Dynamically created rooms always attach under the fixed
//! root, so the forest stays acyclic by construction.

use roomcast_protocol::{RoomId, RoomInfo, RoomKind};
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::debug;

/// Icon assigned to dynamically created team rooms.
const DEFAULT_TEAM_ICON: &str = "👥";

/// Directory errors.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// The seed list was empty.
    #[error("Seed contains no rooms")]
    EmptySeed,

    /// The seed root named a parent.
    #[error("Root room {0} must not name a parent")]
    RootHasParent(RoomId),

    /// A non-root seed room named no parent.
    #[error("Room {0} must name a parent")]
    MissingParent(RoomId),

    /// A room named a parent that does not exist.
    #[error("Unknown parent room: {0}")]
    UnknownParent(RoomId),

    /// A room id appeared twice.
    #[error("Duplicate room id: {0}")]
    DuplicateRoom(RoomId),
}

/// The set of known rooms and their hierarchy.
#[derive(Debug)]
pub struct Directory {
    /// Rooms by id.
    rooms: HashMap<RoomId, RoomInfo>,
    /// Insertion order, for stable snapshots.
    order: Vec<RoomId>,
    /// The fixed root every dynamic room attaches to.
    root: RoomId,
}

impl Directory {
    /// Create a directory containing only the given root room.
    ///
    /// Any parent or children carried by `root` are discarded; the root
    /// has no parent and its children are derived from later inserts.
    #[must_use]
    pub fn new(mut root: RoomInfo) -> Self {
        root.parent = None;
        root.children = Vec::new();
        let root_id = root.id.clone();
        Self {
            rooms: HashMap::from([(root_id.clone(), root)]),
            order: vec![root_id.clone()],
            root: root_id,
        }
    }

    /// Insert a room under an existing parent.
    ///
    /// The room's parent link and the parent's child list are both
    /// maintained here; any parent or children carried by `info` are
    /// overwritten.
    ///
    /// # Errors
    ///
    /// Returns an error if the id already exists or the parent is unknown.
    pub fn insert(&mut self, mut info: RoomInfo, parent: &RoomId) -> Result<(), DirectoryError> {
        if self.rooms.contains_key(&info.id) {
            return Err(DirectoryError::DuplicateRoom(info.id));
        }
        let Some(parent_info) = self.rooms.get_mut(parent) else {
            return Err(DirectoryError::UnknownParent(parent.clone()));
        };
        parent_info.children.push(info.id.clone());
        info.parent = Some(parent.clone());
        info.children = Vec::new();
        self.order.push(info.id.clone());
        self.rooms.insert(info.id.clone(), info);
        Ok(())
    }

    /// Build a directory from a seed list.
    ///
    /// The first entry is the root and must not name a parent; every
    /// later entry must name an already-seeded parent. Child lists in the
    /// seed are ignored and derived from the parent links.
    ///
    /// # Errors
    ///
    /// Returns an error if the seed is empty, a parent is missing or
    /// unknown, or an id repeats.
    pub fn from_seed(seed: Vec<RoomInfo>) -> Result<Self, DirectoryError> {
        let mut entries = seed.into_iter();
        let root = entries.next().ok_or(DirectoryError::EmptySeed)?;
        if root.parent.is_some() {
            return Err(DirectoryError::RootHasParent(root.id));
        }

        let mut directory = Self::new(root);
        for info in entries {
            let Some(parent) = info.parent.clone() else {
                return Err(DirectoryError::MissingParent(info.id));
            };
            directory.insert(info, &parent)?;
        }
        Ok(directory)
    }

    /// The built-in default hierarchy: a public root, three team rooms,
    /// and a match room under two of the teams.
    #[must_use]
    pub fn seed() -> Self {
        fn room(
            id: &str,
            name: &str,
            kind: RoomKind,
            icon: &str,
            parent: Option<&str>,
            expanded: bool,
        ) -> RoomInfo {
            RoomInfo {
                id: id.to_string(),
                name: name.to_string(),
                kind,
                icon: icon.to_string(),
                parent: parent.map(str::to_string),
                children: Vec::new(),
                expanded,
            }
        }

        let seed = vec![
            room("lobby", "Lobby", RoomKind::Public, "🏠", None, true),
            room("team-alpha", "Team Alpha", RoomKind::Team, "🛡️", Some("lobby"), false),
            room("team-bravo", "Team Bravo", RoomKind::Team, "⚔️", Some("lobby"), false),
            room("team-charlie", "Team Charlie", RoomKind::Team, "🎯", Some("lobby"), false),
            room("match-alpha-1", "Alpha Scrim", RoomKind::Match, "🎮", Some("team-alpha"), false),
            room("match-bravo-1", "Bravo Scrim", RoomKind::Match, "🎮", Some("team-bravo"), false),
        ];

        Self::from_seed(seed).expect("default seed is valid")
    }

    /// Create a team room under the root with a fresh clock-derived id.
    ///
    /// Returns the new room's id.
    pub fn create_room(&mut self, name: &str) -> RoomId {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_millis() as u64;

        let mut id = format!("room-{millis}");
        let mut probe = 1;
        while self.rooms.contains_key(&id) {
            id = format!("room-{millis}-{probe}");
            probe += 1;
        }

        let info = RoomInfo {
            id: id.clone(),
            name: name.to_string(),
            kind: RoomKind::Team,
            icon: DEFAULT_TEAM_ICON.to_string(),
            parent: Some(self.root.clone()),
            children: Vec::new(),
            expanded: false,
        };

        if let Some(root) = self.rooms.get_mut(&self.root) {
            root.children.push(id.clone());
        }
        self.order.push(id.clone());
        self.rooms.insert(id.clone(), info);

        debug!(room = %id, name = %name, "Created room");
        id
    }

    /// The fixed root room id.
    #[must_use]
    pub fn root(&self) -> &RoomId {
        &self.root
    }

    /// Look up a room by id.
    #[must_use]
    pub fn get(&self, id: &RoomId) -> Option<&RoomInfo> {
        self.rooms.get(id)
    }

    /// Check if a room exists.
    #[must_use]
    pub fn contains(&self, id: &RoomId) -> bool {
        self.rooms.contains_key(id)
    }

    /// Number of known rooms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    /// Check if the directory is empty. Never true after construction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Whole-directory snapshot in insertion order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<RoomInfo> {
        self.order
            .iter()
            .filter_map(|id| self.rooms.get(id))
            .cloned()
            .collect()
    }
}

impl Default for Directory {
    fn default() -> Self {
        Self::seed()
    }
}

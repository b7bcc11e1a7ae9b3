use crate::room::connection::{Connection, ConnectionId, Delivery, Frame};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Member set of a single room
#[derive(Default)]
struct Room {
    members: HashMap<ConnectionId, Connection>,
}

/// Outcome of a join
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOutcome {
    /// Room the connection belonged to before this join (may equal the new one)
    pub previous: Option<String>,
    /// True if this join brought the room into existence
    pub created: bool,
}

/// Room registry: room id -> member connections.
///
/// Rooms exist only while they have members. A room entry is created by
/// `attach` and destroyed by `detach`; nothing else inserts or removes rooms.
///
/// Locking: `memberships` is always locked before `rooms`, and `rooms` guards
/// are never held across an await or a blocking send.
pub struct RoomRegistry {
    /// Primary storage: room_id -> members
    rooms: Arc<DashMap<String, Room>>,
    /// Secondary index: connection -> room_id
    memberships: Arc<DashMap<ConnectionId, String>>,
}

impl RoomRegistry {
    /// Create new empty registry
    pub fn new() -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
            memberships: Arc::new(DashMap::new()),
        }
    }

    /// Add `conn` to `room_id`, moving it out of any room it is already in.
    ///
    /// The connection's index slot stays locked for the whole move, so it is
    /// never recorded in two rooms.
    pub fn join(&self, room_id: &str, conn: &Connection) -> JoinOutcome {
        match self.memberships.entry(conn.id()) {
            Entry::Occupied(mut slot) => {
                let previous = slot.insert(room_id.to_string());
                if previous != room_id {
                    self.detach(&previous, conn.id());
                }
                let created = self.attach(room_id, conn);
                JoinOutcome {
                    previous: Some(previous),
                    created,
                }
            }
            Entry::Vacant(slot) => {
                let created = self.attach(room_id, conn);
                slot.insert(room_id.to_string());
                JoinOutcome {
                    previous: None,
                    created,
                }
            }
        }
    }

    /// Remove a connection from its room.
    ///
    /// Returns the room it was removed from. Calling it again is a no-op.
    pub fn leave(&self, conn_id: ConnectionId) -> Option<String> {
        let (_, room_id) = self.memberships.remove(&conn_id)?;
        self.detach(&room_id, conn_id);
        Some(room_id)
    }

    /// Send `frame` to every open member of `room_id` except `exclude`.
    ///
    /// Returns the number of connections the frame was enqueued for. Closed
    /// members are skipped; a missing room is a no-op.
    pub fn broadcast(&self, room_id: &str, frame: &Frame, exclude: Option<ConnectionId>) -> usize {
        let Some(room) = self.rooms.get(room_id) else {
            return 0;
        };

        let mut delivered = 0;
        for (id, conn) in room.members.iter() {
            if exclude == Some(*id) {
                continue;
            }
            match conn.send(Arc::clone(frame)) {
                Delivery::Delivered => delivered += 1,
                Delivery::Closed => {
                    debug!(room_id = %room_id, connection_id = %id, "Skipping closed connection");
                }
                Delivery::Dropped => {
                    warn!(room_id = %room_id, connection_id = %id, "Outbound buffer full, frame dropped");
                }
            }
        }

        delivered
    }

    /// Number of connections in a room (0 if absent)
    pub fn member_count(&self, room_id: &str) -> usize {
        self.rooms.get(room_id).map(|r| r.members.len()).unwrap_or(0)
    }

    /// Number of live rooms
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn contains_room(&self, room_id: &str) -> bool {
        self.rooms.contains_key(room_id)
    }

    /// Room a connection currently belongs to
    pub fn room_of(&self, conn_id: ConnectionId) -> Option<String> {
        self.memberships.get(&conn_id).map(|r| r.value().clone())
    }

    /// Insert into a room's member set, creating the room if needed
    fn attach(&self, room_id: &str, conn: &Connection) -> bool {
        let mut created = false;
        self.rooms
            .entry(room_id.to_string())
            .or_insert_with(|| {
                created = true;
                Room::default()
            })
            .members
            .insert(conn.id(), conn.clone());

        if created {
            info!(room_id = %room_id, "Room created");
        }
        created
    }

    /// Remove from a room's member set, destroying the room once empty.
    ///
    /// Removal and destruction happen under one shard lock, so a concurrent
    /// join either lands before (room survives) or after (room is recreated).
    fn detach(&self, room_id: &str, conn_id: ConnectionId) -> bool {
        let mut removed = false;
        let destroyed = self
            .rooms
            .remove_if_mut(room_id, |_, room| {
                removed = room.members.remove(&conn_id).is_some();
                room.members.is_empty()
            })
            .is_some();

        if destroyed {
            info!(room_id = %room_id, "Room closed");
        }
        removed
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

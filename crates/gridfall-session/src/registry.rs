//! The connection registry: which room is each live connection in?
//!
//! Every room mutation starts here — the router resolves the acting
//! connection's room through the registry before touching any room
//! state. A connection with no registration has no room, and actions
//! from it are ignored upstream.
//!
//! # Concurrency note
//!
//! `ConnectionRegistry` is NOT thread-safe by itself — it is a plain
//! `HashMap` owned by the single router task. All access is serialized
//! by that task's command loop, so no locking is needed here.

use std::collections::HashMap;

use gridfall_protocol::{PlayerId, RoomCode};

/// What the registry knows about one connection.
#[derive(Debug, Clone)]
pub struct Registration {
    /// The room this connection currently occupies.
    pub room: RoomCode,
    /// The display name the player supplied. Not validated, not unique.
    pub name: String,
}

/// Maps each live connection to its room and display name.
///
/// Registrations are created when a player enters a room (create or
/// join) and removed when they leave it or disconnect — not when the
/// connection opens, so "connected but in no room" is simply absence
/// from the map.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    entries: HashMap<PlayerId, Registration>,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self { entries: HashMap::new() }
    }

    /// Records that `player` is now in `room` under `name`.
    ///
    /// Overwrites any previous registration; callers enforce the
    /// one-room-at-a-time rule before getting here.
    pub fn register(
        &mut self,
        player: PlayerId,
        room: RoomCode,
        name: impl Into<String>,
    ) {
        let name = name.into();
        tracing::debug!(%player, %room, %name, "connection registered");
        self.entries.insert(player, Registration { room, name });
    }

    /// Looks up the room and name for a connection.
    pub fn lookup(&self, player: &PlayerId) -> Option<&Registration> {
        self.entries.get(player)
    }

    /// Removes a connection's registration, returning it if present.
    pub fn unregister(&mut self, player: &PlayerId) -> Option<Registration> {
        let removed = self.entries.remove(player);
        if let Some(reg) = &removed {
            tracing::debug!(%player, room = %reg.room, "connection unregistered");
        }
        removed
    }

    /// Returns the number of registered connections.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no connections are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =========================================================================
// Tests
// =========================================================================

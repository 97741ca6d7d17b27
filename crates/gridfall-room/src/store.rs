//! Room storage: code generation, creation, lookup, deletion.
//!
//! The store enforces no game rules — it owns the map from room code
//! to [`Room`] and nothing else.

use std::collections::HashMap;

use gridfall_protocol::{PlayerId, RoomCode};
use rand::Rng;

use crate::{Room, RoomError, RoomOptions};

/// Length of a generated room code.
const CODE_LENGTH: usize = 6;

/// Uppercase letters and digits; 36^6 codes make collisions among live
/// rooms negligible, and the regenerate loop below removes them
/// entirely.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// All live rooms, keyed by code.
#[derive(Debug, Default)]
pub struct RoomStore {
    rooms: HashMap<RoomCode, Room>,
}

impl RoomStore {
    /// Creates a new, empty store.
    pub fn new() -> Self {
        Self { rooms: HashMap::new() }
    }

    /// Creates a room with a fresh unique code and the creator as its
    /// host, returning the code.
    pub fn create(
        &mut self,
        host: PlayerId,
        host_name: impl Into<String>,
        options: RoomOptions,
    ) -> Result<RoomCode, RoomError> {
        options.validate()?;
        let code = self.unused_code();
        let room = Room::new(code.clone(), host, host_name.into(), options);
        self.rooms.insert(code.clone(), room);
        tracing::info!(%code, %host, "room created");
        Ok(code)
    }

    /// Looks up a room by code.
    pub fn get(&self, code: &RoomCode) -> Option<&Room> {
        self.rooms.get(code)
    }

    /// Looks up a room by code, mutably.
    pub fn get_mut(&mut self, code: &RoomCode) -> Option<&mut Room> {
        self.rooms.get_mut(code)
    }

    /// Deletes a room, returning it if it existed. The code becomes
    /// available for reuse from this point on.
    pub fn remove(&mut self, code: &RoomCode) -> Option<Room> {
        let removed = self.rooms.remove(code);
        if removed.is_some() {
            tracing::info!(%code, "room destroyed");
        }
        removed
    }

    /// Returns the number of live rooms.
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Generates a code no live room is using. Collisions just retry.
    fn unused_code(&self) -> RoomCode {
        loop {
            let code = generate_code();
            if !self.rooms.contains_key(&code) {
                return code;
            }
        }
    }
}

/// Generates a random 6-character uppercase alphanumeric code.
fn generate_code() -> RoomCode {
    let mut rng = rand::rng();
    let code: String = (0..CODE_LENGTH)
        .map(|_| {
            let i = rng.random_range(0..CODE_ALPHABET.len());
            CODE_ALPHABET[i] as char
        })
        .collect();
    RoomCode::new(code)
}

// =========================================================================
// Tests
// =========================================================================

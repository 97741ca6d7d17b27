//! Room lifecycle and game rules for Gridfall.
//!
//! # Key types
//!
//! - [`Room`] — the per-room state machine: roster, phase, turn
//!   rotation, danger square, eliminations. Operations return the
//!   [`ServerEvent`](gridfall_protocol::ServerEvent)s to broadcast.
//! - [`RoomStore`] — creates, looks up, and deletes rooms; generates
//!   unique room codes.
//! - [`RoomPhase`] — the `Waiting → Choosing → Playing → Finished`
//!   lifecycle.
//! - [`RoomOptions`] — board size, capacity, game mode.
//! - [`RoomError`] — typed rejections.
//!
//! The crate is transport-free by design: feed actions in, assert on
//! emitted events.

mod config;
mod error;
mod room;
mod store;

pub use config::{DEFAULT_MAX_PLAYERS, MIN_BOARD_SIZE, RoomOptions, RoomPhase};
pub use error::RoomError;
pub use room::{Elimination, Room, RoomEvents};
pub use store::RoomStore;

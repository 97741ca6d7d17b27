//! Connection tracking for Gridfall.
//!
//! A "session" here is nothing more than an ephemeral connection handle
//! plus where it currently sits: the [`ConnectionRegistry`] maps each
//! live [`PlayerId`](gridfall_protocol::PlayerId) to its room code and
//! display name. There are no accounts, tokens, or reconnection — a
//! dropped link is a departure.
//!
//! # How it fits in the stack
//!
//! ```text
//! Router (above)    ← consults the registry before every room mutation
//!     ↕
//! Session layer (this crate)
//!     ↕
//! Protocol layer (below)  ← provides PlayerId, RoomCode
//! ```

mod registry;

pub use registry::{ConnectionRegistry, Registration};

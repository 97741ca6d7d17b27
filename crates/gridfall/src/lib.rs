//! # Gridfall
//!
//! A real-time multiplayer party game server: players share a room
//! identified by a short code, reveal squares on a board, and lose
//! when they reveal the hidden danger square.
//!
//! The crate assembles the layers — transport, protocol, connection
//! registry, and the room state machine — around a single router actor
//! that owns all mutable game state, so every game transition executes
//! atomically without locks.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gridfall::GridfallServerBuilder;
//!
//! # async fn run() -> Result<(), gridfall::GridfallError> {
//! let server = GridfallServerBuilder::new()
//!     .bind("0.0.0.0:3000")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod router;
mod server;

pub use error::GridfallError;
pub use router::{EventSender, RouterHandle, spawn_router};
pub use server::{GridfallServer, GridfallServerBuilder};

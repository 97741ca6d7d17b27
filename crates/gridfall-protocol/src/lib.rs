//! Wire protocol for Gridfall.
//!
//! This crate defines the language clients and the server speak:
//!
//! - **Types** ([`ClientAction`], [`ServerEvent`], [`PlayerId`],
//!   [`RoomCode`], [`GameMode`]) — the tagged unions and identifiers
//!   that travel on the wire, plus [`Recipient`] for routing.
//! - **Codec** ([`Codec`], [`JsonCodec`]) — how messages become bytes.
//! - **Errors** ([`ProtocolError`]).
//!
//! The protocol layer knows nothing about connections or rooms; the
//! room state machine emits `(Recipient, ServerEvent)` pairs and can be
//! tested without any network in sight.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ClientAction, GameMode, PlayerEntry, PlayerId, Recipient, RoomCode,
    ServerEvent,
};

//! Unified error type for the Gridfall server.

use gridfall_transport::TransportError;

/// Top-level error for building and running the server.
///
/// The `#[from]` attribute generates the `From` impls, so `?` converts
/// layer errors automatically. Game-rule violations never reach this
/// type — they are routed back to the offending client as `error`
/// events and the server keeps running.
#[derive(Debug, thiserror::Error)]
pub enum GridfallError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The router task is gone; no further actions can be processed.
    #[error("event router is no longer running")]
    RouterClosed,
}

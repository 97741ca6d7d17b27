//! Error types for the room layer.
//!
//! Every rule violation is a typed rejection: the action is refused,
//! room state is untouched, and the router decides per-variant whether
//! the acting client hears about it (see [`RoomError::is_silent`]).

use gridfall_protocol::{PlayerId, RoomCode};

use crate::RoomPhase;

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// No live room has this code.
    #[error("room {0} not found")]
    RoomNotFound(RoomCode),

    /// The room is past the waiting phase and the roster is closed.
    #[error("game already started in room {0}")]
    GameAlreadyStarted(RoomCode),

    /// No player slots left.
    #[error("room {0} is full")]
    RoomFull(RoomCode),

    /// An out-of-turn reveal in elimination mode.
    #[error("it is not player {0}'s turn")]
    NotYourTurn(PlayerId),

    /// A host-only action from a non-host. Dropped silently by the
    /// router.
    #[error("player {0} is not the host")]
    NotHost(PlayerId),

    /// The action is not valid in the room's current phase. Dropped
    /// silently by the router.
    #[error("cannot {action} while the room is {phase}")]
    WrongPhase {
        action: &'static str,
        phase: RoomPhase,
    },

    /// A square index outside the board.
    #[error("square {index} is out of range for a board of {board_size}")]
    InvalidSquare { index: usize, board_size: usize },

    /// A board too small to play on.
    #[error("board size {0} is too small (minimum 2)")]
    InvalidBoardSize(usize),

    /// A player capacity that cannot even hold the creator.
    #[error("player cap {0} must be at least 1")]
    InvalidPlayerCap(usize),

    /// The connection is already in a room (one room at a time).
    #[error("player {0} is already in room {1}")]
    AlreadyInRoom(PlayerId, RoomCode),
}

impl RoomError {
    /// Rejections the router drops without notifying the client.
    ///
    /// Host checks and phase mismatches are ignored rather than
    /// surfaced — a non-host mashing the start button or a click
    /// arriving just after the round ended is everyday noise, not an
    /// error the player can act on.
    pub fn is_silent(&self) -> bool {
        matches!(self, Self::NotHost(_) | Self::WrongPhase { .. })
    }
}

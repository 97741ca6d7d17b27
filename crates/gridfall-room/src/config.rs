//! Room options and the lifecycle phase machine.

use gridfall_protocol::GameMode;

use crate::RoomError;

// ---------------------------------------------------------------------------
// RoomOptions
// ---------------------------------------------------------------------------

/// Capacity used when the creator does not supply `maxPlayers`.
pub const DEFAULT_MAX_PLAYERS: usize = 8;

/// Smallest board that leaves at least one safe square to click before
/// the all-clear win condition (`board_size - 1` revealed) can fire.
pub const MIN_BOARD_SIZE: usize = 2;

/// Per-room settings, fixed at creation (the host may override the
/// board size once more when starting, while the room is still
/// waiting).
#[derive(Debug, Clone)]
pub struct RoomOptions {
    /// Total number of squares on the board.
    pub board_size: usize,

    /// Maximum players allowed in the room.
    pub max_players: usize,

    /// Which rule set this room plays.
    pub mode: GameMode,
}

impl RoomOptions {
    /// Builds options from a `createRoom` payload, applying the
    /// capacity default.
    pub fn new(
        board_size: usize,
        max_players: Option<usize>,
        mode: GameMode,
    ) -> Self {
        Self {
            board_size,
            max_players: max_players.unwrap_or(DEFAULT_MAX_PLAYERS),
            mode,
        }
    }

    /// Rejects boards too small to play and capacities that cannot
    /// even hold the creator.
    pub fn validate(&self) -> Result<(), RoomError> {
        if self.board_size < MIN_BOARD_SIZE {
            return Err(RoomError::InvalidBoardSize(self.board_size));
        }
        if self.max_players == 0 {
            return Err(RoomError::InvalidPlayerCap(self.max_players));
        }
        Ok(())
    }
}

impl Default for RoomOptions {
    fn default() -> Self {
        Self {
            board_size: 9,
            max_players: DEFAULT_MAX_PLAYERS,
            mode: GameMode::Classic,
        }
    }
}

// ---------------------------------------------------------------------------
// RoomPhase
// ---------------------------------------------------------------------------

/// The lifecycle phase of a room.
///
/// ```text
/// Waiting → Choosing → Playing → Finished
///    ↑         (classic only)       │
///    └──────────── restart ─────────┘
/// ```
///
/// - **Waiting**: room exists, roster is open, game not started.
/// - **Choosing**: classic mode only — the game has started and the
///   host is picking the danger square. Elimination mode skips this
///   phase (the server draws the square at start).
/// - **Playing**: squares may be revealed.
/// - **Finished**: the round ended; only `restartGame` moves the room
///   back to `Waiting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomPhase {
    Waiting,
    Choosing,
    Playing,
    Finished,
}

impl RoomPhase {
    /// Returns `true` if the room is accepting new players.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Waiting)
    }

    /// Returns `true` if a round is underway (started but not ended).
    pub fn in_round(&self) -> bool {
        matches!(self, Self::Choosing | Self::Playing)
    }
}

impl std::fmt::Display for RoomPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Choosing => write!(f, "choosing"),
            Self::Playing => write!(f, "playing"),
            Self::Finished => write!(f, "finished"),
        }
    }
}

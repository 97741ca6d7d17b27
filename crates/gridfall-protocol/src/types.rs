//! Core protocol types for Gridfall's wire format.
//!
//! Everything a client and the server exchange is one of two tagged
//! unions: [`ClientAction`] (inbound) or [`ServerEvent`] (outbound).
//! Both are internally tagged with camelCase tags and fields, so a
//! create request travels as
//! `{"type":"createRoom","boardSize":9,"playerName":"Alice"}` and every
//! event a client receives carries the full fields it needs to
//! re-render — there is no partial-diff contract.

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for one connected player.
///
/// Assigned by the transport layer when the connection is accepted and
/// never reused for the lifetime of the process. There is no account or
/// login behind it — the id dies with the connection.
///
/// `#[serde(transparent)]` keeps the wire form a plain number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A short human-shareable room code, e.g. `"K3QX7B"`.
///
/// Unique among live rooms; generated by the room store. Serialized as a
/// plain string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Game mode
// ---------------------------------------------------------------------------

/// Which rule set a room plays, fixed at creation.
///
/// - `Classic`: the host picks the danger square after `startGame`
///   (the room passes through a choosing phase); clicking is
///   free-for-all; the first player to reveal the danger square loses
///   and the round ends.
/// - `Elimination`: the server draws the danger square at random when
///   the game starts; play is turn-based; revealing the danger square
///   eliminates you from the rotation, and the last player standing
///   wins with a full final ranking.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "camelCase")]
pub enum GameMode {
    #[default]
    Classic,
    Elimination,
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Classic => write!(f, "classic"),
            Self::Elimination => write!(f, "elimination"),
        }
    }
}

// ---------------------------------------------------------------------------
// Roster entries
// ---------------------------------------------------------------------------

/// One player in a roster or ranking broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerEntry {
    pub id: PlayerId,
    pub name: String,
}

// ---------------------------------------------------------------------------
// Recipient — who should receive an event?
// ---------------------------------------------------------------------------

/// Routing metadata attached to each emitted [`ServerEvent`].
///
/// The room state machine returns `(Recipient, ServerEvent)` pairs and
/// the router fans them out; the recipient itself never crosses the
/// wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// Every player currently in the room.
    All,
    /// One specific player.
    Player(PlayerId),
    /// Everyone in the room except the given player.
    AllExcept(PlayerId),
}

// ---------------------------------------------------------------------------
// ClientAction — inbound
// ---------------------------------------------------------------------------

/// An action sent by a client.
///
/// `#[serde(tag = "type")]` produces internally tagged JSON, and the
/// camelCase renames pin the wire names the original clients use:
/// `{"type":"squareClicked","squareIndex":3}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientAction {
    /// Create a new room and become its host.
    CreateRoom {
        board_size: usize,
        #[serde(default)]
        max_players: Option<usize>,
        player_name: String,
        #[serde(default)]
        mode: GameMode,
    },

    /// Join an existing room by code.
    JoinRoom {
        room_code: RoomCode,
        player_name: String,
    },

    /// Start the game (host only). May override the board size chosen
    /// at creation.
    StartGame {
        #[serde(default)]
        board_size: Option<usize>,
    },

    /// Pick the danger square (classic mode, host only).
    SelectDangerSquare { square_index: usize },

    /// Reveal a square.
    SquareClicked { square_index: usize },

    /// Reset the room for another round (host only).
    RestartGame,

    /// Ask whether a room with this code exists. Read-only.
    CheckSession { room_code: RoomCode },

    /// Leave the current room without closing the connection.
    LeaveSession,
}

// ---------------------------------------------------------------------------
// ServerEvent — outbound
// ---------------------------------------------------------------------------

/// A notification sent by the server.
///
/// Same tagging scheme as [`ClientAction`]. Each event is authoritative
/// for the fields it carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    /// Sent once when a connection is accepted; tells the client its
    /// ephemeral handle.
    Connected { player_id: PlayerId },

    /// The room was created; sent to the creator.
    RoomCreated {
        room_code: RoomCode,
        host: PlayerId,
        board_size: usize,
        max_players: usize,
        mode: GameMode,
    },

    /// A player joined; carries the full updated roster.
    PlayerJoined {
        player_id: PlayerId,
        player_name: String,
        players: Vec<PlayerEntry>,
    },

    /// The game started. `current_player` is set in elimination mode
    /// (the first player in the rotation) and absent in classic mode,
    /// where the room is now waiting for the host to pick the danger
    /// square.
    GameStarted {
        board_size: usize,
        mode: GameMode,
        current_player: Option<PlayerId>,
    },

    /// The host picked the danger square (classic mode); play begins.
    DangerSquareSelected {
        danger_square: usize,
        board_size: usize,
    },

    /// A safe square was revealed. `next_player` is set in elimination
    /// mode.
    SquareClicked {
        player_id: PlayerId,
        player_name: String,
        square_index: usize,
        clicked_count: usize,
        next_player: Option<PlayerId>,
    },

    /// A player hit the danger square in elimination mode and left the
    /// rotation; the round continues with `next_player`.
    PlayerEliminated {
        player_id: PlayerId,
        player_name: String,
        order: usize,
        square_index: usize,
        next_player: PlayerId,
    },

    /// The round ended with a winner: either every safe square was
    /// cleared, or (elimination mode) a sole survivor remains.
    /// `ranking` is the final standing in elimination mode — survivor
    /// first, then the eliminated most recent first — and empty in
    /// classic mode.
    GameWon {
        winner: PlayerId,
        winner_name: String,
        clicked_squares: Vec<usize>,
        ranking: Vec<PlayerEntry>,
    },

    /// The round ended with a loser who revealed the danger square.
    GameOver {
        loser: PlayerId,
        loser_name: String,
        clicked_squares: Vec<usize>,
    },

    /// The host reset the room back to the waiting phase.
    GameRestarted,

    /// The previous host left; a new one was promoted.
    NewHost {
        host_id: PlayerId,
        host_name: String,
    },

    /// A player left or disconnected; carries the remaining roster and,
    /// mid-round in elimination mode, whose turn it now is.
    PlayerLeft {
        player_id: PlayerId,
        players: Vec<PlayerEntry>,
        current_player: Option<PlayerId>,
    },

    /// Reply to `checkSession`; sent to the asker only.
    SessionStatus {
        room_code: RoomCode,
        exists: bool,
        joinable: bool,
    },

    /// A rule violation by the receiving client.
    Error { message: String },
}

// =========================================================================
// Tests
// =========================================================================

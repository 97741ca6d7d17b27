//! The per-room game state machine.
//!
//! Every operation runs synchronously against `&mut Room` and returns
//! the events to broadcast as `(Recipient, ServerEvent)` pairs, so the
//! whole machine is testable by feeding it actions and asserting on
//! what it emits. The router owns fan-out; nothing here touches a
//! socket.

use std::collections::{HashMap, HashSet};

use gridfall_protocol::{
    GameMode, PlayerEntry, PlayerId, Recipient, RoomCode, ServerEvent,
};
use rand::Rng;

use crate::{RoomError, RoomOptions, RoomPhase, MIN_BOARD_SIZE};

/// Events emitted by a successful state-machine transition.
pub type RoomEvents = Vec<(Recipient, ServerEvent)>;

/// One elimination during a play-through: who, in what order, on which
/// square. Append-only until restart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Elimination {
    pub player: PlayerId,
    pub name: String,
    /// 1-based: the first player out has order 1.
    pub order: usize,
    pub square: usize,
}

/// A single game instance.
///
/// Invariants maintained across all operations:
/// - `danger_square`, once set for a play-through, does not change
///   until restart.
/// - `clicked_squares.len() <= board_size - 1`; reaching the bound is
///   the all-clear win and finishes the room.
/// - `active_players ⊆ players`; during `Playing` in elimination mode,
///   `eliminated.len() + active_players.len() == players.len()`.
/// - `host ∈ players` whenever `players` is non-empty.
#[derive(Debug)]
pub struct Room {
    code: RoomCode,
    host: PlayerId,
    options: RoomOptions,
    phase: RoomPhase,
    players: Vec<PlayerId>,
    names: HashMap<PlayerId, String>,
    active_players: Vec<PlayerId>,
    danger_square: Option<usize>,
    clicked_squares: HashSet<usize>,
    eliminated: Vec<Elimination>,
    current_turn: usize,
}

impl Room {
    /// Creates a room in `Waiting` with the creator as sole player and
    /// host. Options must already be validated (the store does this).
    pub(crate) fn new(
        code: RoomCode,
        host: PlayerId,
        host_name: String,
        options: RoomOptions,
    ) -> Self {
        let mut names = HashMap::new();
        names.insert(host, host_name);
        Self {
            code,
            host,
            options,
            phase: RoomPhase::Waiting,
            players: vec![host],
            names,
            active_players: vec![host],
            danger_square: None,
            clicked_squares: HashSet::new(),
            eliminated: Vec::new(),
            current_turn: 0,
        }
    }

    /// The `roomCreated` broadcast for a freshly created room.
    pub fn creation_events(&self) -> RoomEvents {
        vec![(
            Recipient::All,
            ServerEvent::RoomCreated {
                room_code: self.code.clone(),
                host: self.host,
                board_size: self.options.board_size,
                max_players: self.options.max_players,
                mode: self.options.mode,
            },
        )]
    }

    // -----------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------

    /// Adds a player to the roster. Valid only while `Waiting`.
    pub fn join(
        &mut self,
        player: PlayerId,
        name: String,
    ) -> Result<RoomEvents, RoomError> {
        if !self.phase.is_joinable() {
            return Err(RoomError::GameAlreadyStarted(self.code.clone()));
        }
        if self.players.contains(&player) {
            return Err(RoomError::AlreadyInRoom(player, self.code.clone()));
        }
        if self.players.len() >= self.options.max_players {
            return Err(RoomError::RoomFull(self.code.clone()));
        }

        self.players.push(player);
        self.active_players.push(player);
        self.names.insert(player, name.clone());
        tracing::info!(
            room = %self.code,
            %player,
            players = self.players.len(),
            "player joined"
        );

        Ok(vec![(
            Recipient::All,
            ServerEvent::PlayerJoined {
                player_id: player,
                player_name: name,
                players: self.roster(),
            },
        )])
    }

    /// Starts the game. Host-only, `Waiting` only.
    ///
    /// Classic mode moves to `Choosing` and waits for the host to pick
    /// the danger square; elimination mode draws it at random, resets
    /// the rotation, and goes straight to `Playing`.
    pub fn start(
        &mut self,
        actor: PlayerId,
        board_size_override: Option<usize>,
    ) -> Result<RoomEvents, RoomError> {
        if actor != self.host {
            return Err(RoomError::NotHost(actor));
        }
        if self.phase != RoomPhase::Waiting {
            return Err(RoomError::WrongPhase {
                action: "start the game",
                phase: self.phase,
            });
        }
        if let Some(size) = board_size_override {
            if size < MIN_BOARD_SIZE {
                return Err(RoomError::InvalidBoardSize(size));
            }
            self.options.board_size = size;
        }

        let current_player = match self.options.mode {
            GameMode::Classic => {
                self.phase = RoomPhase::Choosing;
                None
            }
            GameMode::Elimination => {
                let square =
                    rand::rng().random_range(0..self.options.board_size);
                self.danger_square = Some(square);
                self.active_players = self.players.clone();
                self.current_turn = 0;
                self.phase = RoomPhase::Playing;
                Some(self.active_players[0])
            }
        };

        tracing::info!(
            room = %self.code,
            mode = %self.options.mode,
            board_size = self.options.board_size,
            "game started"
        );

        Ok(vec![(
            Recipient::All,
            ServerEvent::GameStarted {
                board_size: self.options.board_size,
                mode: self.options.mode,
                current_player,
            },
        )])
    }

    /// Sets the danger square. Host-only, `Choosing` only (classic
    /// mode — elimination never enters `Choosing`).
    pub fn select_danger_square(
        &mut self,
        actor: PlayerId,
        index: usize,
    ) -> Result<RoomEvents, RoomError> {
        if actor != self.host {
            return Err(RoomError::NotHost(actor));
        }
        if self.phase != RoomPhase::Choosing {
            return Err(RoomError::WrongPhase {
                action: "select the danger square",
                phase: self.phase,
            });
        }
        if index >= self.options.board_size {
            return Err(RoomError::InvalidSquare {
                index,
                board_size: self.options.board_size,
            });
        }

        self.danger_square = Some(index);
        self.phase = RoomPhase::Playing;
        tracing::info!(room = %self.code, "danger square selected, playing");

        Ok(vec![(
            Recipient::All,
            ServerEvent::DangerSquareSelected {
                danger_square: index,
                board_size: self.options.board_size,
            },
        )])
    }

    /// Reveals a square. Valid only while `Playing`; in elimination
    /// mode only the player whose turn it is may reveal.
    pub fn reveal(
        &mut self,
        actor: PlayerId,
        index: usize,
    ) -> Result<RoomEvents, RoomError> {
        if self.phase != RoomPhase::Playing {
            return Err(RoomError::WrongPhase {
                action: "reveal a square",
                phase: self.phase,
            });
        }
        if index >= self.options.board_size {
            return Err(RoomError::InvalidSquare {
                index,
                board_size: self.options.board_size,
            });
        }
        if self.options.mode == GameMode::Elimination
            && self.active_players.get(self.current_turn) != Some(&actor)
        {
            return Err(RoomError::NotYourTurn(actor));
        }

        if self.danger_square == Some(index) {
            Ok(self.reveal_danger(actor, index))
        } else {
            Ok(self.reveal_safe(actor, index))
        }
    }

    fn reveal_danger(&mut self, actor: PlayerId, index: usize) -> RoomEvents {
        match self.options.mode {
            GameMode::Classic => {
                self.phase = RoomPhase::Finished;
                tracing::info!(room = %self.code, loser = %actor, "danger square hit");
                vec![(
                    Recipient::All,
                    ServerEvent::GameOver {
                        loser: actor,
                        loser_name: self.name_of(actor),
                        clicked_squares: self.clicked_list(),
                    },
                )]
            }
            GameMode::Elimination => {
                // The turn check guarantees the actor is in the
                // rotation at `current_turn`.
                self.active_players.retain(|p| *p != actor);
                let order = self.eliminated.len() + 1;
                self.eliminated.push(Elimination {
                    player: actor,
                    name: self.name_of(actor),
                    order,
                    square: index,
                });
                tracing::info!(
                    room = %self.code,
                    %actor,
                    order,
                    remaining = self.active_players.len(),
                    "player eliminated"
                );

                match self.active_players.len() {
                    1 => {
                        self.phase = RoomPhase::Finished;
                        let winner = self.active_players[0];
                        vec![(
                            Recipient::All,
                            ServerEvent::GameWon {
                                winner,
                                winner_name: self.name_of(winner),
                                clicked_squares: self.clicked_list(),
                                ranking: self.final_ranking(winner),
                            },
                        )]
                    }
                    // A one-player round eliminating its only player.
                    // Unreachable under turn enforcement with two or
                    // more players, but handled rather than assumed.
                    0 => {
                        self.phase = RoomPhase::Finished;
                        vec![(
                            Recipient::All,
                            ServerEvent::GameOver {
                                loser: actor,
                                loser_name: self.name_of(actor),
                                clicked_squares: self.clicked_list(),
                            },
                        )]
                    }
                    remaining => {
                        // Removal already shifted the rotation so
                        // `current_turn` points at the next player;
                        // wrap if the eliminated player was last.
                        self.current_turn %= remaining;
                        vec![(
                            Recipient::All,
                            ServerEvent::PlayerEliminated {
                                player_id: actor,
                                player_name: self.name_of(actor),
                                order,
                                square_index: index,
                                next_player: self.active_players
                                    [self.current_turn],
                            },
                        )]
                    }
                }
            }
        }
    }

    fn reveal_safe(&mut self, actor: PlayerId, index: usize) -> RoomEvents {
        // Re-revealing an already-clicked safe square is an idempotent
        // no-op.
        if !self.clicked_squares.insert(index) {
            return Vec::new();
        }

        if self.clicked_squares.len() == self.options.board_size - 1 {
            // Every safe square revealed: the revealer wins.
            self.phase = RoomPhase::Finished;
            tracing::info!(room = %self.code, winner = %actor, "board cleared");
            return vec![(
                Recipient::All,
                ServerEvent::GameWon {
                    winner: actor,
                    winner_name: self.name_of(actor),
                    clicked_squares: self.clicked_list(),
                    ranking: Vec::new(),
                },
            )];
        }

        let next_player = match self.options.mode {
            GameMode::Classic => None,
            GameMode::Elimination => {
                self.current_turn =
                    (self.current_turn + 1) % self.active_players.len();
                Some(self.active_players[self.current_turn])
            }
        };

        vec![(
            Recipient::All,
            ServerEvent::SquareClicked {
                player_id: actor,
                player_name: self.name_of(actor),
                square_index: index,
                clicked_count: self.clicked_squares.len(),
                next_player,
            },
        )]
    }

    /// Resets the room for another round. Host-only; tolerated from
    /// any phase.
    pub fn restart(&mut self, actor: PlayerId) -> Result<RoomEvents, RoomError> {
        if actor != self.host {
            return Err(RoomError::NotHost(actor));
        }

        self.danger_square = None;
        self.clicked_squares.clear();
        self.eliminated.clear();
        self.active_players = self.players.clone();
        self.current_turn = 0;
        self.phase = RoomPhase::Waiting;
        tracing::info!(room = %self.code, "room restarted");

        Ok(vec![(Recipient::All, ServerEvent::GameRestarted)])
    }

    /// Removes a player (leave or disconnect). Infallible: removing an
    /// unknown player emits nothing.
    ///
    /// Mid-round departure is a plain removal, not an elimination — it
    /// consumes no ranking slot and triggers no win, even if the
    /// rotation shrinks to one. The caller deletes the room when this
    /// leaves it empty; an empty room broadcasts nothing.
    pub fn remove_player(&mut self, player: PlayerId) -> RoomEvents {
        let Some(pos) = self.players.iter().position(|p| *p == player)
        else {
            return Vec::new();
        };
        self.players.remove(pos);
        self.names.remove(&player);

        if let Some(active_pos) =
            self.active_players.iter().position(|p| *p == player)
        {
            self.active_players.remove(active_pos);
            // Keep `current_turn` on the same player it pointed at, or
            // on the departing player's successor.
            if active_pos < self.current_turn {
                self.current_turn -= 1;
            }
            if self.active_players.is_empty() {
                self.current_turn = 0;
            } else {
                self.current_turn %= self.active_players.len();
            }
        }

        tracing::info!(
            room = %self.code,
            %player,
            players = self.players.len(),
            "player left"
        );

        if self.players.is_empty() {
            return Vec::new();
        }

        let mut events = Vec::new();
        if player == self.host {
            // Host reassignment: next player in join order.
            self.host = self.players[0];
            events.push((
                Recipient::All,
                ServerEvent::NewHost {
                    host_id: self.host,
                    host_name: self.name_of(self.host),
                },
            ));
            tracing::info!(room = %self.code, host = %self.host, "new host");
        }

        events.push((
            Recipient::All,
            ServerEvent::PlayerLeft {
                player_id: player,
                players: self.roster(),
                current_player: self.current_player(),
            },
        ));
        events
    }

    // -----------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------

    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    pub fn host(&self) -> PlayerId {
        self.host
    }

    pub fn phase(&self) -> RoomPhase {
        self.phase
    }

    pub fn mode(&self) -> GameMode {
        self.options.mode
    }

    pub fn board_size(&self) -> usize {
        self.options.board_size
    }

    pub fn max_players(&self) -> usize {
        self.options.max_players
    }

    /// Players in join order.
    pub fn players(&self) -> &[PlayerId] {
        &self.players
    }

    /// Players still in the turn rotation.
    pub fn active_players(&self) -> &[PlayerId] {
        &self.active_players
    }

    pub fn danger_square(&self) -> Option<usize> {
        self.danger_square
    }

    pub fn clicked_count(&self) -> usize {
        self.clicked_squares.len()
    }

    pub fn is_clicked(&self, index: usize) -> bool {
        self.clicked_squares.contains(&index)
    }

    /// Elimination records for the current play-through, in order.
    pub fn eliminated(&self) -> &[Elimination] {
        &self.eliminated
    }

    /// Whose turn it is, while a turn-based round is in progress.
    pub fn current_player(&self) -> Option<PlayerId> {
        if self.phase == RoomPhase::Playing
            && self.options.mode == GameMode::Elimination
        {
            self.active_players.get(self.current_turn).copied()
        } else {
            None
        }
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Whether a join attempt right now would be accepted.
    pub fn is_joinable(&self) -> bool {
        self.phase.is_joinable()
            && self.players.len() < self.options.max_players
    }

    // -----------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------

    fn name_of(&self, player: PlayerId) -> String {
        self.names.get(&player).cloned().unwrap_or_default()
    }

    fn roster(&self) -> Vec<PlayerEntry> {
        self.players
            .iter()
            .map(|p| PlayerEntry { id: *p, name: self.name_of(*p) })
            .collect()
    }

    /// Clicked squares as a sorted list for broadcasting.
    fn clicked_list(&self) -> Vec<usize> {
        let mut squares: Vec<usize> =
            self.clicked_squares.iter().copied().collect();
        squares.sort_unstable();
        squares
    }

    /// Final standing: survivor first, then the eliminated most recent
    /// first.
    fn final_ranking(&self, winner: PlayerId) -> Vec<PlayerEntry> {
        let mut ranking =
            vec![PlayerEntry { id: winner, name: self.name_of(winner) }];
        ranking.extend(self.eliminated.iter().rev().map(|e| PlayerEntry {
            id: e.player,
            name: e.name.clone(),
        }));
        ranking
    }
}

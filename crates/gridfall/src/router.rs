//! The event router: an actor task that owns all mutable game state.
//!
//! Connection handlers never touch the room map or the registry
//! directly — they send [`RouterCommand`]s through a channel, and the
//! router processes them one at a time to completion. That single loop
//! is what makes every state-machine transition atomic and
//! non-preemptible relative to all others, with no locks anywhere.
//!
//! The router itself contains no game logic: it resolves the actor's
//! room, invokes the matching [`Room`] operation, and fans the emitted
//! events out to the room's members.

use std::collections::HashMap;

use gridfall_protocol::{
    ClientAction, GameMode, PlayerId, Recipient, RoomCode, ServerEvent,
};
use gridfall_room::{Room, RoomError, RoomEvents, RoomOptions, RoomStore};
use gridfall_session::ConnectionRegistry;
use tokio::sync::mpsc;

use crate::GridfallError;

/// Channel sender for delivering events to one connection's writer.
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

/// Commands sent to the router through its channel.
pub(crate) enum RouterCommand {
    /// A connection was accepted; attach its outbound sender.
    Connect {
        player: PlayerId,
        sender: EventSender,
    },

    /// A decoded action from a connected client.
    Action {
        player: PlayerId,
        action: ClientAction,
    },

    /// The connection is gone; detach and clean up its room.
    Disconnect { player: PlayerId },
}

/// Handle to the running router task. Cheap to clone — one per
/// connection handler.
#[derive(Clone)]
pub struct RouterHandle {
    sender: mpsc::Sender<RouterCommand>,
}

impl RouterHandle {
    /// Attaches a new connection and its outbound event channel.
    pub async fn connect(
        &self,
        player: PlayerId,
        sender: EventSender,
    ) -> Result<(), GridfallError> {
        self.sender
            .send(RouterCommand::Connect { player, sender })
            .await
            .map_err(|_| GridfallError::RouterClosed)
    }

    /// Forwards a client action for processing.
    pub async fn action(
        &self,
        player: PlayerId,
        action: ClientAction,
    ) -> Result<(), GridfallError> {
        self.sender
            .send(RouterCommand::Action { player, action })
            .await
            .map_err(|_| GridfallError::RouterClosed)
    }

    /// Reports a closed connection.
    pub async fn disconnect(
        &self,
        player: PlayerId,
    ) -> Result<(), GridfallError> {
        self.sender
            .send(RouterCommand::Disconnect { player })
            .await
            .map_err(|_| GridfallError::RouterClosed)
    }
}

/// The router actor state. Runs inside a single Tokio task.
struct Router {
    store: RoomStore,
    registry: ConnectionRegistry,
    /// Per-connection outbound channels.
    senders: HashMap<PlayerId, EventSender>,
    receiver: mpsc::Receiver<RouterCommand>,
}

impl Router {
    /// Runs the actor loop, processing commands until every handle is
    /// dropped.
    async fn run(mut self) {
        tracing::info!("event router started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RouterCommand::Connect { player, sender } => {
                    self.handle_connect(player, sender);
                }
                RouterCommand::Action { player, action } => {
                    self.handle_action(player, action);
                }
                RouterCommand::Disconnect { player } => {
                    self.handle_disconnect(player);
                }
            }
        }

        tracing::info!("event router stopped");
    }

    fn handle_connect(&mut self, player: PlayerId, sender: EventSender) {
        self.senders.insert(player, sender);
        self.send_to(player, ServerEvent::Connected { player_id: player });
        tracing::debug!(%player, connections = self.senders.len(), "connection attached");
    }

    fn handle_disconnect(&mut self, player: PlayerId) {
        self.senders.remove(&player);
        self.depart(player);
        tracing::debug!(%player, connections = self.senders.len(), "connection detached");
    }

    fn handle_action(&mut self, player: PlayerId, action: ClientAction) {
        match action {
            ClientAction::CreateRoom {
                board_size,
                max_players,
                player_name,
                mode,
            } => self.handle_create(
                player,
                board_size,
                max_players,
                player_name,
                mode,
            ),

            ClientAction::JoinRoom { room_code, player_name } => {
                self.handle_join(player, room_code, player_name);
            }

            ClientAction::StartGame { board_size } => {
                self.with_room(player, |room| room.start(player, board_size));
            }

            ClientAction::SelectDangerSquare { square_index } => {
                self.with_room(player, |room| {
                    room.select_danger_square(player, square_index)
                });
            }

            ClientAction::SquareClicked { square_index } => {
                self.with_room(player, |room| {
                    room.reveal(player, square_index)
                });
            }

            ClientAction::RestartGame => {
                self.with_room(player, |room| room.restart(player));
            }

            ClientAction::CheckSession { room_code } => {
                self.handle_check(player, room_code);
            }

            ClientAction::LeaveSession => self.depart(player),
        }
    }

    fn handle_create(
        &mut self,
        player: PlayerId,
        board_size: usize,
        max_players: Option<usize>,
        name: String,
        mode: GameMode,
    ) {
        // One room at a time.
        if let Some(current) =
            self.registry.lookup(&player).map(|r| r.room.clone())
        {
            self.reject(player, RoomError::AlreadyInRoom(player, current));
            return;
        }

        let options = RoomOptions::new(board_size, max_players, mode);
        match self.store.create(player, name.clone(), options) {
            Ok(code) => {
                self.registry.register(player, code.clone(), name);
                if let Some(room) = self.store.get(&code) {
                    let events = room.creation_events();
                    let members = room.players().to_vec();
                    self.dispatch(&members, events);
                }
            }
            Err(err) => self.reject(player, err),
        }
    }

    fn handle_join(
        &mut self,
        player: PlayerId,
        code: RoomCode,
        name: String,
    ) {
        if let Some(current) =
            self.registry.lookup(&player).map(|r| r.room.clone())
        {
            self.reject(player, RoomError::AlreadyInRoom(player, current));
            return;
        }

        let Some(room) = self.store.get_mut(&code) else {
            self.reject(player, RoomError::RoomNotFound(code));
            return;
        };

        match room.join(player, name.clone()) {
            Ok(events) => {
                let members = room.players().to_vec();
                self.registry.register(player, code, name);
                self.dispatch(&members, events);
            }
            Err(err) => self.reject(player, err),
        }
    }

    /// Resolves the actor's room via the registry and runs one
    /// state-machine operation against it.
    ///
    /// An action from a connection with no registered room is a silent
    /// no-op.
    fn with_room(
        &mut self,
        player: PlayerId,
        op: impl FnOnce(&mut Room) -> Result<RoomEvents, RoomError>,
    ) {
        let Some(code) =
            self.registry.lookup(&player).map(|r| r.room.clone())
        else {
            tracing::debug!(%player, "action from connection with no room, ignoring");
            return;
        };

        let Some(room) = self.store.get_mut(&code) else {
            // Stale registration; should not happen, but never panic
            // over it.
            tracing::warn!(%player, %code, "registered room missing, dropping registration");
            self.registry.unregister(&player);
            return;
        };

        // None of the routed operations change the roster, so the
        // fan-out list can be taken up front.
        let members = room.players().to_vec();
        match op(room) {
            Ok(events) => self.dispatch(&members, events),
            Err(err) => self.reject(player, err),
        }
    }

    /// Read-only existence query; replies to the asker only.
    fn handle_check(&mut self, player: PlayerId, code: RoomCode) {
        let (exists, joinable) = match self.store.get(&code) {
            Some(room) => (true, room.is_joinable()),
            None => (false, false),
        };
        self.send_to(
            player,
            ServerEvent::SessionStatus { room_code: code, exists, joinable },
        );
    }

    /// Removes a player from their room (explicit leave or
    /// disconnect), deleting the room if it empties.
    fn depart(&mut self, player: PlayerId) {
        let Some(registration) = self.registry.unregister(&player) else {
            return;
        };
        let Some(room) = self.store.get_mut(&registration.room) else {
            return;
        };

        let events = room.remove_player(player);
        if room.is_empty() {
            // Last player out: delete, and there is nobody left to
            // broadcast to.
            self.store.remove(&registration.room);
            return;
        }

        let members = room.players().to_vec();
        self.dispatch(&members, events);
    }

    /// Routes a typed rejection: silent variants are logged and
    /// dropped, the rest become an `error` event for the actor only.
    fn reject(&self, player: PlayerId, err: RoomError) {
        if err.is_silent() {
            tracing::debug!(%player, error = %err, "action ignored");
            return;
        }
        tracing::debug!(%player, error = %err, "action rejected");
        self.send_to(player, ServerEvent::Error { message: err.to_string() });
    }

    /// Fans emitted events out to the room's members.
    fn dispatch(&self, members: &[PlayerId], events: RoomEvents) {
        for (recipient, event) in events {
            match recipient {
                Recipient::All => {
                    for player in members {
                        self.send_to(*player, event.clone());
                    }
                }
                Recipient::Player(player) => {
                    self.send_to(player, event);
                }
                Recipient::AllExcept(excluded) => {
                    for player in members {
                        if *player != excluded {
                            self.send_to(*player, event.clone());
                        }
                    }
                }
            }
        }
    }

    /// Sends one event to one connection. Silently drops if the writer
    /// is gone (connection already closed).
    fn send_to(&self, player: PlayerId, event: ServerEvent) {
        if let Some(sender) = self.senders.get(&player) {
            let _ = sender.send(event);
        }
    }
}

/// Spawns the router task and returns a handle to communicate with it.
///
/// `channel_size` bounds the inbound command queue — if clients flood
/// the server, their handlers wait rather than growing memory.
pub fn spawn_router(channel_size: usize) -> RouterHandle {
    let (tx, rx) = mpsc::channel(channel_size);

    let router = Router {
        store: RoomStore::new(),
        registry: ConnectionRegistry::new(),
        senders: HashMap::new(),
        receiver: rx,
    };

    tokio::spawn(router.run());

    RouterHandle { sender: tx }
}

//! Lobby actor: an isolated Tokio task that owns one [`Lobby`].
//!
//! Commands arrive over an mpsc channel and timers fire from a
//! [`Deadlines`] set, both served by a single `tokio::select!` loop. Each
//! command or timer runs to completion before the next one is looked at,
//! so the lobby state needs no lock.

use std::collections::HashMap;

use basta_game::{Departure, Effect, Lobby, Outbox, Timer};
use basta_protocol::{ClientMessage, Lifecycle, LobbyId, PlayerId, Recipient, ServerMessage};
use basta_timer::Deadlines;
use tokio::sync::{mpsc, oneshot};

use crate::LobbyError;

/// Channel sender for delivering outbound messages to a player.
pub type PlayerSender = mpsc::UnboundedSender<ServerMessage>;

/// Commands sent to a lobby actor through its channel.
///
/// Variants carrying a `oneshot::Sender` expect a reply; the rest are
/// fire-and-forget.
pub(crate) enum LobbyCommand {
    /// Seat a player and register their outbound channel.
    Join {
        player_id: PlayerId,
        name: String,
        sender: PlayerSender,
        reply: oneshot::Sender<Result<(), LobbyError>>,
    },

    /// Remove a player. Replies with the number of players left.
    Depart {
        player_id: PlayerId,
        departure: Departure,
        reply: oneshot::Sender<Result<usize, LobbyError>>,
    },

    /// Apply an in-lobby action. Rejections go back to the player as
    /// `ServerMessage::Error`.
    Action {
        player_id: PlayerId,
        msg: ClientMessage,
    },

    /// Request a metadata snapshot.
    GetInfo { reply: oneshot::Sender<LobbyInfo> },

    /// Stop the actor, dropping every pending timer.
    Shutdown,
}

/// A snapshot of lobby metadata (not the game state itself).
#[derive(Debug, Clone)]
pub struct LobbyInfo {
    pub lobby_id: LobbyId,
    pub lifecycle: Lifecycle,
    pub player_count: usize,
    pub max_players: usize,
}

impl LobbyInfo {
    /// Whether a new player may be seated here.
    pub fn is_joinable(&self) -> bool {
        self.lifecycle == Lifecycle::Waiting && self.player_count < self.max_players
    }
}

// ---------------------------------------------------------------------------
// LobbyHandle
// ---------------------------------------------------------------------------

/// Handle to a running lobby actor.
///
/// Cheap to clone. The registry holds one per lobby and connection
/// handlers keep a copy so in-game actions skip the registry entirely.
#[derive(Debug, Clone)]
pub struct LobbyHandle {
    lobby_id: LobbyId,
    sender: mpsc::Sender<LobbyCommand>,
}

impl LobbyHandle {
    pub fn lobby_id(&self) -> LobbyId {
        self.lobby_id
    }

    /// Whether the actor has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Seats a player.
    pub async fn join(
        &self,
        player_id: PlayerId,
        name: &str,
        sender: PlayerSender,
    ) -> Result<(), LobbyError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(LobbyCommand::Join {
            player_id,
            name: name.to_string(),
            sender,
            reply: reply_tx,
        })
        .await?;
        reply_rx
            .await
            .map_err(|_| LobbyError::Unavailable(self.lobby_id))?
    }

    /// Removes a player and returns how many remain.
    pub async fn depart(
        &self,
        player_id: PlayerId,
        departure: Departure,
    ) -> Result<usize, LobbyError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(LobbyCommand::Depart {
            player_id,
            departure,
            reply: reply_tx,
        })
        .await?;
        reply_rx
            .await
            .map_err(|_| LobbyError::Unavailable(self.lobby_id))?
    }

    /// Forwards an action (fire-and-forget).
    pub async fn send_action(
        &self,
        player_id: PlayerId,
        msg: ClientMessage,
    ) -> Result<(), LobbyError> {
        self.send(LobbyCommand::Action { player_id, msg }).await
    }

    pub async fn get_info(&self) -> Result<LobbyInfo, LobbyError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(LobbyCommand::GetInfo { reply: reply_tx }).await?;
        reply_rx
            .await
            .map_err(|_| LobbyError::Unavailable(self.lobby_id))
    }

    pub async fn shutdown(&self) -> Result<(), LobbyError> {
        self.send(LobbyCommand::Shutdown).await
    }

    async fn send(&self, cmd: LobbyCommand) -> Result<(), LobbyError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| LobbyError::Unavailable(self.lobby_id))
    }
}

// ---------------------------------------------------------------------------
// LobbyActor
// ---------------------------------------------------------------------------

/// The internal actor state. Runs inside a Tokio task.
struct LobbyActor {
    lobby: Lobby,
    /// Per-player outbound channels.
    senders: HashMap<PlayerId, PlayerSender>,
    timers: Deadlines<Timer>,
    receiver: mpsc::Receiver<LobbyCommand>,
}

impl LobbyActor {
    /// Runs the actor loop until shutdown or until every handle is gone.
    async fn run(mut self) {
        let lobby_id = self.lobby.id();
        tracing::info!(lobby = %lobby_id, "lobby actor started");

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => {
                    let Some(cmd) = cmd else { break };
                    match cmd {
                        LobbyCommand::Join { player_id, name, sender, reply } => {
                            let result = self.handle_join(player_id, &name, sender);
                            let _ = reply.send(result);
                        }
                        LobbyCommand::Depart { player_id, departure, reply } => {
                            let result = self.handle_depart(player_id, departure);
                            let _ = reply.send(result);
                        }
                        LobbyCommand::Action { player_id, msg } => {
                            self.handle_action(player_id, msg);
                        }
                        LobbyCommand::GetInfo { reply } => {
                            let _ = reply.send(self.info());
                        }
                        LobbyCommand::Shutdown => {
                            tracing::info!(lobby = %lobby_id, "lobby shutting down");
                            break;
                        }
                    }
                }
                timer = self.timers.next_expired() => {
                    self.handle_timer(timer);
                }
            }
        }

        self.timers.clear();
        tracing::info!(lobby = %lobby_id, "lobby actor stopped");
    }

    fn handle_join(
        &mut self,
        player_id: PlayerId,
        name: &str,
        sender: PlayerSender,
    ) -> Result<(), LobbyError> {
        let out = self.lobby.join(player_id, name)?;
        // Register first so the joiner receives the roster too.
        self.senders.insert(player_id, sender);
        self.apply(out);
        Ok(())
    }

    fn handle_depart(
        &mut self,
        player_id: PlayerId,
        departure: Departure,
    ) -> Result<usize, LobbyError> {
        let out = self.lobby.remove_player(player_id, departure)?;
        // The leaver may still be addressed directly (ReturnedToLobby).
        self.apply(out);
        self.senders.remove(&player_id);
        Ok(self.lobby.len())
    }

    fn handle_action(&mut self, player_id: PlayerId, msg: ClientMessage) {
        match self.lobby.handle(player_id, msg) {
            Ok(out) => self.apply(out),
            Err(err) => {
                tracing::debug!(
                    lobby = %self.lobby.id(),
                    player = %player_id,
                    error = %err,
                    "action rejected"
                );
                self.send_to(
                    player_id,
                    ServerMessage::Error {
                        code: err.code(),
                        message: err.to_string(),
                    },
                );
            }
        }
    }

    fn handle_timer(&mut self, timer: Timer) {
        tracing::trace!(lobby = %self.lobby.id(), ?timer, "timer fired");
        let out = match timer {
            Timer::CountdownTick => self.lobby.countdown_tick(),
            Timer::SpinSettle => self.lobby.settle_spin(),
            Timer::VerifyFallback(epoch) => self.lobby.verification_timeout(epoch),
        };
        self.apply(out);
    }

    /// Carries out a handler's timer effects and delivers its messages.
    fn apply(&mut self, out: Outbox) {
        for effect in out.effects {
            match effect {
                Effect::Arm(timer, after) => self.timers.arm(timer, after),
                Effect::Cancel(timer) => {
                    self.timers.cancel(timer);
                }
            }
        }
        self.dispatch(out.messages);
    }

    fn dispatch(&self, messages: Vec<(Recipient, ServerMessage)>) {
        for (recipient, msg) in messages {
            match recipient {
                Recipient::All => {
                    for pid in self.lobby.player_ids() {
                        self.send_to(pid, msg.clone());
                    }
                }
                Recipient::Player(pid) => self.send_to(pid, msg),
            }
        }
    }

    /// Sends to one player. Silently drops if the receiver is gone
    /// (the disconnect is on its way through the registry).
    fn send_to(&self, player_id: PlayerId, msg: ServerMessage) {
        if let Some(sender) = self.senders.get(&player_id) {
            let _ = sender.send(msg);
        }
    }

    fn info(&self) -> LobbyInfo {
        LobbyInfo {
            lobby_id: self.lobby.id(),
            lifecycle: self.lobby.lifecycle(),
            player_count: self.lobby.len(),
            max_players: self.lobby.config().max_players,
        }
    }
}

/// Spawns a lobby actor task and returns a handle to it.
///
/// `channel_size` controls backpressure: when the channel fills up,
/// senders wait.
pub(crate) fn spawn_lobby(lobby: Lobby, channel_size: usize) -> LobbyHandle {
    let (tx, rx) = mpsc::channel(channel_size.max(1));
    let handle = LobbyHandle {
        lobby_id: lobby.id(),
        sender: tx,
    };
    let actor = LobbyActor {
        lobby,
        senders: HashMap::new(),
        timers: Deadlines::new(),
        receiver: rx,
    };
    tokio::spawn(actor.run());
    handle
}

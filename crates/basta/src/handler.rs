//! Per-connection handler: identity, message routing, and outbound delivery.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Derive the PlayerId from the connection id → send Welcome
//!   2. Loop over three sources:
//!      - inbound frames → registry (membership) or cached lobby (actions)
//!      - lobby output → encode and write to the socket
//!      - idle deadline → close
//!   3. On exit, the guard removes the player from their lobby

use std::sync::Arc;
use std::time::Instant;

use basta_game::Departure;
use basta_lobby::{LobbyError, LobbyHandle, PlayerSender};
use basta_protocol::{ClientMessage, Codec, Envelope, PlayerId, ServerMessage};
use basta_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;

use crate::BastaError;
use crate::server::ServerState;

/// Drop guard that removes a player from their lobby when the handler
/// exits, however it exits.
///
/// `Drop` is synchronous, so the registry lock is taken in a
/// fire-and-forget task.
struct DisconnectGuard<C: Codec> {
    player_id: PlayerId,
    state: Arc<ServerState<C>>,
}

impl<C: Codec> Drop for DisconnectGuard<C> {
    fn drop(&mut self) {
        let player_id = self.player_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let mut lobbies = state.lobbies.lock().await;
            match lobbies.leave(player_id, Departure::Disconnected).await {
                Ok(lobby_id) => {
                    tracing::info!(%player_id, lobby = %lobby_id, "disconnected player removed");
                }
                Err(LobbyError::NotInLobby(_)) => {}
                Err(e) => tracing::warn!(%player_id, error = %e, "disconnect cleanup failed"),
            }
        });
    }
}

/// Writes server messages to one connection, stamping each envelope.
struct Outbound<'a, C: Codec> {
    conn: &'a WebSocketConnection,
    codec: &'a C,
    seq: u64,
    start: Instant,
}

impl<C: Codec> Outbound<'_, C> {
    async fn send(&mut self, message: ServerMessage) -> Result<(), BastaError> {
        let envelope = Envelope {
            seq: self.seq,
            timestamp: self.elapsed_ms(),
            message,
        };
        self.seq += 1;
        let bytes = self.codec.encode(&envelope)?;
        self.conn.send(&bytes).await?;
        Ok(())
    }

    async fn send_error(&mut self, code: u16, message: String) -> Result<(), BastaError> {
        self.send(ServerMessage::Error { code, message }).await
    }

    fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), BastaError> {
    let conn_id = conn.id();
    let player_id = PlayerId(conn_id.into_inner());
    tracing::info!(%conn_id, %player_id, "player connected");

    let mut out = Outbound {
        conn: &conn,
        codec: &state.codec,
        seq: 0,
        start: Instant::now(),
    };
    out.send(ServerMessage::Welcome { player_id }).await?;

    let _guard = DisconnectGuard {
        player_id,
        state: Arc::clone(&state),
    };

    // Lobby actors write here; the loop below forwards to the socket.
    let (lobby_tx, mut lobby_rx) = mpsc::unbounded_channel();
    let mut lobby: Option<LobbyHandle> = None;

    let idle_timeout = state.config.idle_timeout;
    let idle = tokio::time::sleep(idle_timeout);
    tokio::pin!(idle);

    loop {
        tokio::select! {
            frame = conn.recv() => {
                let data = match frame {
                    Ok(Some(data)) => data,
                    Ok(None) => {
                        tracing::info!(%player_id, "connection closed cleanly");
                        break;
                    }
                    Err(e) => {
                        tracing::debug!(%player_id, error = %e, "recv error");
                        break;
                    }
                };
                idle.as_mut().reset(tokio::time::Instant::now() + idle_timeout);

                let envelope: Envelope<ClientMessage> = match state.codec.decode(&data) {
                    Ok(env) => env,
                    Err(e) => {
                        tracing::debug!(%player_id, error = %e, "failed to decode envelope");
                        out.send_error(400, e.to_string()).await?;
                        continue;
                    }
                };

                handle_message(
                    &state,
                    player_id,
                    envelope.message,
                    &lobby_tx,
                    &mut lobby,
                    &mut out,
                )
                .await?;
            }
            Some(msg) = lobby_rx.recv() => {
                out.send(msg).await?;
            }
            () = &mut idle => {
                tracing::info!(%player_id, "connection timed out");
                break;
            }
        }
    }

    let _ = conn.close().await;
    // _guard drops here → lobby departure fires.
    Ok(())
}

/// Routes one decoded client message.
///
/// Membership changes go through the registry; everything else is an
/// in-lobby action sent straight to the cached lobby handle.
async fn handle_message<C: Codec>(
    state: &ServerState<C>,
    player_id: PlayerId,
    message: ClientMessage,
    lobby_tx: &PlayerSender,
    lobby: &mut Option<LobbyHandle>,
    out: &mut Outbound<'_, C>,
) -> Result<(), BastaError> {
    match message {
        ClientMessage::Heartbeat { client_time } => {
            let server_time = out.elapsed_ms();
            out.send(ServerMessage::HeartbeatAck {
                client_time,
                server_time,
            })
            .await?;
        }

        ClientMessage::Join { name } => {
            // Lock only for the join, drop before network I/O.
            let result = {
                let mut lobbies = state.lobbies.lock().await;
                lobbies.join_or_create(player_id, &name, lobby_tx.clone()).await
            };
            match result {
                Ok(handle) => {
                    tracing::info!(%player_id, lobby = %handle.lobby_id(), "player seated");
                    *lobby = Some(handle);
                }
                Err(e) => out.send_error(e.code(), e.to_string()).await?,
            }
        }

        ClientMessage::CancelJoin => {
            leave(state, player_id, Departure::Cancelled, lobby, out).await?;
        }

        ClientMessage::LeaveGame => {
            leave(state, player_id, Departure::Left, lobby, out).await?;
        }

        action => {
            let result = match lobby.as_ref() {
                Some(handle) => handle.send_action(player_id, action).await,
                None => Err(LobbyError::NotInLobby(player_id)),
            };
            if let Err(e) = result {
                out.send_error(e.code(), e.to_string()).await?;
            }
        }
    }
    Ok(())
}

async fn leave<C: Codec>(
    state: &ServerState<C>,
    player_id: PlayerId,
    departure: Departure,
    lobby: &mut Option<LobbyHandle>,
    out: &mut Outbound<'_, C>,
) -> Result<(), BastaError> {
    let result = {
        let mut lobbies = state.lobbies.lock().await;
        lobbies.leave(player_id, departure).await
    };
    *lobby = None;
    if let Err(e) = result {
        out.send_error(e.code(), e.to_string()).await?;
    }
    Ok(())
}

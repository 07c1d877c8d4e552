//! Lobby registry: creates, tracks, and routes players to lobbies.

use std::collections::{BTreeMap, HashMap};

use basta_game::{Departure, Lobby};
use basta_protocol::{ClientMessage, LobbyId, PlayerId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::actor::spawn_lobby;
use crate::{LobbyError, LobbyHandle, LobbyInfo, PlayerSender, RegistryConfig};

/// Owns every live lobby and tracks which player sits where.
///
/// A player is in at most one lobby at a time. Lobbies are created on
/// demand by [`join_or_create`](Self::join_or_create) and destroyed as soon
/// as their last player leaves.
pub struct LobbyManager {
    /// Live lobbies, oldest first.
    lobbies: BTreeMap<LobbyId, LobbyHandle>,

    /// Maps each player to the lobby they're currently in.
    player_lobbies: HashMap<PlayerId, LobbyId>,

    next_lobby_id: u64,
    config: RegistryConfig,
    rng: StdRng,
}

impl LobbyManager {
    pub fn new(config: RegistryConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            lobbies: BTreeMap::new(),
            player_lobbies: HashMap::new(),
            next_lobby_id: 1,
            config,
            rng,
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Spawns a new, empty lobby and returns its id.
    pub fn create_lobby(&mut self) -> LobbyId {
        let lobby_id = LobbyId(self.next_lobby_id);
        self.next_lobby_id += 1;

        let rng = StdRng::seed_from_u64(self.rng.random());
        let lobby = Lobby::new(lobby_id, self.config.game.clone(), rng);
        let handle = spawn_lobby(lobby, self.config.channel_size);
        self.lobbies.insert(lobby_id, handle);
        tracing::info!(lobby = %lobby_id, "lobby created");
        lobby_id
    }

    /// Seats a player in the oldest open lobby, creating one if none is
    /// open, and returns its handle.
    pub async fn join_or_create(
        &mut self,
        player_id: PlayerId,
        name: &str,
        sender: PlayerSender,
    ) -> Result<LobbyHandle, LobbyError> {
        if let Some(existing) = self.player_lobbies.get(&player_id) {
            return Err(LobbyError::AlreadyInLobby(player_id, *existing));
        }

        // A lobby can fill or start between get_info and join; the join
        // itself re-checks, so on failure keep looking.
        for handle in self.lobbies.values() {
            let Ok(info) = handle.get_info().await else {
                continue;
            };
            if !info.is_joinable() {
                continue;
            }
            match handle.join(player_id, name, sender.clone()).await {
                Ok(()) => {
                    self.player_lobbies.insert(player_id, info.lobby_id);
                    return Ok(handle.clone());
                }
                Err(err) => {
                    tracing::debug!(lobby = %info.lobby_id, player = %player_id, error = %err, "join raced");
                }
            }
        }

        let lobby_id = self.create_lobby();
        let handle = self
            .lobbies
            .get(&lobby_id)
            .cloned()
            .ok_or(LobbyError::NotFound(lobby_id))?;
        handle.join(player_id, name, sender).await?;
        self.player_lobbies.insert(player_id, lobby_id);
        Ok(handle)
    }

    /// Removes a player from their lobby, destroying it when it empties.
    pub async fn leave(
        &mut self,
        player_id: PlayerId,
        departure: Departure,
    ) -> Result<LobbyId, LobbyError> {
        let lobby_id = self
            .player_lobbies
            .remove(&player_id)
            .ok_or(LobbyError::NotInLobby(player_id))?;

        let Some(handle) = self.lobbies.get(&lobby_id) else {
            return Ok(lobby_id);
        };
        let remaining = match handle.depart(player_id, departure).await {
            Ok(remaining) => remaining,
            Err(LobbyError::Unavailable(_)) => 0,
            Err(err) => return Err(err),
        };
        tracing::info!(lobby = %lobby_id, player = %player_id, ?departure, remaining, "player left lobby");

        if remaining == 0 {
            self.destroy_lobby(lobby_id).await?;
        }
        Ok(lobby_id)
    }

    /// Forwards an in-lobby action to the player's lobby.
    pub async fn route(&self, player_id: PlayerId, msg: ClientMessage) -> Result<(), LobbyError> {
        let lobby_id = self
            .player_lobbies
            .get(&player_id)
            .ok_or(LobbyError::NotInLobby(player_id))?;
        let handle = self
            .lobbies
            .get(lobby_id)
            .ok_or(LobbyError::NotFound(*lobby_id))?;
        handle.send_action(player_id, msg).await
    }

    pub async fn lobby_info(&self, lobby_id: LobbyId) -> Result<LobbyInfo, LobbyError> {
        let handle = self
            .lobbies
            .get(&lobby_id)
            .ok_or(LobbyError::NotFound(lobby_id))?;
        handle.get_info().await
    }

    /// Shuts a lobby down and forgets its players.
    pub async fn destroy_lobby(&mut self, lobby_id: LobbyId) -> Result<(), LobbyError> {
        let handle = self
            .lobbies
            .remove(&lobby_id)
            .ok_or(LobbyError::NotFound(lobby_id))?;

        let _ = handle.shutdown().await;
        self.player_lobbies.retain(|_, lid| *lid != lobby_id);

        tracing::info!(lobby = %lobby_id, "lobby destroyed");
        Ok(())
    }

    /// The lobby a player is currently in, if any.
    pub fn lobby_of(&self, player_id: PlayerId) -> Option<LobbyId> {
        self.player_lobbies.get(&player_id).copied()
    }

    pub fn handle(&self, lobby_id: LobbyId) -> Option<LobbyHandle> {
        self.lobbies.get(&lobby_id).cloned()
    }

    pub fn lobby_count(&self) -> usize {
        self.lobbies.len()
    }

    pub fn lobby_ids(&self) -> Vec<LobbyId> {
        self.lobbies.keys().copied().collect()
    }
}

impl Default for LobbyManager {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}

//! Error types for the lobby layer.

use basta_game::ActionError;
use basta_protocol::{LobbyId, PlayerId};

/// Errors that can occur during registry and lobby operations.
#[derive(Debug, thiserror::Error)]
pub enum LobbyError {
    /// The lobby does not exist.
    #[error("lobby {0} not found")]
    NotFound(LobbyId),

    /// The player is not seated in any lobby.
    #[error("player {0} is not in a lobby")]
    NotInLobby(PlayerId),

    /// The player is already seated somewhere.
    #[error("player {0} already in lobby {1}")]
    AlreadyInLobby(PlayerId, LobbyId),

    /// The lobby's command channel is closed.
    #[error("lobby {0} is unavailable")]
    Unavailable(LobbyId),

    /// The lobby rejected the request.
    #[error(transparent)]
    Action(#[from] ActionError),
}

impl LobbyError {
    /// HTTP-style status code sent back in `ServerMessage::Error`.
    pub fn code(&self) -> u16 {
        match self {
            LobbyError::NotFound(_) | LobbyError::NotInLobby(_) => 404,
            LobbyError::AlreadyInLobby(..) => 409,
            LobbyError::Unavailable(_) => 503,
            LobbyError::Action(e) => e.code(),
        }
    }
}

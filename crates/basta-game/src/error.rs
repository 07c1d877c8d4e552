//! Error types for the game rules.

use basta_protocol::{Lifecycle, Phase, PlayerId};

use crate::CardId;

/// An action was rejected. State is left untouched whenever one of these
/// is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    #[error("player {0} is not in this lobby")]
    NotInLobby(PlayerId),

    #[error("player {0} already joined this lobby")]
    AlreadyJoined(PlayerId),

    #[error("lobby is full")]
    LobbyFull,

    #[error("lobby is not accepting players")]
    NotJoinable,

    #[error("not allowed while the lobby is {0:?}")]
    WrongLifecycle(Lifecycle),

    #[error("not allowed during {0:?}")]
    WrongPhase(Phase),

    #[error("it is not your turn")]
    NotYourTurn,

    #[error("you are blocked until the next turn")]
    Blocked,

    #[error("card {0} is not in your hand")]
    CardNotInHand(CardId),

    #[error("you already drew a card this turn")]
    AlreadyDrawn,

    #[error("you already skipped this turn")]
    AlreadySkipped,

    #[error("the wheel is already spinning")]
    SpinInProgress,

    #[error("only the player who rang the bell can acknowledge")]
    NotRinger,

    #[error("message is not a lobby action")]
    NotAnAction,
}

impl ActionError {
    /// HTTP-style status code sent back in `ServerMessage::Error`.
    pub fn code(&self) -> u16 {
        match self {
            ActionError::NotInLobby(_) => 404,
            ActionError::NotAnAction => 400,
            _ => 409,
        }
    }
}

/// A card table failed validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog has no cards")]
    Empty,

    #[error("card id {0} appears more than once")]
    DuplicateId(CardId),

    #[error("card {0} has no goals")]
    NoGoals(CardId),

    #[error("card {0} lists goal {1}, outside 1..=17")]
    GoalOutOfRange(CardId, u8),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_error_codes() {
        assert_eq!(ActionError::NotInLobby(PlayerId(1)).code(), 404);
        assert_eq!(ActionError::NotYourTurn.code(), 409);
        assert_eq!(ActionError::NotAnAction.code(), 400);
    }

    #[test]
    fn test_action_error_display() {
        assert_eq!(
            ActionError::CardNotInHand(12).to_string(),
            "card 12 is not in your hand"
        );
        assert_eq!(
            ActionError::WrongPhase(Phase::AwaitRoll).to_string(),
            "not allowed during AwaitRoll"
        );
    }
}

//! Game configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::WheelConfig;

/// Per-lobby game settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Countdown length once every seated player is ready.
    pub countdown_seconds: u32,

    /// Minimum players required to start.
    pub min_players: usize,

    /// Maximum players per lobby.
    pub max_players: usize,

    /// Cards dealt to each player at game start.
    pub initial_hand: usize,

    /// Delay between `WheelSpinning` and the resolved sector, long enough
    /// for the client animation to finish.
    pub spin_settle: Duration,

    /// How long the bell ringer has to acknowledge verification before the
    /// turn advances on its own.
    pub verify_grace: Duration,

    pub wheel: WheelConfig,
}

impl GameConfig {
    /// Interval between countdown ticks.
    pub const COUNTDOWN_TICK: Duration = Duration::from_secs(1);
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            countdown_seconds: 3,
            min_players: 2,
            max_players: 4,
            initial_hand: 11,
            spin_settle: Duration::from_millis(2800),
            verify_grace: Duration::from_millis(4500),
            wheel: WheelConfig::default(),
        }
    }
}

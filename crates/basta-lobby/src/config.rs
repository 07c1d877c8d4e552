//! Registry configuration.

use basta_game::GameConfig;

/// Default command channel size for lobby actors.
pub const DEFAULT_CHANNEL_SIZE: usize = 64;

/// Settings shared by every lobby the registry creates.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Rules applied to each new lobby.
    pub game: GameConfig,

    /// Bound of each lobby's command channel. Senders wait when it is full.
    pub channel_size: usize,

    /// Seed for the registry's random source. Each lobby's generator is
    /// seeded from it, so a fixed seed replays the same shuffles, rolls
    /// and spins. `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            game: GameConfig::default(),
            channel_size: DEFAULT_CHANNEL_SIZE,
            seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_config_default() {
        let config = RegistryConfig::default();
        assert_eq!(config.channel_size, 64);
        assert_eq!(config.seed, None);
        assert_eq!(config.game.max_players, 4);
    }
}

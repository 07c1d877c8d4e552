//! Lobby actors and the lobby registry for the BASTA server.
//!
//! Each lobby runs as an isolated Tokio task (actor model) that owns its
//! [`basta_game::Lobby`] state and its timers.
//!
//! # Key types
//!
//! - [`LobbyManager`]: creates/destroys lobbies, seats and routes players
//! - [`LobbyHandle`]: send commands to a running lobby actor
//! - [`RegistryConfig`]: game rules, channel size and seed for new lobbies

mod actor;
mod config;
mod error;
mod manager;

pub use actor::{LobbyHandle, LobbyInfo, PlayerSender};
pub use config::{DEFAULT_CHANNEL_SIZE, RegistryConfig};
pub use error::LobbyError;
pub use manager::LobbyManager;

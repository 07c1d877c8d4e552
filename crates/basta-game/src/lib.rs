//! # basta-game
//!
//! The rules of BASTA: the card catalog, the wheel selector, the turn state
//! machine and the verification engine.
//!
//! Everything here is synchronous and deterministic for a given random
//! seed. A [`Lobby`] never sleeps or talks to the network; its handlers
//! return an [`Outbox`] of messages to deliver and timers to arm, and the
//! actor in `basta-lobby` carries those out.
//!
//! ```
//! use basta_game::{GameConfig, Lobby};
//! use basta_protocol::{Lifecycle, LobbyId, PlayerId};
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//!
//! let mut lobby = Lobby::new(LobbyId(1), GameConfig::default(), StdRng::seed_from_u64(1));
//! lobby.join(PlayerId(1), "Ana").unwrap();
//! lobby.join(PlayerId(2), "Bo").unwrap();
//! lobby.set_ready(PlayerId(1), true).unwrap();
//! lobby.set_ready(PlayerId(2), true).unwrap();
//! assert_eq!(lobby.lifecycle(), Lifecycle::Countdown);
//! ```

mod card;
pub mod catalog;
mod config;
mod error;
mod lobby;
mod membership;
mod outbox;
mod player;
mod turn;
mod verify;
pub mod wheel;

pub use card::{Card, CardId, CardKind, Goal, WILDCARD_COLOR, section_color};
pub use catalog::Catalog;
pub use config::GameConfig;
pub use error::{ActionError, CatalogError};
pub use lobby::{Lobby, MAX_CHAT_CHARS, PlayedCard};
pub use membership::Departure;
pub use outbox::{Effect, Outbox, Timer};
pub use player::{Player, sanitize_name};
pub use verify::penalty_message;
pub use wheel::{UsageCycle, WheelConfig};

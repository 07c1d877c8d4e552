//! # BASTA
//!
//! Authoritative multiplayer server for BASTA, a real-time card game played
//! around a two-ring wheel. Clients connect over WebSocket, get matched into
//! lobbies of two to four players, and every rule is enforced here.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use basta::prelude::*;
//!
//! # async fn run() -> Result<(), BastaError> {
//! let server = BastaServer::builder()
//!     .bind("0.0.0.0:3000")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
pub mod logging;
mod server;

pub use config::{DEFAULT_BIND, ServerConfig};
pub use error::BastaError;
pub use server::{BastaServer, BastaServerBuilder};

/// Everything needed to configure and run a server.
pub mod prelude {
    pub use crate::{BastaError, BastaServer, BastaServerBuilder, ServerConfig};
    pub use basta_game::GameConfig;
    pub use basta_protocol::{ClientMessage, Envelope, PlayerId, ServerMessage};
}

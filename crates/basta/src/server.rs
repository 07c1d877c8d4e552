//! `BastaServer` builder and accept loop.
//!
//! This ties the layers together: transport → protocol → lobby registry.

use std::sync::Arc;
use std::time::Duration;

use basta_game::GameConfig;
use basta_lobby::{LobbyManager, RegistryConfig};
use basta_protocol::{Codec, JsonCodec};
use basta_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::handler::handle_connection;
use crate::{BastaError, ServerConfig};

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<C: Codec> {
    /// The registry is only locked for membership changes (join, cancel,
    /// leave). In-game actions go straight to the cached lobby handle.
    pub(crate) lobbies: Mutex<LobbyManager>,
    pub(crate) codec: C,
    pub(crate) config: ServerConfig,
}

/// Builder for configuring and starting a BASTA server.
///
/// # Example
///
/// ```rust,no_run
/// use basta::prelude::*;
///
/// # async fn run() -> Result<(), BastaError> {
/// let server = BastaServer::builder()
///     .bind("0.0.0.0:3000")
///     .seed(42)
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct BastaServerBuilder {
    config: ServerConfig,
    registry: RegistryConfig,
}

impl BastaServerBuilder {
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            registry: RegistryConfig::default(),
        }
    }

    /// Sets the address to bind the server to. Port 0 picks a free port.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Sets the rules used by every lobby.
    pub fn game_config(mut self, game: GameConfig) -> Self {
        self.registry.game = game;
        self
    }

    /// Fixes the random seed so shuffles, rolls and spins replay.
    pub fn seed(mut self, seed: u64) -> Self {
        self.registry.seed = Some(seed);
        self
    }

    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.idle_timeout = timeout;
        self
    }

    /// Binds the listener. Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build(self) -> Result<BastaServer<JsonCodec>, BastaError> {
        let transport = WebSocketTransport::bind(&self.config.bind_addr).await?;

        let state = Arc::new(ServerState {
            lobbies: Mutex::new(LobbyManager::new(self.registry)),
            codec: JsonCodec,
            config: self.config,
        });

        Ok(BastaServer { transport, state })
    }
}

impl Default for BastaServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound BASTA server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct BastaServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl BastaServer<JsonCodec> {
    pub fn builder() -> BastaServerBuilder {
        BastaServerBuilder::new()
    }
}

impl<C: Codec> BastaServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> Result<std::net::SocketAddr, BastaError> {
        Ok(self.transport.local_addr()?)
    }

    /// Runs the accept loop until the process is terminated, spawning a
    /// handler task for each connection.
    pub async fn run(mut self) -> Result<(), BastaError> {
        tracing::info!("BASTA server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}

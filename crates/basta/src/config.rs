//! Server configuration.

use std::time::Duration;

/// Address the builder binds to unless told otherwise.
pub const DEFAULT_BIND: &str = "127.0.0.1:3000";

/// Connection-level settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,

    /// A connection that sends nothing for this long is closed and its
    /// player treated as disconnected. Clients keep it alive with
    /// `Heartbeat`.
    pub idle_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND.to_string(),
            idle_timeout: Duration::from_secs(15),
        }
    }
}

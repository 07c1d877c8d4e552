//! `basta-server` binary.
//!
//! Environment:
//! - `BASTA_BIND`: listen address (default `0.0.0.0:3000`)
//! - `COUNTDOWN_SECONDS`: lobby countdown length (default 3)
//! - `BASTA_SEED`: fixed random seed for reproducible games
//! - `RUST_LOG`: log filter

use std::str::FromStr;

use basta::prelude::*;

const BIND_ENV: &str = "BASTA_BIND";
const DEFAULT_LISTEN: &str = "0.0.0.0:3000";

/// Reads and parses an environment variable. Unparseable values are
/// logged and ignored.
fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparseable environment value");
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), BastaError> {
    basta::logging::init();

    let bind = std::env::var(BIND_ENV).unwrap_or_else(|_| DEFAULT_LISTEN.to_string());

    let mut game = GameConfig::default();
    if let Some(seconds) = env_parse::<u32>("COUNTDOWN_SECONDS") {
        game.countdown_seconds = seconds;
    }

    let mut builder = BastaServer::builder().bind(&bind).game_config(game);
    if let Some(seed) = env_parse::<u64>("BASTA_SEED") {
        tracing::info!(seed, "using fixed random seed");
        builder = builder.seed(seed);
    }

    let server = builder.build().await?;
    tracing::info!(addr = %server.local_addr()?, "listening");
    server.run().await
}

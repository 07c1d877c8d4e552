//! Identity and framing types for the wire format.

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a player.
///
/// Players have no identity beyond their connection, so the server derives
/// this from the transport's connection id. `#[serde(transparent)]` puts it
/// on the wire as a plain number: `PlayerId(42)` becomes `42`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

/// `tracing::info!(%player_id, ...)` prints "P-42".
impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A unique identifier for a lobby (one game session).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct LobbyId(pub u64);

impl fmt::Display for LobbyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Recipient: who should receive a message?
// ---------------------------------------------------------------------------

/// Specifies who should receive a server message.
///
/// Game rules return a list of `(Recipient, ServerMessage)` pairs and the
/// lobby actor delivers each one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// Every player seated in the lobby.
    All,

    /// One specific player.
    Player(PlayerId),
}

// ---------------------------------------------------------------------------
// Envelope: the top-level wire format
// ---------------------------------------------------------------------------

/// The top-level message wrapper. Every frame on the wire is an Envelope.
///
/// ```text
/// ┌──────────────────────────────────┐
/// │ seq: 42                          │  ← per-connection ordering
/// │ timestamp: 15000                 │  ← ms since connection start
/// │ message: { "type": "RollDice" }  │  ← ClientMessage / ServerMessage
/// └──────────────────────────────────┘
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<M> {
    /// Auto-incrementing sequence number. Each side keeps its own counter.
    pub seq: u64,

    /// Milliseconds since the connection was accepted.
    pub timestamp: u64,

    /// The message itself.
    pub message: M,
}

// =========================================================================
// Tests
// =========================================================================

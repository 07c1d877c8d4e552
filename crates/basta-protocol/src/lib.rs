//! Wire protocol for the BASTA server.
//!
//! This crate defines the "language" that clients and the server speak:
//!
//! - **Types** ([`Envelope`], [`PlayerId`], [`LobbyId`], [`Recipient`]):
//!   identity and framing.
//! - **Messages** ([`ClientMessage`], [`ServerMessage`]) and the snapshot
//!   views they carry ([`GameStateView`], [`CardView`], [`Verdict`], ...).
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how envelopes become bytes.
//! - **Errors** ([`ProtocolError`]).
//!
//! ```text
//! Transport (bytes) → Protocol (Envelope<ClientMessage>) → Lobby actor
//! ```

mod codec;
mod error;
mod messages;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use messages::{
    CardView, ClientMessage, EndReason, GameStateView, InvalidReason,
    Lifecycle, PenaltySummary, Phase, PlayerSummary, Ring, RosterEntry,
    Section, ServerMessage, Verdict, WheelSelection,
};
pub use types::{Envelope, LobbyId, PlayerId, Recipient};

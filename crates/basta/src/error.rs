//! Unified error type for the BASTA server.

use basta_lobby::LobbyError;
use basta_protocol::ProtocolError;
use basta_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant lets `?` convert sub-crate
/// errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum BastaError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A lobby-level error (registry or actor).
    #[error(transparent)]
    Lobby(#[from] LobbyError),
}

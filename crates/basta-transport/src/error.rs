//! Error types for the transport layer.

use std::io;

/// Errors that can occur while listening for or talking to clients.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The listener could not be bound or queried.
    #[error("bind failed: {0}")]
    Bind(#[source] io::Error),

    /// Accepting a TCP connection failed.
    #[error("accept failed: {0}")]
    Accept(#[source] io::Error),

    /// The WebSocket upgrade failed.
    #[cfg(feature = "websocket")]
    #[error("handshake failed: {0}")]
    Handshake(#[source] tokio_tungstenite::tungstenite::Error),

    /// Writing a frame failed. The peer is treated as gone.
    #[error("send failed: {0}")]
    SendFailed(#[source] io::Error),

    /// Reading a frame failed. The peer is treated as gone.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] io::Error),
}

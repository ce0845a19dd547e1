//! Feed transport error types.

use std::time::Duration;

/// Feed transport errors.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// Connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Connection closed unexpectedly.
    #[error("Connection closed: {reason}")]
    ConnectionClosed {
        /// Close reason.
        reason: String,
        /// WebSocket close code, when one was sent.
        code: Option<u16>,
    },

    /// The server rejected the session credentials.
    #[error("Authentication rejected: {0}")]
    AuthRejected(String),

    /// The Engine.IO or Socket.IO handshake did not complete.
    #[error("Handshake failed: {0}")]
    Handshake(String),

    /// Packet decode error.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Timeout.
    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    /// Invalid endpoint URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Invalid state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocketError(String),
}

impl StreamError {
    /// Returns true when a fresh connection attempt may succeed without
    /// operator action.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        !matches!(self, Self::AuthRejected(_) | Self::InvalidUrl(_))
    }

    /// Returns true when the server refused the credentials.
    #[must_use]
    pub const fn is_auth_failure(&self) -> bool {
        matches!(self, Self::AuthRejected(_))
    }
}

/// Result type for streaming operations.
pub type StreamResult<T> = Result<T, StreamError>;

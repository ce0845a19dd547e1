//! Runtime error types.

/// Errors from runtime infrastructure (storage, configuration, tasks).
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// Credential storage failed.
    #[error("Credential storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A blocking task panicked or was cancelled.
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Failure of a single action. Logged by the dispatcher, never propagated.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    /// Recording request failed at the transport level.
    #[error("Recording fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),

    /// Recording endpoint answered with a non-success status.
    #[error("Recording endpoint returned HTTP {status}")]
    FetchStatus {
        /// HTTP status code.
        status: u16,
    },

    /// Notification or upload was rejected.
    #[error("Delivery failed: {0}")]
    Delivery(String),

    /// Invalid recording URL.
    #[error("Invalid recording URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Local artifact I/O failed.
    #[error("Artifact I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Submission to a dispatcher that no longer accepts work.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// The dispatcher has been shut down.
    #[error("Dispatcher is closed")]
    Closed,
}

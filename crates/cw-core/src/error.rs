//! Core error types.

/// Errors raised while interpreting feed data.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The snapshot payload did not have the expected shape.
    #[error("Malformed snapshot: {0}")]
    MalformedSnapshot(String),

    /// JSON decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

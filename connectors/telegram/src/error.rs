//! Telegram-specific error types.

use std::time::Duration;

use thiserror::Error;

/// Telegram Bot API errors.
#[derive(Error, Debug)]
pub enum TelegramError {
    /// HTTP request failed. The request URL (which embeds the bot token) is
    /// stripped before the error is stored.
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    /// JSON deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Telegram API returned an error
    #[error("Telegram API error {status}: {description}")]
    Api {
        status: u16,
        description: String,
        retry_after: Option<u64>,
    },

    /// Reading a file to upload failed
    #[error("Upload file error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for TelegramError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.without_url())
    }
}

impl TelegramError {
    /// Check if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) => true,
            Self::Api { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Server-suggested retry delay.
    #[must_use]
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Api { retry_after, .. } => retry_after.map(Duration::from_secs),
            _ => None,
        }
    }
}

/// Result type for Telegram operations.
pub type TelegramResult<T> = Result<T, TelegramError>;

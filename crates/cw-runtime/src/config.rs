//! Runtime configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// RuntimeConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Supervisor and worker-pool settings (`[runtime]`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Concurrent action workers per connection.
    /// Default: 10.
    pub max_workers: usize,

    /// Wait between credential checks while none are stored (seconds).
    /// Default: 30.
    pub credential_poll_secs: u64,

    /// Wait after a session ends before reconnecting (seconds).
    /// Default: 5.
    pub restart_delay_secs: u64,

    /// Bound on draining in-flight actions at shutdown (seconds).
    /// Default: 30.
    pub drain_timeout_secs: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_workers: 10,
            credential_poll_secs: 30,
            restart_delay_secs: 5,
            drain_timeout_secs: 30,
        }
    }
}

impl RuntimeConfig {
    /// Create a config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set worker count.
    #[must_use]
    pub const fn with_max_workers(mut self, workers: usize) -> Self {
        self.max_workers = workers;
        self
    }

    /// Builder: set credential poll interval.
    #[must_use]
    pub const fn with_credential_poll_secs(mut self, secs: u64) -> Self {
        self.credential_poll_secs = secs;
        self
    }

    /// Builder: set restart delay.
    #[must_use]
    pub const fn with_restart_delay_secs(mut self, secs: u64) -> Self {
        self.restart_delay_secs = secs;
        self
    }

    /// Credential poll interval as a Duration.
    #[must_use]
    pub const fn credential_poll(&self) -> Duration {
        Duration::from_secs(self.credential_poll_secs)
    }

    /// Restart delay as a Duration.
    #[must_use]
    pub const fn restart_delay(&self) -> Duration {
        Duration::from_secs(self.restart_delay_secs)
    }

    /// Drain timeout as a Duration.
    #[must_use]
    pub const fn drain_timeout(&self) -> Duration {
        Duration::from_secs(self.drain_timeout_secs)
    }

    /// Validate configuration, returning errors for invalid values.
    ///
    /// # Errors
    ///
    /// Returns error strings for any invalid configuration values.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.max_workers == 0 {
            errors.push("runtime.max_workers must be > 0".to_string());
        }
        if self.credential_poll_secs == 0 {
            errors.push("runtime.credential_poll_secs must be > 0".to_string());
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// RecordingConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Recording retrieval settings (`[recording]`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    /// Sound endpoint; `did` and `uuid` query parameters are appended.
    pub url: String,

    /// Directory for downloaded artifacts. Default: system temp dir.
    pub dir: Option<PathBuf>,

    /// Delay before fetching a recording (seconds). Default: 15.
    pub delay_secs: u64,

    /// Optional thumbnail attached to uploads.
    pub thumbnail: Option<PathBuf>,

    /// `Referer` header for the recording request.
    pub referer: Option<String>,

    /// Request timeout (seconds). Default: 120.
    pub timeout_secs: u64,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            dir: None,
            delay_secs: 15,
            thumbnail: None,
            referer: None,
            timeout_secs: 120,
        }
    }
}

impl RecordingConfig {
    /// Pre-retrieval delay as a Duration.
    #[must_use]
    pub const fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_secs)
    }

    /// Artifact directory, falling back to the system temp dir.
    #[must_use]
    pub fn artifact_dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Validate configuration, returning errors for invalid values.
    ///
    /// # Errors
    ///
    /// Returns error strings for any invalid configuration values.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.url.trim().is_empty() {
            errors.push("recording.url is required".to_string());
        } else if let Err(e) = url::Url::parse(&self.url) {
            errors.push(format!("recording.url is invalid: {e}"));
        }
        if self.timeout_secs == 0 {
            errors.push("recording.timeout_secs must be > 0".to_string());
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

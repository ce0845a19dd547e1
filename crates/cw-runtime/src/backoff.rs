//! Exponential backoff for polling loops.

use std::time::Duration;

/// Doubling delay with a cap. Attempts are 0-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    /// Delay after the first failure (milliseconds).
    pub base_ms: u64,
    /// Upper bound (milliseconds).
    pub max_ms: u64,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            base_ms: 1_000,
            max_ms: 60_000,
        }
    }
}

impl Backoff {
    /// Create a policy.
    #[must_use]
    pub const fn new(base_ms: u64, max_ms: u64) -> Self {
        Self { base_ms, max_ms }
    }

    /// Delay before retry number `attempt`.
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        let exp = attempt.min(30);
        let delay = self.base_ms.saturating_mul(1u64 << exp);
        Duration::from_millis(delay.min(self.max_ms))
    }
}

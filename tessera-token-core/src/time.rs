//! Time configuration for token validity windows

use serde::{Deserialize, Serialize};

/// Configuration for a token's validity window.
///
/// The window opens at `start_time` (or the current time when `None`) and
/// closes `duration` seconds later. The closing instant itself is outside the
/// window: a token with `start_time: Some(0), duration: 1` is valid only at
/// time 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenTimeConfig {
    /// Unix timestamp the window opens at. `None` means "now" at issue time.
    pub start_time: Option<i64>,
    /// Window length in seconds.
    pub duration: i64,
}

impl TokenTimeConfig {
    /// Creates a config that starts now and lasts `duration` seconds.
    pub fn with_duration(duration: i64) -> Self {
        Self {
            start_time: None,
            duration,
        }
    }

    /// Resolves the window against a fallback start time (usually "now").
    ///
    /// Returns `(start, expiration)` as Unix timestamps.
    pub fn window_from(&self, now: i64) -> (i64, i64) {
        let start = self.start_time.unwrap_or(now);
        (start, start + self.duration)
    }
}

impl Default for TokenTimeConfig {
    fn default() -> Self {
        Self {
            start_time: None,
            duration: 3600,
        }
    }
}

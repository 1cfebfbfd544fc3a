//! Tick scheduling seam.
//!
//! A [`TickSource`] is an execution context able to call back periodically.
//! The engine owns at most one [`TickHandle`] at a time; dropping or cancelling
//! it stops the callbacks.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::error::{PomoError, Result};

/// Callback invoked on every tick.
pub type TickCallback = Arc<dyn Fn() + Send + Sync>;

pub trait TickSource: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Starts calling `on_tick` every `period` until the returned handle is
    /// cancelled or dropped.
    ///
    /// # Returns
    ///
    /// - `Ok(TickHandle)`: Ticking started
    /// - `Err(PomoError::Unavailable)`: The execution context cannot schedule ticks
    fn schedule(&self, period: Duration, on_tick: TickCallback) -> Result<TickHandle>;
}

/// Cancels its ticker when dropped.
#[derive(Debug)]
pub struct TickHandle {
    token: CancellationToken,
}

impl TickHandle {
    pub fn new(token: CancellationToken) -> Self {
        Self { token }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for TickHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Which execution context should drive ticks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TickSourceKind {
    /// Dedicated worker thread, not tied to the async runtime's scheduling
    #[default]
    Background,
    /// Interval task on the async runtime
    Interval,
}

impl fmt::Display for TickSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Background => f.write_str("background"),
            Self::Interval => f.write_str("interval"),
        }
    }
}

impl FromStr for TickSourceKind {
    type Err = PomoError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "background" => Ok(Self::Background),
            "interval" => Ok(Self::Interval),
            other => Err(PomoError::config(format!(
                "unknown tick source '{}', expected 'background' or 'interval'",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_source_kind_parsing() {
        assert_eq!(
            "Background".parse::<TickSourceKind>().unwrap(),
            TickSourceKind::Background
        );
        assert_eq!(
            "interval".parse::<TickSourceKind>().unwrap(),
            TickSourceKind::Interval
        );
        assert!("worker".parse::<TickSourceKind>().is_err());
        assert_eq!(TickSourceKind::default().to_string(), "background");
    }

    #[test]
    fn test_drop_cancels_token() {
        let token = CancellationToken::new();
        let handle = TickHandle::new(token.clone());
        assert!(!handle.is_cancelled());
        drop(handle);
        assert!(token.is_cancelled());
    }
}

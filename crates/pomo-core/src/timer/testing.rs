//! Deterministic clock and tick source.
//!
//! Enabled for this crate's tests and, through the `test-helpers` feature,
//! for downstream crates that need to drive the engine without sleeping.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use super::clock::Clock;
use super::tick::{TickCallback, TickHandle, TickSource};
use crate::error::Result;

/// A clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock {
    base: Instant,
    offset: Arc<Mutex<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(PoisonError::into_inner);
        *offset += by;
    }

    pub fn advance_secs(&self, secs: u64) {
        self.advance(Duration::from_secs(secs));
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let offset = self.offset.lock().unwrap_or_else(PoisonError::into_inner);
        self.base + *offset
    }
}

struct Registration {
    token: CancellationToken,
    period: Duration,
    on_tick: TickCallback,
}

/// A tick source whose ticks are fired by hand.
#[derive(Clone, Default)]
pub struct ManualTickSource {
    registrations: Arc<Mutex<Vec<Registration>>>,
    scheduled: Arc<Mutex<usize>>,
}

impl ManualTickSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invokes every live callback once.
    ///
    /// # Returns
    ///
    /// The number of callbacks invoked.
    pub fn fire(&self) -> usize {
        let callbacks: Vec<TickCallback> = {
            let mut registrations = self
                .registrations
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            registrations.retain(|r| !r.token.is_cancelled());
            registrations.iter().map(|r| r.on_tick.clone()).collect()
        };
        // Callbacks run outside the lock; they may schedule or cancel.
        for callback in &callbacks {
            callback();
        }
        callbacks.len()
    }

    /// Number of tickers not yet cancelled.
    pub fn active(&self) -> usize {
        self.registrations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|r| !r.token.is_cancelled())
            .count()
    }

    /// Number of `schedule` calls so far.
    pub fn scheduled(&self) -> usize {
        *self.scheduled.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Period requested by the most recent live ticker.
    pub fn last_period(&self) -> Option<Duration> {
        self.registrations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .rev()
            .find(|r| !r.token.is_cancelled())
            .map(|r| r.period)
    }
}

impl TickSource for ManualTickSource {
    fn name(&self) -> &'static str {
        "manual"
    }

    fn schedule(&self, period: Duration, on_tick: TickCallback) -> Result<TickHandle> {
        let token = CancellationToken::new();
        self.registrations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Registration {
                token: token.clone(),
                period,
                on_tick,
            });
        *self.scheduled.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        Ok(TickHandle::new(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_manual_clock_moves_only_on_advance() {
        let clock = ManualClock::new();
        let t0 = clock.now();
        assert_eq!(clock.now(), t0);
        clock.advance_secs(3);
        assert_eq!(clock.now() - t0, Duration::from_secs(3));
    }

    #[test]
    fn test_cancelled_tickers_stop_firing() {
        let source = ManualTickSource::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let handle = source
            .schedule(
                Duration::from_secs(1),
                Arc::new(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .unwrap();

        assert_eq!(source.fire(), 1);
        assert_eq!(source.last_period(), Some(Duration::from_secs(1)));
        drop(handle);
        assert_eq!(source.fire(), 0);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(source.active(), 0);
        assert_eq!(source.scheduled(), 1);
    }
}

//! Runtime interval tick source, used when the worker thread is unavailable
//! or not wanted.

use pomo_core::error::{PomoError, Result};
use pomo_core::timer::{TickCallback, TickHandle, TickSource};
use std::time::Duration;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

pub struct IntervalTickSource {
    runtime: tokio::runtime::Handle,
}

impl IntervalTickSource {
    pub fn new(runtime: tokio::runtime::Handle) -> Self {
        Self { runtime }
    }

    /// Creates a source on the runtime the caller is running in.
    ///
    /// # Returns
    ///
    /// - `Err(PomoError::Unavailable)`: Called outside a tokio runtime
    pub fn current() -> Result<Self> {
        tokio::runtime::Handle::try_current()
            .map(Self::new)
            .map_err(|e| PomoError::unavailable(format!("no tokio runtime: {}", e)))
    }
}

impl TickSource for IntervalTickSource {
    fn name(&self) -> &'static str {
        "interval"
    }

    fn schedule(&self, period: Duration, on_tick: TickCallback) -> Result<TickHandle> {
        if period.is_zero() {
            return Err(PomoError::validation("tick_period", "must be greater than zero"));
        }
        let token = CancellationToken::new();
        let cancel = token.clone();

        self.runtime.spawn(async move {
            // First tick one period from now, not immediately
            let mut interval = time::interval_at(time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = interval.tick() => {
                        if cancel.is_cancelled() {
                            break;
                        }
                        on_tick();
                    }
                }
            }
        });

        Ok(TickHandle::new(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_callback() -> (Arc<AtomicUsize>, TickCallback) {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        (
            hits,
            Arc::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_once_per_period() {
        let source = IntervalTickSource::current().unwrap();
        let (hits, callback) = counting_callback();

        let handle = source.schedule(Duration::from_secs(1), callback).unwrap();

        time::sleep(Duration::from_millis(500)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        time::sleep(Duration::from_millis(3000)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 3);

        handle.cancel();
        time::sleep(Duration::from_secs(5)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_current_outside_runtime_is_unavailable() {
        let err = IntervalTickSource::current().err().unwrap();
        assert!(matches!(err, PomoError::Unavailable(_)));
    }
}

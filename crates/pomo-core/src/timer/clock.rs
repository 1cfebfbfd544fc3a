use std::time::Instant;

/// Monotonic time source.
///
/// Countdown accounting is done against `Instant`, never wall-clock time, so
/// clock adjustments cannot skew the remaining time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// The process monotonic clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

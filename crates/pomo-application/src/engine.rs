//! Countdown engine.
//!
//! Owns the single [`Countdown`] and at most one live ticker. Signals are
//! published on an unbounded channel while the state lock is held, so the
//! order consumers observe is the order in which state changed.

use pomo_core::session::SessionKind;
use pomo_core::timer::{
    Clock, Countdown, RunState, TickCallback, TickHandle, TickSource, TimerSignal, TimerSnapshot,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::mpsc;

struct EngineState {
    countdown: Countdown,
    ticker: Option<TickHandle>,
}

struct EngineInner {
    state: Mutex<EngineState>,
    clock: Arc<dyn Clock>,
    tick_source: Arc<dyn TickSource>,
    tick_period: Duration,
    signals: mpsc::UnboundedSender<TimerSignal>,
}

/// Handle to the countdown engine. Clones share the same countdown.
#[derive(Clone)]
pub struct CountdownEngine {
    inner: Arc<EngineInner>,
}

impl CountdownEngine {
    /// Creates an idle engine showing `initial_seconds` for `kind`.
    ///
    /// # Arguments
    ///
    /// * `clock` - Monotonic reference for elapsed-time accounting
    /// * `tick_source` - Execution context that drives ticks; one per engine
    /// * `tick_period` - How often the tick source calls back
    ///
    /// # Returns
    ///
    /// The engine and the receiving end of its signal channel.
    pub fn new(
        initial_seconds: u32,
        kind: SessionKind,
        clock: Arc<dyn Clock>,
        tick_source: Arc<dyn TickSource>,
        tick_period: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<TimerSignal>) {
        let (tx, rx) = mpsc::unbounded_channel();
        tracing::debug!(
            "[Engine] Created with tick source '{}' every {:?}",
            tick_source.name(),
            tick_period
        );
        let engine = Self {
            inner: Arc::new(EngineInner {
                state: Mutex::new(EngineState {
                    countdown: Countdown::new(initial_seconds, kind),
                    ticker: None,
                }),
                clock,
                tick_source,
                tick_period,
                signals: tx,
            }),
        };
        (engine, rx)
    }

    /// Starts a segment. No-op if already running or `seconds` is zero.
    pub fn start(&self, seconds: u32, kind: SessionKind) {
        let mut state = self.inner.lock();
        let now = self.inner.clock.now();
        let signals = state.countdown.start(seconds, kind, now);
        if signals.is_empty() {
            tracing::debug!("[Engine] start ignored ({:?})", state.countdown.run_state());
            return;
        }
        tracing::info!("[Engine] Started {} for {}s", kind, seconds);
        self.inner.arm_ticker(&mut state);
        self.inner.publish(signals);
    }

    /// Pauses a running segment. No-op otherwise.
    pub fn pause(&self) {
        let mut state = self.inner.lock();
        let now = self.inner.clock.now();
        let signals = state.countdown.pause(now);
        if signals.is_empty() {
            return;
        }
        self.inner.disarm_if_stopped(&mut state);
        if signals.iter().any(TimerSignal::is_completion) {
            tracing::info!(
                "[Engine] {} completed on pause catch-up",
                state.countdown.snapshot().kind
            );
        } else {
            tracing::info!(
                "[Engine] Paused at {}s",
                state.countdown.snapshot().seconds_remaining
            );
        }
        self.inner.publish(signals);
    }

    /// Resumes a paused segment. No-op when running, idle or at zero.
    pub fn resume(&self) {
        let mut state = self.inner.lock();
        let now = self.inner.clock.now();
        let signals = state.countdown.resume(now);
        if signals.is_empty() {
            return;
        }
        tracing::info!(
            "[Engine] Resumed at {}s",
            state.countdown.snapshot().seconds_remaining
        );
        self.inner.arm_ticker(&mut state);
        self.inner.publish(signals);
    }

    /// Stops any ticker and shows `seconds` for `kind`, idle.
    ///
    /// The ticker is cancelled before the value changes, and the countdown's
    /// epoch guard discards any tick already in flight.
    pub fn reset(&self, seconds: u32, kind: SessionKind) {
        let mut state = self.inner.lock();
        state.ticker.take();
        let signals = state.countdown.reset(seconds, kind);
        tracing::debug!("[Engine] Reset to {}s ({})", seconds, kind);
        self.inner.publish(signals);
    }

    /// Recomputes the value from the reference clock and reissues it.
    ///
    /// # Returns
    ///
    /// `false` if the engine was never started, in which case nothing is emitted.
    pub fn resync(&self) -> bool {
        let mut state = self.inner.lock();
        let now = self.inner.clock.now();
        let signals = state.countdown.resync(now);
        if signals.is_empty() {
            return false;
        }
        self.inner.disarm_if_stopped(&mut state);
        self.inner.publish(signals);
        true
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        self.inner.lock().countdown.snapshot()
    }

    pub fn has_started(&self) -> bool {
        self.inner.lock().countdown.has_started()
    }

    /// Whether a ticker is currently scheduled.
    pub fn is_ticking(&self) -> bool {
        self.inner.lock().ticker.is_some()
    }

    pub fn tick_source_name(&self) -> &'static str {
        self.inner.tick_source.name()
    }
}

impl EngineInner {
    fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, signals: Vec<TimerSignal>) {
        for signal in signals {
            // A dropped receiver only means nobody is listening any more.
            let _ = self.signals.send(signal);
        }
    }

    /// Replaces the ticker with one bound to the countdown's current epoch.
    fn arm_ticker(self: &Arc<Self>, state: &mut EngineState) {
        state.ticker.take();

        let epoch = state.countdown.epoch();
        let weak: Weak<EngineInner> = Arc::downgrade(self);
        let on_tick: TickCallback = Arc::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.on_tick(epoch);
            }
        });

        match self.tick_source.schedule(self.tick_period, on_tick) {
            Ok(handle) => state.ticker = Some(handle),
            Err(e) => {
                // The reference clock still holds; a resync will catch up.
                tracing::error!(
                    "[Engine] Tick source '{}' failed to schedule: {}",
                    self.tick_source.name(),
                    e
                );
            }
        }
    }

    fn disarm_if_stopped(&self, state: &mut EngineState) {
        if state.countdown.run_state() != RunState::Running {
            state.ticker.take();
        }
    }

    fn on_tick(&self, epoch: u64) {
        let mut state = self.lock();
        let now = self.clock.now();
        let signals = state.countdown.tick(epoch, now);
        if signals.is_empty() {
            return;
        }
        self.disarm_if_stopped(&mut state);
        if signals.iter().any(TimerSignal::is_completion) {
            tracing::info!("[Engine] {} completed", state.countdown.snapshot().kind);
        }
        self.publish(signals);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pomo_core::timer::testing::{ManualClock, ManualTickSource};

    struct Harness {
        clock: ManualClock,
        ticks: ManualTickSource,
        engine: CountdownEngine,
        signals: mpsc::UnboundedReceiver<TimerSignal>,
    }

    impl Harness {
        fn new() -> Self {
            let clock = ManualClock::new();
            let ticks = ManualTickSource::new();
            let (engine, signals) = CountdownEngine::new(
                1500,
                SessionKind::Focus,
                Arc::new(clock.clone()),
                Arc::new(ticks.clone()),
                Duration::from_secs(1),
            );
            Self {
                clock,
                ticks,
                engine,
                signals,
            }
        }

        /// Advances one second and delivers one tick.
        fn step(&self) {
            self.clock.advance_secs(1);
            self.ticks.fire();
        }

        fn drain(&mut self) -> Vec<TimerSignal> {
            let mut out = Vec::new();
            while let Ok(signal) = self.signals.try_recv() {
                out.push(signal);
            }
            out
        }
    }

    #[test]
    fn test_ticks_decrement_and_publish_in_order() {
        let mut h = Harness::new();
        h.engine.start(10, SessionKind::Focus);
        for _ in 0..3 {
            h.step();
        }

        let remaining: Vec<u32> = h
            .drain()
            .into_iter()
            .filter_map(|s| match s {
                TimerSignal::Updated {
                    seconds_remaining, ..
                } => Some(seconds_remaining),
                _ => None,
            })
            .collect();
        assert_eq!(remaining, vec![10, 9, 8, 7]);
        assert!(h.engine.snapshot().is_running());
        assert_eq!(h.ticks.last_period(), Some(Duration::from_secs(1)));
    }

    #[test]
    fn test_completion_stops_ticker() {
        let mut h = Harness::new();
        h.engine.start(5, SessionKind::Focus);
        for _ in 0..5 {
            h.step();
        }
        // Further ticks after completion
        h.step();
        h.step();

        let completions = h.drain().into_iter().filter(|s| s.is_completion()).count();
        assert_eq!(completions, 1);
        assert!(h.engine.snapshot().is_idle());
        assert!(!h.engine.is_ticking());
        assert_eq!(h.ticks.active(), 0);
    }

    #[test]
    fn test_pause_cancels_ticker_and_freezes() {
        let mut h = Harness::new();
        h.engine.start(60, SessionKind::Focus);
        h.step();
        h.engine.pause();
        assert_eq!(h.ticks.active(), 0);

        h.clock.advance_secs(30);
        h.ticks.fire();
        assert_eq!(h.engine.snapshot().seconds_remaining, 59);

        h.engine.resume();
        assert_eq!(h.ticks.active(), 1);
        h.step();
        assert_eq!(h.engine.snapshot().seconds_remaining, 58);

        let signals = h.drain();
        assert!(signals.iter().any(|s| matches!(s, TimerSignal::Paused { .. })));
        assert!(signals.iter().any(|s| matches!(s, TimerSignal::Resumed { .. })));
    }

    #[test]
    fn test_reset_cancels_in_flight_tick() {
        let mut h = Harness::new();
        h.engine.start(60, SessionKind::Focus);
        h.step();
        h.engine.reset(300, SessionKind::ShortBreak);
        h.drain();

        // A tick that was due before the reset lands afterwards
        h.step();
        h.step();

        assert!(h.drain().is_empty());
        let snapshot = h.engine.snapshot();
        assert_eq!(snapshot.seconds_remaining, 300);
        assert!(snapshot.is_idle());
    }

    #[test]
    fn test_double_start_schedules_once() {
        let h = Harness::new();
        h.engine.start(60, SessionKind::Focus);
        h.engine.start(60, SessionKind::Focus);
        assert_eq!(h.ticks.scheduled(), 1);
        assert_eq!(h.ticks.active(), 1);
    }

    #[test]
    fn test_throttled_ticks_catch_up() {
        let mut h = Harness::new();
        h.engine.start(600, SessionKind::Focus);
        h.drain();

        // Host throttled callbacks for 90 seconds, then one tick lands
        h.clock.advance_secs(90);
        h.ticks.fire();

        assert_eq!(
            h.drain(),
            vec![TimerSignal::Updated {
                seconds_remaining: 510,
                kind: SessionKind::Focus
            }]
        );
    }

    #[test]
    fn test_resync_before_start_emits_nothing() {
        let mut h = Harness::new();
        assert!(!h.engine.resync());
        assert!(h.drain().is_empty());
        assert_eq!(h.ticks.scheduled(), 0);
    }
}

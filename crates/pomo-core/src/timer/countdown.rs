//! Pure countdown state machine.
//!
//! Time is accounted in whole seconds against a monotonic reference instant.
//! Each tick computes how many whole seconds elapsed since the reference and
//! decrements by that amount, carrying the sub-second remainder forward. A
//! late or coalesced tick therefore catches up instead of losing time, and an
//! early tick changes nothing.
//!
//! Every transition that invalidates in-flight ticks (pause, reset,
//! completion, a new start) bumps the epoch. A tick carrying an older epoch is
//! ignored, so no tick scheduled before a reset can decrement the new value.

use std::time::{Duration, Instant};

use super::signal::TimerSignal;
use super::state::{RunState, TimerSnapshot};
use crate::session::SessionKind;

#[derive(Debug, Clone)]
pub struct Countdown {
    seconds_remaining: u32,
    run_state: RunState,
    kind: SessionKind,
    /// Instant up to which elapsed time has been accounted. Set only while running.
    reference: Option<Instant>,
    epoch: u64,
    started: bool,
}

impl Countdown {
    /// Creates an idle countdown showing `seconds` for `kind`.
    pub fn new(seconds: u32, kind: SessionKind) -> Self {
        Self {
            seconds_remaining: seconds,
            run_state: RunState::Idle,
            kind,
            reference: None,
            epoch: 0,
            started: false,
        }
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            seconds_remaining: self.seconds_remaining,
            run_state: self.run_state,
            kind: self.kind,
            started: self.started,
        }
    }

    /// Generation of the current run. Tick sources must pass it back to [`tick`](Self::tick).
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    pub fn has_started(&self) -> bool {
        self.started
    }

    /// Starts counting down from `seconds`.
    ///
    /// No-op when already running or when `seconds` is zero.
    pub fn start(&mut self, seconds: u32, kind: SessionKind, now: Instant) -> Vec<TimerSignal> {
        if self.run_state == RunState::Running || seconds == 0 {
            return Vec::new();
        }
        self.seconds_remaining = seconds;
        self.kind = kind;
        self.run_state = RunState::Running;
        self.reference = Some(now);
        self.started = true;
        self.epoch += 1;
        vec![self.updated()]
    }

    /// Pauses a running countdown.
    ///
    /// Whole seconds elapsed since the last tick are accounted first; the
    /// sub-second remainder is dropped. If that catch-up reaches zero the
    /// segment completes instead of pausing.
    pub fn pause(&mut self, now: Instant) -> Vec<TimerSignal> {
        if self.run_state != RunState::Running {
            return Vec::new();
        }
        let mut signals = self.advance(now);
        if self.run_state != RunState::Running {
            return signals;
        }
        self.run_state = RunState::Paused;
        self.reference = None;
        self.epoch += 1;
        signals.push(TimerSignal::Paused {
            seconds_remaining: self.seconds_remaining,
            kind: self.kind,
        });
        signals
    }

    /// Resumes a paused countdown from the preserved value.
    ///
    /// No-op when nothing remains, when already running, or when idle.
    pub fn resume(&mut self, now: Instant) -> Vec<TimerSignal> {
        if self.seconds_remaining == 0 || self.run_state != RunState::Paused {
            return Vec::new();
        }
        self.run_state = RunState::Running;
        self.reference = Some(now);
        self.epoch += 1;
        vec![TimerSignal::Resumed {
            seconds_remaining: self.seconds_remaining,
            kind: self.kind,
        }]
    }

    /// Unconditionally stops and shows `seconds` for `kind`.
    pub fn reset(&mut self, seconds: u32, kind: SessionKind) -> Vec<TimerSignal> {
        self.seconds_remaining = seconds;
        self.kind = kind;
        self.run_state = RunState::Idle;
        self.reference = None;
        self.epoch += 1;
        vec![self.updated()]
    }

    /// Handles a tick from the run identified by `epoch`.
    ///
    /// Ticks from a stale epoch, or arriving while not running, are ignored.
    pub fn tick(&mut self, epoch: u64, now: Instant) -> Vec<TimerSignal> {
        if epoch != self.epoch || self.run_state != RunState::Running {
            return Vec::new();
        }
        self.advance(now)
    }

    /// Recomputes the value from the reference clock and reissues it.
    ///
    /// Used after the host was backgrounded and ticks may have been throttled.
    /// Emits nothing if the countdown was never started.
    pub fn resync(&mut self, now: Instant) -> Vec<TimerSignal> {
        if !self.started {
            return Vec::new();
        }
        let mut signals = if self.run_state == RunState::Running {
            self.advance(now)
        } else {
            Vec::new()
        };
        if signals.is_empty() {
            signals.push(self.updated());
        }
        signals
    }

    fn advance(&mut self, now: Instant) -> Vec<TimerSignal> {
        let Some(reference) = self.reference else {
            return Vec::new();
        };
        let whole_secs = now.saturating_duration_since(reference).as_secs();
        if whole_secs == 0 {
            return Vec::new();
        }

        let decrement = whole_secs.min(u64::from(self.seconds_remaining)) as u32;
        self.seconds_remaining -= decrement;
        self.reference = Some(reference + Duration::from_secs(whole_secs));

        let mut signals = vec![self.updated()];
        if self.seconds_remaining == 0 {
            self.run_state = RunState::Idle;
            self.reference = None;
            self.epoch += 1;
            signals.push(TimerSignal::Completed { kind: self.kind });
        }
        signals
    }

    fn updated(&self) -> TimerSignal {
        TimerSignal::Updated {
            seconds_remaining: self.seconds_remaining,
            kind: self.kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    fn tick_at(countdown: &mut Countdown, at: Instant) -> Vec<TimerSignal> {
        let epoch = countdown.epoch();
        countdown.tick(epoch, at)
    }

    #[test]
    fn test_n_ticks_decrement_by_n() {
        let t0 = Instant::now();
        for seconds in [2u32, 5, 60, 1500] {
            let mut countdown = Countdown::new(0, SessionKind::Focus);
            countdown.start(seconds, SessionKind::Focus, t0);
            for n in 1..seconds.min(30) {
                tick_at(&mut countdown, t0 + secs(u64::from(n)));
                let snapshot = countdown.snapshot();
                assert_eq!(snapshot.seconds_remaining, seconds - n);
                assert_eq!(snapshot.run_state, RunState::Running);
            }
        }
    }

    #[test]
    fn test_five_ticks_complete_exactly_once() {
        let t0 = Instant::now();
        let mut countdown = Countdown::new(0, SessionKind::Focus);
        countdown.start(5, SessionKind::Focus, t0);

        let mut signals = Vec::new();
        for n in 1..=5 {
            signals.extend(tick_at(&mut countdown, t0 + secs(n)));
        }
        // Extra ticks after completion, with the old and the new epoch
        signals.extend(countdown.tick(1, t0 + secs(6)));
        signals.extend(tick_at(&mut countdown, t0 + secs(7)));

        let completions: Vec<_> = signals.iter().filter(|s| s.is_completion()).collect();
        assert_eq!(completions.len(), 1);
        assert_eq!(completions[0].kind(), SessionKind::Focus);
        assert_eq!(countdown.snapshot().run_state, RunState::Idle);
        assert_eq!(countdown.snapshot().seconds_remaining, 0);
    }

    #[test]
    fn test_early_tick_changes_nothing() {
        let t0 = Instant::now();
        let mut countdown = Countdown::new(0, SessionKind::Focus);
        countdown.start(10, SessionKind::Focus, t0);

        assert!(tick_at(&mut countdown, t0 + Duration::from_millis(999)).is_empty());
        assert_eq!(countdown.snapshot().seconds_remaining, 10);

        // The sub-second remainder carries over
        tick_at(&mut countdown, t0 + Duration::from_millis(1500));
        tick_at(&mut countdown, t0 + Duration::from_millis(2001));
        assert_eq!(countdown.snapshot().seconds_remaining, 8);
    }

    #[test]
    fn test_late_tick_catches_up_with_one_update() {
        let t0 = Instant::now();
        let mut countdown = Countdown::new(0, SessionKind::ShortBreak);
        countdown.start(300, SessionKind::ShortBreak, t0);

        let signals = tick_at(&mut countdown, t0 + secs(42));
        assert_eq!(
            signals,
            vec![TimerSignal::Updated {
                seconds_remaining: 258,
                kind: SessionKind::ShortBreak
            }]
        );
    }

    #[test]
    fn test_catch_up_past_zero_clamps_and_completes() {
        let t0 = Instant::now();
        let mut countdown = Countdown::new(0, SessionKind::LongBreak);
        countdown.start(3, SessionKind::LongBreak, t0);

        let signals = tick_at(&mut countdown, t0 + secs(100));
        assert_eq!(
            signals,
            vec![
                TimerSignal::Updated {
                    seconds_remaining: 0,
                    kind: SessionKind::LongBreak
                },
                TimerSignal::Completed {
                    kind: SessionKind::LongBreak
                },
            ]
        );
    }

    #[test]
    fn test_pause_freezes_value() {
        let t0 = Instant::now();
        let mut countdown = Countdown::new(0, SessionKind::Focus);
        countdown.start(60, SessionKind::Focus, t0);
        tick_at(&mut countdown, t0 + secs(1));

        let stale_epoch = countdown.epoch();
        let signals = countdown.pause(t0 + Duration::from_millis(1800));
        assert_eq!(
            signals.last(),
            Some(&TimerSignal::Paused {
                seconds_remaining: 59,
                kind: SessionKind::Focus
            })
        );

        for n in 2..100 {
            assert!(countdown.tick(stale_epoch, t0 + secs(n)).is_empty());
            assert!(tick_at(&mut countdown, t0 + secs(n)).is_empty());
        }
        assert_eq!(countdown.snapshot().seconds_remaining, 59);
        assert!(countdown.snapshot().is_paused());
    }

    #[test]
    fn test_pause_accounts_elapsed_whole_seconds() {
        let t0 = Instant::now();
        let mut countdown = Countdown::new(0, SessionKind::Focus);
        countdown.start(60, SessionKind::Focus, t0);

        // No tick was delivered, but three seconds passed
        let signals = countdown.pause(t0 + Duration::from_millis(3400));
        assert_eq!(signals.len(), 2);
        assert_eq!(countdown.snapshot().seconds_remaining, 57);
    }

    #[test]
    fn test_resume_recaptures_reference() {
        let t0 = Instant::now();
        let mut countdown = Countdown::new(0, SessionKind::Focus);
        countdown.start(60, SessionKind::Focus, t0);
        countdown.pause(t0 + secs(10));
        assert_eq!(countdown.snapshot().seconds_remaining, 50);

        // Paused for a long while
        let resumed_at = t0 + secs(500);
        let signals = countdown.resume(resumed_at);
        assert!(matches!(signals[..], [TimerSignal::Resumed { seconds_remaining: 50, .. }]));

        tick_at(&mut countdown, resumed_at + secs(1));
        assert_eq!(countdown.snapshot().seconds_remaining, 49);
    }

    #[test]
    fn test_misuse_is_noop() {
        let t0 = Instant::now();
        let mut countdown = Countdown::new(10, SessionKind::Focus);

        // Not running
        assert!(countdown.pause(t0).is_empty());
        // Idle, not paused
        assert!(countdown.resume(t0).is_empty());
        // Zero seconds
        assert!(countdown.start(0, SessionKind::Focus, t0).is_empty());
        assert!(!countdown.has_started());

        countdown.start(10, SessionKind::Focus, t0);
        let epoch = countdown.epoch();
        // Double start keeps the running segment
        assert!(countdown.start(99, SessionKind::LongBreak, t0 + secs(1)).is_empty());
        assert_eq!(countdown.epoch(), epoch);
        assert_eq!(countdown.snapshot().seconds_remaining, 10);
        // Resume while running
        assert!(countdown.resume(t0 + secs(1)).is_empty());
    }

    #[test]
    fn test_resume_after_completion_is_noop() {
        let t0 = Instant::now();
        let mut countdown = Countdown::new(0, SessionKind::Focus);
        countdown.start(1, SessionKind::Focus, t0);
        tick_at(&mut countdown, t0 + secs(1));
        assert!(countdown.resume(t0 + secs(2)).is_empty());
    }

    #[test]
    fn test_reset_from_any_state() {
        let t0 = Instant::now();

        let mut idle = Countdown::new(30, SessionKind::Focus);
        let mut running = Countdown::new(0, SessionKind::Focus);
        running.start(30, SessionKind::Focus, t0);
        let mut paused = Countdown::new(0, SessionKind::Focus);
        paused.start(30, SessionKind::Focus, t0);
        paused.pause(t0 + secs(3));

        for countdown in [&mut idle, &mut running, &mut paused] {
            let stale_epoch = countdown.epoch();
            let signals = countdown.reset(300, SessionKind::ShortBreak);
            assert_eq!(
                signals,
                vec![TimerSignal::Updated {
                    seconds_remaining: 300,
                    kind: SessionKind::ShortBreak
                }]
            );
            // A tick scheduled before the reset must not land
            assert!(countdown.tick(stale_epoch, t0 + secs(10)).is_empty());
            let snapshot = countdown.snapshot();
            assert_eq!(snapshot.seconds_remaining, 300);
            assert_eq!(snapshot.run_state, RunState::Idle);
        }
    }

    #[test]
    fn test_resync_never_started_is_silent() {
        let mut countdown = Countdown::new(1500, SessionKind::Focus);
        assert!(countdown.resync(Instant::now()).is_empty());
        countdown.reset(300, SessionKind::ShortBreak);
        assert!(countdown.resync(Instant::now()).is_empty());
    }

    #[test]
    fn test_resync_catches_up_running_and_reissues_paused() {
        let t0 = Instant::now();
        let mut countdown = Countdown::new(0, SessionKind::Focus);
        countdown.start(600, SessionKind::Focus, t0);

        let signals = countdown.resync(t0 + secs(125));
        assert_eq!(
            signals,
            vec![TimerSignal::Updated {
                seconds_remaining: 475,
                kind: SessionKind::Focus
            }]
        );

        countdown.pause(t0 + secs(126));
        let signals = countdown.resync(t0 + secs(900));
        assert_eq!(
            signals,
            vec![TimerSignal::Updated {
                seconds_remaining: 474,
                kind: SessionKind::Focus
            }]
        );
    }
}

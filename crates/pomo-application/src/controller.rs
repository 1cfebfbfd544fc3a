//! Timer controller.
//!
//! Ties the engine, coordinator, dispatcher and settings together into the
//! end-to-end flow: user action -> coordinator + engine -> ticks -> completion
//! -> notify -> capture -> close record -> rotation -> prime the next segment.

use pomo_core::accomplishment::AccomplishmentCapture;
use pomo_core::identity::IdentityProvider;
use pomo_core::rotation::{next_duration, next_kind, pomodoros_until_long_break};
use pomo_core::session::{SessionGateway, SessionKind, SessionRecord};
use pomo_core::settings::Settings;
use pomo_core::timer::{RunState, TimerSignal, TimerSnapshot, format_clock};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::coordinator::{CompletedSegment, SessionCoordinator};
use crate::dispatcher::{DispatchReport, NotificationDispatcher};
use crate::engine::CountdownEngine;
use crate::settings_service::{LoadedSettings, SettingsService};

/// What the controller reports to the front end.
#[derive(Debug)]
pub enum ControllerEvent {
    /// Forwarded engine signal.
    Timer(TimerSignal),
    /// Last completed focus segment, fetched when a focus segment starts.
    PreviousSession(SessionRecord),
    /// A completion was fully processed and the next segment primed.
    SegmentFinished {
        completed: CompletedSegment,
        next: SessionKind,
        next_seconds: u32,
    },
    Notified(DispatchReport),
    AutoStarted(SessionKind),
}

/// Collaborators the controller drives.
pub struct TimerServices {
    pub engine: CountdownEngine,
    pub coordinator: Arc<SessionCoordinator>,
    pub dispatcher: Arc<NotificationDispatcher>,
    pub settings: Arc<SettingsService>,
    pub capture: Arc<dyn AccomplishmentCapture>,
    pub sessions: Arc<dyn SessionGateway>,
    pub identity: Arc<dyn IdentityProvider>,
}

/// One-line summary of the timer for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusLine {
    pub kind: SessionKind,
    pub seconds_remaining: u32,
    pub run_state: RunState,
    pub pomodoros_completed: u32,
    pub until_long_break: u32,
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}",
            self.kind.label(),
            format_clock(self.seconds_remaining)
        )?;
        if self.run_state == RunState::Paused {
            write!(f, " [paused]")?;
        }
        write!(
            f,
            " | next long break in {} {}",
            self.until_long_break,
            if self.until_long_break == 1 {
                "pomodoro"
            } else {
                "pomodoros"
            }
        )
    }
}

pub struct TimerController {
    services: TimerServices,
    events: mpsc::UnboundedSender<ControllerEvent>,
    completing: AtomicBool,
}

impl TimerController {
    pub fn new(services: TimerServices) -> (Arc<Self>, mpsc::UnboundedReceiver<ControllerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let controller = Arc::new(Self {
            services,
            events: tx,
            completing: AtomicBool::new(false),
        });
        (controller, rx)
    }

    /// Loads settings and the local rotation counter, then primes a focus segment.
    pub async fn initialize(&self) -> LoadedSettings {
        let loaded = self.services.settings.load().await;
        self.services.coordinator.load_local().await;
        self.services.engine.reset(
            next_duration(SessionKind::Focus, &loaded.settings),
            SessionKind::Focus,
        );
        tracing::info!(
            "[TimerController] Initialized (tick source: {})",
            self.services.engine.tick_source_name()
        );
        loaded
    }

    fn settings(&self) -> Settings {
        self.services.settings.current()
    }

    fn emit(&self, event: ControllerEvent) {
        let _ = self.events.send(event);
    }

    /// Whether a natural completion is queued or being processed.
    ///
    /// The engine reports `Completed` through the signal channel, so a
    /// countdown can sit at zero with its segment still open before the
    /// completion flow picks it up. User actions are ignored until it has.
    fn completion_pending(&self) -> bool {
        let pending = self.completing.load(Ordering::SeqCst)
            || (self.services.engine.snapshot().is_finished()
                && self.services.coordinator.has_open_segment());
        if pending {
            tracing::debug!("[TimerController] Ignoring action during completion");
        }
        pending
    }

    /// Accounts elapsed time and stops the ticker before an abandon.
    ///
    /// # Returns
    ///
    /// The settled snapshot, or `None` if the catch-up reached zero and the
    /// segment is now waiting on the completion flow instead.
    fn settle(&self) -> Option<TimerSnapshot> {
        self.services.engine.pause();
        if self.completion_pending() {
            return None;
        }
        Some(self.services.engine.snapshot())
    }

    /// Start when idle, pause when running, resume when paused.
    pub fn toggle(&self) {
        match self.services.engine.snapshot().run_state {
            RunState::Idle => self.start(),
            RunState::Running => self.pause(),
            RunState::Paused => self.resume(),
        }
    }

    /// Starts the primed segment. Only acts when idle.
    pub fn start(&self) {
        if self.completion_pending() {
            return;
        }
        let snapshot = self.services.engine.snapshot();
        match snapshot.run_state {
            RunState::Idle => {}
            RunState::Paused => return self.resume(),
            RunState::Running => return,
        }

        let kind = snapshot.kind;
        let seconds = if snapshot.seconds_remaining > 0 {
            snapshot.seconds_remaining
        } else {
            next_duration(kind, &self.settings())
        };

        if kind.is_focus() && self.services.identity.is_authenticated() {
            self.spawn_previous_session_fetch();
        }
        self.services.coordinator.begin_segment(kind, seconds);
        self.services.engine.start(seconds, kind);
    }

    pub fn pause(&self) {
        if self.completion_pending() {
            return;
        }
        self.services.engine.pause();
    }

    pub fn resume(&self) {
        if self.completion_pending() {
            return;
        }
        self.services.engine.resume();
    }

    /// Abandons the current segment and restores its full duration, idle.
    pub fn reset(&self) {
        if self.completion_pending() {
            return;
        }
        let Some(snapshot) = self.settle() else {
            return;
        };
        self.abandon_open(snapshot.seconds_remaining);
        self.services
            .engine
            .reset(next_duration(snapshot.kind, &self.settings()), snapshot.kind);
    }

    /// Makes `kind` current, abandoning any open segment.
    pub fn switch_kind(&self, kind: SessionKind) {
        if self.completion_pending() {
            return;
        }
        let Some(snapshot) = self.settle() else {
            return;
        };
        self.abandon_open(snapshot.seconds_remaining);
        self.services
            .engine
            .reset(next_duration(kind, &self.settings()), kind);
        tracing::info!("[TimerController] Switched to {}", kind);
    }

    /// Re-primes an idle timer after a settings change.
    ///
    /// A running or paused segment keeps its duration.
    pub fn apply_settings(&self, settings: &Settings) {
        let snapshot = self.services.engine.snapshot();
        if snapshot.is_idle() && !self.services.coordinator.has_open_segment() {
            self.services
                .engine
                .reset(next_duration(snapshot.kind, settings), snapshot.kind);
        }
    }

    pub fn reset_rotation(&self) {
        self.services.coordinator.reset_rotation();
    }

    pub fn status(&self) -> StatusLine {
        let snapshot = self.services.engine.snapshot();
        let pomodoros_completed = self.services.coordinator.pomodoros_completed();
        StatusLine {
            kind: snapshot.kind,
            seconds_remaining: snapshot.seconds_remaining,
            run_state: snapshot.run_state,
            pomodoros_completed,
            until_long_break: pomodoros_until_long_break(
                pomodoros_completed,
                self.settings().long_break_interval,
            ),
        }
    }

    /// Forwards a signal and runs the completion flow when it is one.
    pub async fn handle_signal(&self, signal: TimerSignal) {
        self.emit(ControllerEvent::Timer(signal));
        if let TimerSignal::Completed { kind } = signal {
            self.complete(kind).await;
        }
    }

    /// Processes engine signals until the channel closes or `cancel` fires.
    pub async fn run(
        &self,
        mut signals: mpsc::UnboundedReceiver<TimerSignal>,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                signal = signals.recv() => match signal {
                    Some(signal) => self.handle_signal(signal).await,
                    None => break,
                },
            }
        }
        tracing::debug!("[TimerController] Signal loop stopped");
    }

    /// Closes an open segment and waits for pending persistence.
    ///
    /// A segment that already ran to zero but was never processed is closed
    /// as completed without notes; anything else is abandoned with the
    /// elapsed time accounted up to now.
    pub async fn shutdown(&self) {
        self.services.engine.pause();
        let snapshot = self.services.engine.snapshot();
        if snapshot.is_finished() {
            if self.services.coordinator.complete_segment(None).is_some() {
                tracing::info!(
                    "[TimerController] Recorded unprocessed {} completion",
                    snapshot.kind
                );
            }
        } else {
            self.abandon_open(snapshot.seconds_remaining);
        }
        self.services.coordinator.flush().await;
        tracing::info!("[TimerController] Shut down");
    }

    fn abandon_open(&self, seconds_remaining: u32) {
        self.services.coordinator.abandon_segment_at(seconds_remaining);
    }

    fn spawn_previous_session_fetch(&self) {
        let sessions = self.services.sessions.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            match sessions.previous_completed_focus_session().await {
                Ok(Some(record)) => {
                    let _ = events.send(ControllerEvent::PreviousSession(record));
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::debug!("[TimerController] Previous session unavailable: {}", e);
                }
            }
        });
    }

    /// Whether a `Completed` signal for `kind` still describes the current
    /// state. A reset or switch that raced the final tick leaves a stale one.
    fn completion_is_current(&self, kind: SessionKind) -> bool {
        let snapshot = self.services.engine.snapshot();
        snapshot.is_finished()
            && snapshot.kind == kind
            && self
                .services
                .coordinator
                .open_segment()
                .is_some_and(|(open_kind, _)| open_kind == kind)
    }

    async fn complete(&self, kind: SessionKind) {
        self.completing.store(true, Ordering::SeqCst);
        if !self.completion_is_current(kind) {
            tracing::debug!("[TimerController] Discarding stale {} completion", kind);
            self.completing.store(false, Ordering::SeqCst);
            return;
        }

        let report = self.services.dispatcher.notify(kind).await;
        self.emit(ControllerEvent::Notified(report));

        let notes = if kind.is_focus() {
            Some(self.services.capture.capture(kind).await)
        } else {
            None
        };

        let Some(completed) = self.services.coordinator.complete_segment(notes.as_deref()) else {
            tracing::warn!("[TimerController] {} completed with no open segment", kind);
            self.completing.store(false, Ordering::SeqCst);
            return;
        };

        let settings = self.settings();
        let next = next_kind(
            completed.kind,
            completed.pomodoros_completed,
            settings.long_break_interval,
        );
        let next_seconds = next_duration(next, &settings);
        self.services.engine.reset(next_seconds, next);
        self.emit(ControllerEvent::SegmentFinished {
            completed,
            next,
            next_seconds,
        });
        self.completing.store(false, Ordering::SeqCst);

        if settings.auto_starts(next) {
            tracing::info!("[TimerController] Auto-starting {}", next);
            self.start();
            self.emit(ControllerEvent::AutoStarted(next));
        }
    }
}

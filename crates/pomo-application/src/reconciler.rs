//! Visibility reconciler.
//!
//! Reacts to the host going to the background and coming back. On return it
//! asks the engine to recompute its value from the reference clock and
//! reissue it, so anything showing a stale value catches up. It never
//! changes the remaining time itself.

use pomo_core::timer::{Clock, Visibility};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::engine::CountdownEngine;

/// Background gaps longer than this are logged on return.
const LONG_GAP: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Transition needs no action (backgrounding, or a repeated foreground event).
    Ignored,
    /// Foreground return, but no timer was ever started. Nothing emitted.
    NotStarted,
    /// Foreground return; the engine reissued its current value.
    Resynced,
}

pub struct VisibilityReconciler {
    engine: CountdownEngine,
    clock: Arc<dyn Clock>,
    hidden_since: Mutex<Option<Instant>>,
}

impl VisibilityReconciler {
    pub fn new(engine: CountdownEngine, clock: Arc<dyn Clock>) -> Self {
        Self {
            engine,
            clock,
            hidden_since: Mutex::new(None),
        }
    }

    /// Handles a single visibility transition.
    pub fn handle(&self, visibility: Visibility) -> ReconcileOutcome {
        let mut hidden_since = self
            .hidden_since
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        match visibility {
            Visibility::Background => {
                hidden_since.get_or_insert_with(|| self.clock.now());
                tracing::debug!("[Reconciler] Host backgrounded");
                ReconcileOutcome::Ignored
            }
            Visibility::Foreground => {
                if let Some(since) = hidden_since.take() {
                    let gap = self.clock.now().saturating_duration_since(since);
                    if gap > LONG_GAP {
                        tracing::info!("[Reconciler] Host returned after {:?} in background", gap);
                    }
                }
                if self.engine.resync() {
                    ReconcileOutcome::Resynced
                } else {
                    ReconcileOutcome::NotStarted
                }
            }
        }
    }

    /// Consumes visibility events until the channel closes or `cancel` fires.
    pub async fn run(
        &self,
        mut events: mpsc::UnboundedReceiver<Visibility>,
        cancel: CancellationToken,
    ) {
        tracing::debug!("[Reconciler] Listening for visibility changes");
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                event = events.recv() => match event {
                    Some(visibility) => {
                        self.handle(visibility);
                    }
                    None => break,
                },
            }
        }
        tracing::debug!("[Reconciler] Stopped");
    }
}

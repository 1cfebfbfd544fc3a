//! Session lifecycle coordinator.
//!
//! Maps countdown segments onto persisted session records and owns the
//! rotation counter. Per segment the state machine is
//! `NoSession -> SessionOpen -> NoSession`.
//!
//! Façade calls are fire-and-forget: each is spawned onto a [`TaskChain`] so
//! the open of a segment always lands before its close, and a close before
//! the next open, without the caller ever waiting on the network. Failures
//! are logged and swallowed; local state stays authoritative.

use chrono::{DateTime, Utc};
use pomo_core::identity::IdentityProvider;
use pomo_core::local_store::LocalFallback;
use pomo_core::rotation::RotationState;
use pomo_core::session::{
    NewSession, SessionGateway, SessionKind, SessionUpdate, normalize_notes,
};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use crate::task_chain::TaskChain;

/// Server-assigned id of a record, filled in once its create call returns.
type RecordSlot = Arc<OnceLock<String>>;

#[derive(Debug, Clone)]
struct OpenSegment {
    kind: SessionKind,
    planned_secs: u32,
    started_at: DateTime<Utc>,
    /// `None` for anonymous segments, which are never persisted.
    record: Option<RecordSlot>,
}

#[derive(Debug, Clone)]
enum SegmentState {
    NoSession,
    SessionOpen(OpenSegment),
}

struct CoordinatorState {
    segment: SegmentState,
    rotation: RotationState,
}

/// Result of a natural completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletedSegment {
    pub kind: SessionKind,
    /// Rotation counter after counting this segment.
    pub pomodoros_completed: u32,
}

pub struct SessionCoordinator {
    sessions: Arc<dyn SessionGateway>,
    identity: Arc<dyn IdentityProvider>,
    local: LocalFallback,
    state: Mutex<CoordinatorState>,
    remote_chain: TaskChain,
    local_chain: TaskChain,
}

impl SessionCoordinator {
    pub fn new(
        sessions: Arc<dyn SessionGateway>,
        identity: Arc<dyn IdentityProvider>,
        local: LocalFallback,
    ) -> Self {
        Self {
            sessions,
            identity,
            local,
            state: Mutex::new(CoordinatorState {
                segment: SegmentState::NoSession,
                rotation: RotationState::default(),
            }),
            remote_chain: TaskChain::new(),
            local_chain: TaskChain::new(),
        }
    }

    /// Restores the rotation counter from local storage.
    ///
    /// A missing or unreadable value leaves the counter at 0.
    pub async fn load_local(&self) -> u32 {
        let count = match self.local.load_pomodoros_completed().await {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!("[Coordinator] Failed to read local rotation counter: {}", e);
                0
            }
        };
        self.lock().rotation = RotationState::new(count);
        tracing::debug!("[Coordinator] Restored pomodoros completed: {}", count);
        count
    }

    /// Opens a segment of `kind` planned for `duration_secs`.
    ///
    /// Any segment still open is abandoned first. When an identity is present
    /// a record is created in the background; anonymous segments are tracked
    /// locally only.
    pub fn begin_segment(&self, kind: SessionKind, duration_secs: u32) {
        let mut state = self.lock();
        if let SegmentState::SessionOpen(previous) = &state.segment {
            tracing::warn!(
                "[Coordinator] Segment {} still open at begin; abandoning it",
                previous.kind
            );
            self.close_abandoned(&mut state, None);
        }

        let started_at = Utc::now();
        let record = if self.identity.is_authenticated() {
            let slot: RecordSlot = Arc::new(OnceLock::new());
            self.spawn_create(
                NewSession::new(kind, duration_secs, started_at),
                slot.clone(),
            );
            Some(slot)
        } else {
            tracing::debug!("[Coordinator] Anonymous {} segment; not persisted", kind);
            None
        };

        state.segment = SegmentState::SessionOpen(OpenSegment {
            kind,
            planned_secs: duration_secs,
            started_at,
            record,
        });
        tracing::info!("[Coordinator] Opened {} segment ({}s)", kind, duration_secs);
    }

    /// Abandons the open segment, recording `planned - seconds_remaining` as
    /// the actual duration.
    ///
    /// # Returns
    ///
    /// `true` if a segment was open.
    pub fn abandon_segment_at(&self, seconds_remaining: u32) -> bool {
        let mut state = self.lock();
        self.close_abandoned(&mut state, Some(seconds_remaining))
    }

    /// Closes the open segment as completed.
    ///
    /// # Arguments
    ///
    /// * `notes` - Accomplishment text; trimmed and capped, empty means none
    ///
    /// # Returns
    ///
    /// - `Some(completed)`: A segment was open and is now closed
    /// - `None`: Nothing was open; no-op
    pub fn complete_segment(&self, notes: Option<&str>) -> Option<CompletedSegment> {
        let mut state = self.lock();
        let SegmentState::SessionOpen(open) =
            std::mem::replace(&mut state.segment, SegmentState::NoSession)
        else {
            tracing::debug!("[Coordinator] complete_segment with nothing open");
            return None;
        };

        let notes = notes.map(normalize_notes).filter(|n| !n.is_empty());
        if let Some(slot) = open.record {
            let update = SessionUpdate::completed(Utc::now(), open.planned_secs, notes);
            self.spawn_update(slot, update);
        }

        let before = state.rotation.pomodoros_completed;
        let pomodoros_completed = state.rotation.record_completion(open.kind);
        if pomodoros_completed != before {
            self.spawn_save_counter(pomodoros_completed);
        }

        tracing::info!(
            "[Coordinator] Completed {} segment (pomodoros completed: {})",
            open.kind,
            pomodoros_completed
        );
        Some(CompletedSegment {
            kind: open.kind,
            pomodoros_completed,
        })
    }

    pub fn pomodoros_completed(&self) -> u32 {
        self.lock().rotation.pomodoros_completed
    }

    /// Sets the rotation counter back to 0 and writes it locally.
    pub fn reset_rotation(&self) {
        self.lock().rotation.reset();
        self.spawn_save_counter(0);
        tracing::info!("[Coordinator] Rotation counter reset");
    }

    pub fn has_open_segment(&self) -> bool {
        matches!(self.lock().segment, SegmentState::SessionOpen(_))
    }

    /// Kind and start time of the open segment, if any.
    pub fn open_segment(&self) -> Option<(SessionKind, DateTime<Utc>)> {
        match &self.lock().segment {
            SegmentState::SessionOpen(open) => Some((open.kind, open.started_at)),
            SegmentState::NoSession => None,
        }
    }

    /// Waits for every façade call and local write issued so far.
    pub async fn flush(&self) {
        self.remote_chain.flush().await;
        self.local_chain.flush().await;
    }

    fn lock(&self) -> MutexGuard<'_, CoordinatorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn close_abandoned(&self, state: &mut CoordinatorState, seconds_remaining: Option<u32>) -> bool {
        let SegmentState::SessionOpen(open) =
            std::mem::replace(&mut state.segment, SegmentState::NoSession)
        else {
            return false;
        };

        let actual = seconds_remaining.map(|left| open.planned_secs.saturating_sub(left));
        if let Some(slot) = open.record {
            self.spawn_update(slot, SessionUpdate::abandoned(Utc::now(), actual));
        }
        tracing::info!("[Coordinator] Abandoned {} segment", open.kind);
        true
    }

    fn spawn_create(&self, new_session: NewSession, slot: RecordSlot) {
        let sessions = self.sessions.clone();
        self.remote_chain.enqueue(async move {
            match sessions.create_session(&new_session).await {
                Ok(record) => {
                    tracing::debug!("[Coordinator] Session record {} opened", record.id);
                    let _ = slot.set(record.id);
                }
                Err(e) => {
                    tracing::warn!(
                        "[Coordinator] Failed to open {} session record: {}",
                        new_session.kind,
                        e
                    );
                }
            }
        });
    }

    fn spawn_update(&self, slot: RecordSlot, update: SessionUpdate) {
        let sessions = self.sessions.clone();
        self.remote_chain.enqueue(async move {
            // The create ran earlier on the same chain; no id means it failed.
            let Some(id) = slot.get() else {
                tracing::warn!("[Coordinator] No session record to close; open call failed");
                return;
            };
            if let Err(e) = sessions.update_session(id, &update).await {
                tracing::warn!("[Coordinator] Failed to close session record {}: {}", id, e);
            }
        });
    }

    fn spawn_save_counter(&self, count: u32) {
        let local = self.local.clone();
        self.local_chain.enqueue(async move {
            if let Err(e) = local.save_pomodoros_completed(count).await {
                tracing::warn!("[Coordinator] Failed to write local rotation counter: {}", e);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pomo_core::identity::{Anonymous, Identity, StaticIdentity};
    use pomo_core::local_store::InMemoryKeyValueStore;
    use pomo_infrastructure::InMemoryPomoApi;

    fn coordinator(
        authenticated: bool,
    ) -> (Arc<InMemoryPomoApi>, LocalFallback, SessionCoordinator) {
        let api = Arc::new(InMemoryPomoApi::new());
        let local = LocalFallback::new(Arc::new(InMemoryKeyValueStore::new()));
        let identity: Arc<dyn IdentityProvider> = if authenticated {
            Arc::new(StaticIdentity(Identity::new("user-1")))
        } else {
            Arc::new(Anonymous)
        };
        let coordinator = SessionCoordinator::new(api.clone(), identity, local.clone());
        (api, local, coordinator)
    }

    #[tokio::test]
    async fn test_begin_then_complete_closes_record() {
        let (api, _local, c) = coordinator(true);

        c.begin_segment(SessionKind::Focus, 1500);
        assert!(c.has_open_segment());
        let done = c.complete_segment(Some("  shipped it  ")).unwrap();
        c.flush().await;

        assert_eq!(done.kind, SessionKind::Focus);
        assert_eq!(done.pomodoros_completed, 1);
        let sessions = api.sessions();
        assert_eq!(sessions.len(), 1);
        assert!(sessions[0].completed);
        assert_eq!(sessions[0].actual_duration_secs, Some(1500));
        assert_eq!(sessions[0].notes.as_deref(), Some("shipped it"));
    }

    #[tokio::test]
    async fn test_rapid_begins_leave_one_open_record() {
        let (api, _local, c) = coordinator(true);

        for _ in 0..5 {
            c.begin_segment(SessionKind::Focus, 1500);
        }
        c.flush().await;

        assert_eq!(api.sessions().len(), 5);
        assert_eq!(api.open_sessions(), 1);
    }

    #[tokio::test]
    async fn test_complete_without_open_segment_is_noop() {
        let (api, _local, c) = coordinator(true);
        assert!(c.complete_segment(None).is_none());
        assert!(!c.abandon_segment_at(0));
        c.flush().await;
        assert_eq!(api.call_count(), 0);
        assert_eq!(c.pomodoros_completed(), 0);
    }

    #[tokio::test]
    async fn test_abandon_records_progress_and_never_counts() {
        let (api, _local, c) = coordinator(true);

        c.begin_segment(SessionKind::Focus, 1500);
        assert!(c.abandon_segment_at(900));
        c.flush().await;

        let record = &api.sessions()[0];
        assert!(!record.completed);
        assert!(record.ended_at.is_some());
        assert_eq!(record.actual_duration_secs, Some(600));
        assert_eq!(c.pomodoros_completed(), 0);
    }

    #[tokio::test]
    async fn test_breaks_do_not_increment_counter() {
        let (_api, _local, c) = coordinator(true);
        c.begin_segment(SessionKind::ShortBreak, 300);
        let done = c.complete_segment(None).unwrap();
        assert_eq!(done.pomodoros_completed, 0);
        c.begin_segment(SessionKind::LongBreak, 900);
        c.complete_segment(None);
        assert_eq!(c.pomodoros_completed(), 0);
    }

    #[tokio::test]
    async fn test_anonymous_makes_no_facade_calls_and_writes_locally() {
        let (api, local, c) = coordinator(false);

        c.begin_segment(SessionKind::Focus, 1500);
        let done = c.complete_segment(Some("notes")).unwrap();
        c.flush().await;

        assert_eq!(done.pomodoros_completed, 1);
        assert_eq!(api.call_count(), 0);
        assert_eq!(local.load_pomodoros_completed().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_offline_failures_are_swallowed() {
        let (api, local, c) = coordinator(true);
        api.set_offline(true);

        c.begin_segment(SessionKind::Focus, 1500);
        let done = c.complete_segment(None).unwrap();
        c.flush().await;

        assert_eq!(done.pomodoros_completed, 1);
        // Only the create reached the façade; the close had no id to target
        assert_eq!(api.call_count(), 1);
        assert_eq!(local.load_pomodoros_completed().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_load_local_and_reset_rotation() {
        let (_api, local, c) = coordinator(false);
        local.save_pomodoros_completed(3).await.unwrap();

        assert_eq!(c.load_local().await, 3);
        c.begin_segment(SessionKind::Focus, 1500);
        assert_eq!(c.complete_segment(None).unwrap().pomodoros_completed, 4);

        c.reset_rotation();
        c.flush().await;
        assert_eq!(c.pomodoros_completed(), 0);
        assert_eq!(local.load_pomodoros_completed().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_empty_notes_are_dropped() {
        let (api, _local, c) = coordinator(true);
        c.begin_segment(SessionKind::Focus, 1500);
        c.complete_segment(Some("   "));
        c.flush().await;
        assert_eq!(api.sessions()[0].notes, None);
    }
}

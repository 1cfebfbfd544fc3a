//! In-memory persistence façade.
//!
//! Enforces the same field contracts as the HTTP façade (planned duration
//! bounds, note length, settings bounds, record ownership) so it can stand in
//! for it in tests and offline runs. Calendar days are UTC.

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use pomo_core::error::{PomoError, Result};
use pomo_core::session::{NewSession, SessionGateway, SessionKind, SessionRecord, SessionUpdate};
use pomo_core::settings::{Settings, SettingsGateway};
use pomo_core::stats::{DailyStat, DailyStatsReport, StatsGateway, StatsSummary};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

#[derive(Default)]
struct ApiState {
    sessions: Vec<SessionRecord>,
    settings: Option<Settings>,
}

#[derive(Default)]
pub struct InMemoryPomoApi {
    state: Mutex<ApiState>,
    offline: AtomicBool,
    calls: AtomicUsize,
}

impl InMemoryPomoApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds stored settings, as if a previous client had saved them.
    pub fn with_settings(settings: Settings) -> Self {
        let api = Self::new();
        api.lock().settings = Some(settings);
        api
    }

    /// While offline every call fails with a network error.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of façade calls received, including failed ones.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn sessions(&self) -> Vec<SessionRecord> {
        self.lock().sessions.clone()
    }

    pub fn open_sessions(&self) -> usize {
        self.lock().sessions.iter().filter(|s| s.is_open()).count()
    }

    pub fn stored_settings(&self) -> Option<Settings> {
        self.lock().settings
    }

    /// Inserts a record directly, bypassing validation. Used to seed history.
    pub fn insert_record(&self, record: SessionRecord) {
        self.lock().sessions.push(record);
    }

    fn lock(&self) -> MutexGuard<'_, ApiState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn enter(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(PomoError::network("connection refused (offline)"));
        }
        Ok(())
    }
}

#[async_trait]
impl SessionGateway for InMemoryPomoApi {
    async fn create_session(&self, new_session: &NewSession) -> Result<SessionRecord> {
        self.enter()?;
        new_session.validate()?;

        let record = SessionRecord {
            id: Uuid::new_v4().to_string(),
            kind: new_session.kind,
            planned_duration_secs: new_session.planned_duration_secs,
            actual_duration_secs: None,
            completed: false,
            started_at: new_session.started_at,
            ended_at: None,
            tags: new_session.tags.clone(),
            notes: new_session.notes.clone(),
        };
        self.lock().sessions.push(record.clone());
        Ok(record)
    }

    async fn update_session(&self, id: &str, update: &SessionUpdate) -> Result<SessionRecord> {
        self.enter()?;
        update.validate()?;

        let mut state = self.lock();
        let record = state
            .sessions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| PomoError::not_found("SessionRecord", id))?;
        record.apply(update);
        Ok(record.clone())
    }

    async fn previous_completed_focus_session(&self) -> Result<Option<SessionRecord>> {
        self.enter()?;
        Ok(self
            .lock()
            .sessions
            .iter()
            .filter(|s| s.kind == SessionKind::Focus && s.completed)
            .max_by_key(|s| s.ended_at)
            .cloned())
    }
}

#[async_trait]
impl SettingsGateway for InMemoryPomoApi {
    async fn get_settings(&self) -> Result<Settings> {
        self.enter()?;
        let mut state = self.lock();
        Ok(*state.settings.get_or_insert_with(Settings::default))
    }

    async fn put_settings(&self, settings: &Settings) -> Result<Settings> {
        self.enter()?;
        settings.validate_for_account()?;
        self.lock().settings = Some(*settings);
        Ok(*settings)
    }
}

#[async_trait]
impl StatsGateway for InMemoryPomoApi {
    async fn daily_stats(
        &self,
        days: u32,
        reference_date: Option<NaiveDate>,
    ) -> Result<DailyStatsReport> {
        self.enter()?;
        if days == 0 {
            return Err(PomoError::validation("days", "must be at least 1"));
        }

        let range_end = reference_date.unwrap_or_else(|| Utc::now().date_naive());
        let range_start = range_end - ChronoDuration::days(i64::from(days) - 1);
        let sessions = self.sessions();

        let mut stats: Vec<DailyStat> = (0..days)
            .map(|i| {
                let date = range_start + ChronoDuration::days(i64::from(i));
                let day: Vec<&SessionRecord> = sessions
                    .iter()
                    .filter(|s| s.started_at.date_naive() == date)
                    .collect();
                aggregate_day(date, &day)
            })
            .collect();
        stats.reverse();

        let summary = StatsSummary {
            total_attempted: stats.iter().map(|d| d.attempted).sum(),
            total_completed: stats.iter().map(|d| d.completed).sum(),
            total_focus_minutes: stats.iter().map(|d| d.total_focus_minutes).sum(),
            average_completion_rate: rounded_ratio(
                stats.iter().map(|d| d.completion_rate).sum(),
                stats.len() as u32,
                1,
            ),
            active_days: stats.iter().filter(|d| d.attempted > 0).count() as u32,
        };

        Ok(DailyStatsReport {
            days: stats,
            summary,
            range_start,
            range_end,
        })
    }
}

fn aggregate_day(date: NaiveDate, sessions: &[&SessionRecord]) -> DailyStat {
    let focus: Vec<&&SessionRecord> = sessions.iter().filter(|s| s.kind.is_focus()).collect();
    let completed_focus: Vec<&&&SessionRecord> = focus.iter().filter(|s| s.completed).collect();
    let attempted = focus.len() as u32;
    let completed = completed_focus.len() as u32;
    let total_focus_minutes = completed_focus
        .iter()
        .map(|s| s.actual_duration_secs.unwrap_or(s.planned_duration_secs) / 60)
        .sum();

    DailyStat {
        date,
        attempted,
        completed,
        total_focus_minutes,
        completion_rate: rounded_ratio(completed, attempted, 100),
        all_sessions: sessions.len() as u32,
        completed_sessions: sessions.iter().filter(|s| s.completed).count() as u32,
    }
}

/// `round(numerator * scale / denominator)`, 0 when the denominator is 0.
fn rounded_ratio(numerator: u32, denominator: u32, scale: u32) -> u32 {
    if denominator == 0 {
        return 0;
    }
    let scaled = u64::from(numerator) * u64::from(scale);
    ((scaled * 2 + u64::from(denominator)) / (2 * u64::from(denominator))) as u32
}

//! Wire types of the persistence façade (camelCase JSON).

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use pomo_core::session::{NewSession, SessionKind, SessionRecord, SessionUpdate};
use pomo_core::stats::{DailyStat, DailyStatsReport, StatsSummary};
use serde::{Deserialize, Serialize, Serializer};

fn rfc3339_millis<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn opt_rfc3339_millis<S: Serializer>(
    value: &Option<DateTime<Utc>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) => rfc3339_millis(v, serializer),
        None => serializer.serialize_none(),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateSessionRequest {
    session_type: SessionKind,
    planned_duration: u32,
    #[serde(serialize_with = "rfc3339_millis")]
    start_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
}

impl From<&NewSession> for CreateSessionRequest {
    fn from(new_session: &NewSession) -> Self {
        Self {
            session_type: new_session.kind,
            planned_duration: new_session.planned_duration_secs,
            start_time: new_session.started_at,
            tags: new_session.tags.clone(),
            notes: new_session.notes.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpdateSessionRequest {
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "opt_rfc3339_millis"
    )]
    end_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    actual_duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
}

impl From<&SessionUpdate> for UpdateSessionRequest {
    fn from(update: &SessionUpdate) -> Self {
        Self {
            end_time: update.ended_at,
            actual_duration: update.actual_duration_secs,
            completed: update.completed,
            tags: update.tags.clone(),
            notes: update.notes.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SessionDto {
    id: String,
    session_type: SessionKind,
    planned_duration: u32,
    actual_duration: Option<u32>,
    #[serde(default)]
    completed: bool,
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    tags: Vec<String>,
    notes: Option<String>,
}

impl From<SessionDto> for SessionRecord {
    fn from(dto: SessionDto) -> Self {
        Self {
            id: dto.id,
            kind: dto.session_type,
            planned_duration_secs: dto.planned_duration,
            actual_duration_secs: dto.actual_duration,
            completed: dto.completed,
            started_at: dto.start_time,
            ended_at: dto.end_time,
            tags: dto.tags,
            notes: dto.notes,
        }
    }
}

/// Error body: `{"error": "...", "details": [{"field": "...", "message": "..."}]}`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: Option<String>,
    pub message: Option<String>,
    #[serde(default)]
    pub details: Vec<FieldErrorDto>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FieldErrorDto {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DailyStatsResponse {
    daily_stats: Vec<DailyStatDto>,
    summary: SummaryDto,
    date_range: DateRangeDto,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DailyStatDto {
    date: NaiveDate,
    attempted: u32,
    completed: u32,
    total_focus_minutes: u32,
    completion_rate: u32,
    all_sessions: u32,
    completed_sessions: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryDto {
    total_attempted: u32,
    total_completed: u32,
    total_focus_minutes: u32,
    average_completion_rate: u32,
    active_days: u32,
}

#[derive(Debug, Deserialize)]
struct DateRangeDto {
    start: NaiveDate,
    end: NaiveDate,
}

impl From<DailyStatsResponse> for DailyStatsReport {
    fn from(response: DailyStatsResponse) -> Self {
        Self {
            days: response
                .daily_stats
                .into_iter()
                .map(|d| DailyStat {
                    date: d.date,
                    attempted: d.attempted,
                    completed: d.completed,
                    total_focus_minutes: d.total_focus_minutes,
                    completion_rate: d.completion_rate,
                    all_sessions: d.all_sessions,
                    completed_sessions: d.completed_sessions,
                })
                .collect(),
            summary: StatsSummary {
                total_attempted: response.summary.total_attempted,
                total_completed: response.summary.total_completed,
                total_focus_minutes: response.summary.total_focus_minutes,
                average_completion_rate: response.summary.average_completion_rate,
                active_days: response.summary.active_days,
            },
            range_start: response.date_range.start,
            range_end: response.date_range.end,
        }
    }
}

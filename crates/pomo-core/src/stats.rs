//! Daily statistics returned by the persistence façade.
//!
//! The timer engine never consumes these; they are surfaced by `pomo stats`.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Aggregates for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStat {
    pub date: NaiveDate,
    /// Focus segments started that day
    pub attempted: u32,
    /// Focus segments completed that day
    pub completed: u32,
    pub total_focus_minutes: u32,
    /// Completed / attempted, as a rounded percentage
    pub completion_rate: u32,
    /// Segments of any kind
    pub all_sessions: u32,
    pub completed_sessions: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSummary {
    pub total_attempted: u32,
    pub total_completed: u32,
    pub total_focus_minutes: u32,
    pub average_completion_rate: u32,
    pub active_days: u32,
}

/// A window of daily aggregates, most recent day first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStatsReport {
    pub days: Vec<DailyStat>,
    pub summary: StatsSummary,
    pub range_start: NaiveDate,
    pub range_end: NaiveDate,
}

/// Formats a minute count as `"{h}h {m}m"`.
pub fn format_focus_time(total_minutes: u32) -> String {
    format!("{}h {}m", total_minutes / 60, total_minutes % 60)
}

#[async_trait]
pub trait StatsGateway: Send + Sync {
    /// Fetches per-day aggregates.
    ///
    /// # Arguments
    ///
    /// * `days` - Window length, ending on `reference_date`
    /// * `reference_date` - Last day of the window; today when `None`
    async fn daily_stats(&self, days: u32, reference_date: Option<NaiveDate>)
    -> Result<DailyStatsReport>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_focus_time() {
        assert_eq!(format_focus_time(0), "0h 0m");
        assert_eq!(format_focus_time(59), "0h 59m");
        assert_eq!(format_focus_time(125), "2h 5m");
    }
}

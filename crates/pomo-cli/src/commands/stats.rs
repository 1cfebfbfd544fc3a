use anyhow::{Result, bail};
use chrono::NaiveDate;
use pomo_core::stats::{DailyStatsReport, format_focus_time};

use crate::backend::Backend;

pub async fn run(backend: &Backend, days: u32, date: Option<NaiveDate>) -> Result<()> {
    if !backend.remote_configured {
        bail!("Statistics need an API; set api.base_url or POMO_API_URL");
    }
    if !backend.identity.is_authenticated() {
        bail!("Statistics need a signed-in account; set api.session_token and api.user_id");
    }

    let report = backend.stats.daily_stats(days, date).await?;
    print!("{}", render(&report));
    Ok(())
}

fn render(report: &DailyStatsReport) -> String {
    let mut out = format!(
        "Focus statistics {} .. {}\n\n{:<12} {:>9} {:>9} {:>10} {:>6}\n",
        report.range_start, report.range_end, "date", "attempted", "completed", "focus", "rate"
    );
    for day in &report.days {
        out.push_str(&format!(
            "{:<12} {:>9} {:>9} {:>10} {:>5}%\n",
            day.date.format("%Y-%m-%d"),
            day.attempted,
            day.completed,
            format_focus_time(day.total_focus_minutes),
            day.completion_rate
        ));
    }

    let summary = &report.summary;
    out.push_str(&format!(
        "\n{} of {} pomodoros completed, {} focused, {} active day(s), average rate {}%\n",
        summary.total_completed,
        summary.total_attempted,
        format_focus_time(summary.total_focus_minutes),
        summary.active_days,
        summary.average_completion_rate
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pomo_core::stats::{DailyStat, StatsSummary};

    #[test]
    fn test_render_lists_days_and_summary() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 2).unwrap();
        let report = DailyStatsReport {
            days: vec![DailyStat {
                date,
                attempted: 4,
                completed: 3,
                total_focus_minutes: 75,
                completion_rate: 75,
                all_sessions: 7,
                completed_sessions: 6,
            }],
            summary: StatsSummary {
                total_attempted: 4,
                total_completed: 3,
                total_focus_minutes: 75,
                average_completion_rate: 75,
                active_days: 1,
            },
            range_start: date,
            range_end: date,
        };

        let text = render(&report);
        assert!(text.contains("2025-03-02"));
        assert!(text.contains("1h 15m"));
        assert!(text.contains("3 of 4 pomodoros completed"));
    }
}

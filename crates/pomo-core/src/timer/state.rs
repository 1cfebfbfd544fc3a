use serde::{Deserialize, Serialize};

use crate::session::SessionKind;

/// Run state of the countdown.
///
/// `Idle -> Running` only via start; `Running <-> Paused` via pause/resume;
/// any state returns to `Idle` on reset or completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    Idle,
    Running,
    Paused,
}

/// Read-only copy of the countdown state handed to other components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub seconds_remaining: u32,
    pub run_state: RunState,
    pub kind: SessionKind,
    /// Whether the countdown has ever been started
    pub started: bool,
}

impl TimerSnapshot {
    pub fn is_running(&self) -> bool {
        self.run_state == RunState::Running
    }

    pub fn is_paused(&self) -> bool {
        self.run_state == RunState::Paused
    }

    pub fn is_idle(&self) -> bool {
        self.run_state == RunState::Idle
    }

    /// Ran down to zero and has not been re-primed since.
    pub fn is_finished(&self) -> bool {
        self.started && self.is_idle() && self.seconds_remaining == 0
    }
}

/// Formats seconds as `mm:ss`.
pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

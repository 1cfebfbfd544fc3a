//! Rotation policy: which segment follows the one that just ended.

use serde::{Deserialize, Serialize};

use crate::session::SessionKind;
use crate::settings::Settings;

/// Count of naturally completed focus segments.
///
/// Only ever incremented on a completed focus segment; breaks and abandoned
/// segments leave it untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationState {
    pub pomodoros_completed: u32,
}

impl RotationState {
    pub fn new(pomodoros_completed: u32) -> Self {
        Self {
            pomodoros_completed,
        }
    }

    /// Records the end of a completed segment of `kind`.
    ///
    /// # Returns
    ///
    /// The counter value after this completion.
    pub fn record_completion(&mut self, kind: SessionKind) -> u32 {
        if kind.is_focus() {
            self.pomodoros_completed = self.pomodoros_completed.saturating_add(1);
        }
        self.pomodoros_completed
    }

    pub fn reset(&mut self) {
        self.pomodoros_completed = 0;
    }
}

/// Picks the kind of the next segment.
///
/// # Arguments
///
/// * `current` - Kind of the segment that just completed
/// * `pomodoros_completed` - Counter value *after* counting that segment
/// * `long_break_interval` - Assumed `>= 1`; rejected at the settings boundary otherwise
pub fn next_kind(
    current: SessionKind,
    pomodoros_completed: u32,
    long_break_interval: u32,
) -> SessionKind {
    match current {
        SessionKind::Focus => {
            if pomodoros_completed % long_break_interval.max(1) == 0 {
                SessionKind::LongBreak
            } else {
                SessionKind::ShortBreak
            }
        }
        SessionKind::ShortBreak | SessionKind::LongBreak => SessionKind::Focus,
    }
}

/// Duration of a segment in seconds.
pub fn next_duration(kind: SessionKind, settings: &Settings) -> u32 {
    settings.minutes_for(kind) * 60
}

/// Focus segments left before the next long break, counting the one that triggers it.
pub fn pomodoros_until_long_break(pomodoros_completed: u32, long_break_interval: u32) -> u32 {
    let interval = long_break_interval.max(1);
    interval - (pomodoros_completed % interval)
}

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

use crate::error::{PomoError, Result};
use crate::session::SessionKind;

pub const FOCUS_MINUTES_RANGE: RangeInclusive<u32> = 1..=60;
pub const SHORT_BREAK_MINUTES_RANGE: RangeInclusive<u32> = 1..=30;
pub const LONG_BREAK_MINUTES_RANGE: RangeInclusive<u32> = 1..=60;
pub const LONG_BREAK_INTERVAL_RANGE: RangeInclusive<u32> = 1..=10;
/// The persistence façade rejects intervals below this; locally 1 is fine.
pub const ACCOUNT_MIN_LONG_BREAK_INTERVAL: u32 = 2;

/// Timer configuration.
///
/// Field names on the wire (and in the local store) follow the persistence
/// façade: `pomodoroDuration`, `shortBreakDuration`, `longBreakDuration`,
/// `longBreakInterval`, `autoStartBreaks`, `autoStartPomodoros`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(rename = "pomodoroDuration")]
    pub focus_minutes: u32,
    #[serde(rename = "shortBreakDuration")]
    pub short_break_minutes: u32,
    #[serde(rename = "longBreakDuration")]
    pub long_break_minutes: u32,
    #[serde(rename = "longBreakInterval")]
    pub long_break_interval: u32,
    #[serde(rename = "autoStartBreaks")]
    pub auto_start_breaks: bool,
    #[serde(rename = "autoStartPomodoros")]
    pub auto_start_focus: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            focus_minutes: 25,
            short_break_minutes: 5,
            long_break_minutes: 15,
            long_break_interval: 4,
            auto_start_breaks: false,
            auto_start_focus: false,
        }
    }
}

impl Settings {
    /// Validates every bounded field.
    ///
    /// This is the settings boundary: a non-positive duration or interval never
    /// gets past here, so the rotation policy can assume `long_break_interval >= 1`.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: All fields within bounds
    /// - `Err(PomoError::Validation)`: The first field out of range
    pub fn validate(&self) -> Result<()> {
        check_range("pomodoroDuration", "minutes", self.focus_minutes, FOCUS_MINUTES_RANGE)?;
        check_range(
            "shortBreakDuration",
            "minutes",
            self.short_break_minutes,
            SHORT_BREAK_MINUTES_RANGE,
        )?;
        check_range(
            "longBreakDuration",
            "minutes",
            self.long_break_minutes,
            LONG_BREAK_MINUTES_RANGE,
        )?;
        check_range(
            "longBreakInterval",
            "pomodoros",
            self.long_break_interval,
            LONG_BREAK_INTERVAL_RANGE,
        )
    }

    /// Validates for storage on an account.
    ///
    /// Stricter than [`Settings::validate`]: the account store requires
    /// [`ACCOUNT_MIN_LONG_BREAK_INTERVAL`] pomodoros between long breaks.
    pub fn validate_for_account(&self) -> Result<()> {
        self.validate()?;
        if self.long_break_interval < ACCOUNT_MIN_LONG_BREAK_INTERVAL {
            return Err(PomoError::validation(
                "longBreakInterval",
                format!(
                    "must be at least {} pomodoros to store on an account, got {}",
                    ACCOUNT_MIN_LONG_BREAK_INTERVAL, self.long_break_interval
                ),
            ));
        }
        Ok(())
    }

    /// Configured minutes for a segment kind.
    pub fn minutes_for(&self, kind: SessionKind) -> u32 {
        match kind {
            SessionKind::Focus => self.focus_minutes,
            SessionKind::ShortBreak => self.short_break_minutes,
            SessionKind::LongBreak => self.long_break_minutes,
        }
    }

    /// Whether the segment following a completion should start on its own.
    pub fn auto_starts(&self, next: SessionKind) -> bool {
        if next.is_focus() {
            self.auto_start_focus
        } else {
            self.auto_start_breaks
        }
    }
}

fn check_range(field: &str, unit: &str, value: u32, range: RangeInclusive<u32>) -> Result<()> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(PomoError::validation(
            field,
            format!(
                "must be between {} and {} {}, got {}",
                range.start(),
                range.end(),
                unit,
                value
            ),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_of_one_is_local_only() {
        let settings = Settings {
            long_break_interval: 1,
            ..Settings::default()
        };
        assert!(settings.validate().is_ok());
        let err = settings.validate_for_account().unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("longBreakInterval"));

        assert!(Settings::default().validate_for_account().is_ok());
    }

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.minutes_for(SessionKind::Focus), 25);
        assert_eq!(settings.minutes_for(SessionKind::LongBreak), 15);
    }

    #[test]
    fn test_zero_values_rejected() {
        let settings = Settings {
            long_break_interval: 0,
            ..Settings::default()
        };
        match settings.validate() {
            Err(PomoError::Validation { field, .. }) => assert_eq!(field, "longBreakInterval"),
            other => panic!("expected validation error, got {other:?}"),
        }

        let settings = Settings {
            focus_minutes: 0,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_upper_bounds() {
        let settings = Settings {
            short_break_minutes: 31,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());

        let settings = Settings {
            focus_minutes: 60,
            short_break_minutes: 30,
            long_break_minutes: 60,
            long_break_interval: 10,
            ..Settings::default()
        };
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_wire_field_names() {
        let json = serde_json::to_value(Settings::default()).unwrap();
        assert_eq!(json["pomodoroDuration"], 25);
        assert_eq!(json["autoStartPomodoros"], false);

        // Missing fields fall back to defaults
        let parsed: Settings = serde_json::from_str(r#"{"pomodoroDuration": 50}"#).unwrap();
        assert_eq!(parsed.focus_minutes, 50);
        assert_eq!(parsed.long_break_interval, 4);
    }

    #[test]
    fn test_auto_start_flags_by_kind() {
        let settings = Settings {
            auto_start_breaks: true,
            ..Settings::default()
        };
        assert!(settings.auto_starts(SessionKind::ShortBreak));
        assert!(settings.auto_starts(SessionKind::LongBreak));
        assert!(!settings.auto_starts(SessionKind::Focus));
    }
}

//! Timer settings: per-kind durations, rotation interval and auto-start flags.

pub mod model;
pub mod repository;

pub use model::{
    ACCOUNT_MIN_LONG_BREAK_INTERVAL, LONG_BREAK_MINUTES_RANGE, LONG_BREAK_INTERVAL_RANGE, FOCUS_MINUTES_RANGE, Settings,
    SHORT_BREAK_MINUTES_RANGE,
};
pub use repository::SettingsGateway;

//! Segment kinds and persisted session records.

pub mod kind;
pub mod model;
pub mod repository;

pub use kind::SessionKind;
pub use model::{
    MAX_NOTES_CHARS, MAX_PLANNED_DURATION_SECS, MIN_PLANNED_DURATION_SECS, NewSession,
    SessionRecord, SessionUpdate, normalize_notes,
};
pub use repository::SessionGateway;

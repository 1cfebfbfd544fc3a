//! Session record model.
//!
//! A session record is the persisted form of one segment. It is opened when a
//! running segment starts while an identity is present, and closed exactly once
//! when the segment completes or is abandoned.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::kind::SessionKind;
use crate::error::{PomoError, Result};

/// Shortest planned duration the façade accepts (1 minute).
pub const MIN_PLANNED_DURATION_SECS: u32 = 60;
/// Longest planned duration the façade accepts (60 minutes).
pub const MAX_PLANNED_DURATION_SECS: u32 = 3600;
/// Maximum length of accomplishment notes, in characters.
pub const MAX_NOTES_CHARS: usize = 500;

/// A persisted segment, owned by the persistence façade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Opaque, server-assigned identifier
    pub id: String,
    pub kind: SessionKind,
    pub planned_duration_secs: u32,
    pub actual_duration_secs: Option<u32>,
    pub completed: bool,
    pub started_at: DateTime<Utc>,
    /// `None` while the record is still open
    pub ended_at: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
    pub notes: Option<String>,
}

impl SessionRecord {
    /// Returns true while the record has not been closed.
    pub fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }

    /// Applies a partial update in place. Fields absent from the update are kept.
    pub fn apply(&mut self, update: &SessionUpdate) {
        if let Some(completed) = update.completed {
            self.completed = completed;
        }
        if let Some(ended_at) = update.ended_at {
            self.ended_at = Some(ended_at);
        }
        if let Some(actual) = update.actual_duration_secs {
            self.actual_duration_secs = Some(actual);
        }
        if let Some(notes) = &update.notes {
            self.notes = Some(notes.clone());
        }
        if let Some(tags) = &update.tags {
            self.tags = tags.clone();
        }
    }
}

/// Request body for opening a session record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSession {
    pub kind: SessionKind,
    pub planned_duration_secs: u32,
    pub started_at: DateTime<Utc>,
    pub tags: Vec<String>,
    pub notes: Option<String>,
}

impl NewSession {
    pub fn new(kind: SessionKind, planned_duration_secs: u32, started_at: DateTime<Utc>) -> Self {
        Self {
            kind,
            planned_duration_secs,
            started_at,
            tags: Vec::new(),
            notes: None,
        }
    }

    /// Checks the field contracts the façade enforces at its boundary.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: planned duration within 60..=3600 seconds and notes within limit
    /// - `Err(PomoError::Validation)`: the offending field and reason
    pub fn validate(&self) -> Result<()> {
        validate_planned_duration(self.planned_duration_secs)?;
        validate_notes(self.notes.as_deref())
    }
}

/// Partial update applied when a segment ends.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUpdate {
    pub completed: Option<bool>,
    pub ended_at: Option<DateTime<Utc>>,
    pub actual_duration_secs: Option<u32>,
    pub notes: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl SessionUpdate {
    /// Update closing a naturally completed segment.
    pub fn completed(ended_at: DateTime<Utc>, actual_duration_secs: u32, notes: Option<String>) -> Self {
        Self {
            completed: Some(true),
            ended_at: Some(ended_at),
            actual_duration_secs: Some(actual_duration_secs),
            notes,
            tags: None,
        }
    }

    /// Update closing an abandoned segment. Progress is recorded only when known.
    pub fn abandoned(ended_at: DateTime<Utc>, actual_duration_secs: Option<u32>) -> Self {
        Self {
            completed: Some(false),
            ended_at: Some(ended_at),
            actual_duration_secs,
            notes: None,
            tags: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_notes(self.notes.as_deref())
    }
}

/// Trims accomplishment text and caps it at [`MAX_NOTES_CHARS`] characters.
pub fn normalize_notes(raw: &str) -> String {
    raw.trim().chars().take(MAX_NOTES_CHARS).collect()
}

fn validate_planned_duration(secs: u32) -> Result<()> {
    if !(MIN_PLANNED_DURATION_SECS..=MAX_PLANNED_DURATION_SECS).contains(&secs) {
        return Err(PomoError::validation(
            "plannedDuration",
            format!(
                "must be between {} and {} seconds, got {}",
                MIN_PLANNED_DURATION_SECS, MAX_PLANNED_DURATION_SECS, secs
            ),
        ));
    }
    Ok(())
}

fn validate_notes(notes: Option<&str>) -> Result<()> {
    match notes {
        Some(n) if n.chars().count() > MAX_NOTES_CHARS => Err(PomoError::validation(
            "notes",
            format!("must be at most {} characters", MAX_NOTES_CHARS),
        )),
        _ => Ok(()),
    }
}

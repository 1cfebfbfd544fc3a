//! Session gateway trait.
//!
//! Defines the interface for session record persistence operations.

use async_trait::async_trait;

use super::model::{NewSession, SessionRecord, SessionUpdate};
use crate::error::Result;

/// An abstract gateway to the session half of the persistence façade.
///
/// This trait decouples the lifecycle coordinator from the transport
/// (HTTP client, in-memory store). Implementations act on behalf of the
/// identity they were constructed with; the core never passes credentials.
#[async_trait]
pub trait SessionGateway: Send + Sync {
    /// Opens a new session record.
    ///
    /// # Arguments
    ///
    /// * `new_session` - Kind, planned duration and start time of the segment
    ///
    /// # Returns
    ///
    /// - `Ok(SessionRecord)`: The created record carrying its server-assigned id
    /// - `Err(PomoError::Validation)`: Planned duration outside 60..=3600 seconds
    /// - `Err(_)`: Transport or server failure
    async fn create_session(&self, new_session: &NewSession) -> Result<SessionRecord>;

    /// Applies a partial update to an existing record.
    ///
    /// # Arguments
    ///
    /// * `id` - The record id returned by `create_session`
    /// * `update` - Fields to change
    ///
    /// # Returns
    ///
    /// - `Ok(SessionRecord)`: The updated record
    /// - `Err(PomoError::NotFound)`: The id does not belong to the caller's identity
    async fn update_session(&self, id: &str, update: &SessionUpdate) -> Result<SessionRecord>;

    /// Fetches the most recently completed focus record.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(record))`: The latest completed focus segment
    /// - `Ok(None)`: The caller has never completed a focus segment
    async fn previous_completed_focus_session(&self) -> Result<Option<SessionRecord>>;
}

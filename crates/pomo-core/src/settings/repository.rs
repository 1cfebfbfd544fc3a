use async_trait::async_trait;

use super::model::Settings;
use crate::error::Result;

/// Remote settings storage for an authenticated identity.
#[async_trait]
pub trait SettingsGateway: Send + Sync {
    /// Reads the caller's settings. The façade creates defaults on first read.
    async fn get_settings(&self) -> Result<Settings>;

    /// Upserts the caller's settings.
    ///
    /// # Returns
    ///
    /// - `Ok(Settings)`: The stored settings as echoed by the façade
    /// - `Err(PomoError::Validation)`: A field failed the façade's bounds
    async fn put_settings(&self, settings: &Settings) -> Result<Settings>;
}

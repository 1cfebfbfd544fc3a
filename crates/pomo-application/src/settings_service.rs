//! Settings service.
//!
//! Resolves the active [`Settings`] from the account (when an identity is
//! present) or the local fallback store, and saves changes to both. Local
//! state is authoritative for the running timer; a failed remote write is
//! reported to the caller, but it never undoes the local change.

use pomo_core::error::{PomoError, Result};
use pomo_core::identity::IdentityProvider;
use pomo_core::local_store::LocalFallback;
use pomo_core::settings::{Settings, SettingsGateway};
use std::sync::{Arc, Mutex, PoisonError};

/// Where loaded settings came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsSource {
    Remote,
    Local,
    Defaults,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadedSettings {
    pub settings: Settings,
    pub source: SettingsSource,
}

/// Outcome of the remote half of a save.
#[derive(Debug)]
pub enum RemoteSync {
    /// No identity; only the local store was written.
    Skipped,
    Synced,
    Failed(PomoError),
}

#[derive(Debug)]
pub struct SaveReport {
    pub settings: Settings,
    pub remote: RemoteSync,
}

pub struct SettingsService {
    gateway: Arc<dyn SettingsGateway>,
    identity: Arc<dyn IdentityProvider>,
    local: LocalFallback,
    current: Mutex<Settings>,
}

impl SettingsService {
    pub fn new(
        gateway: Arc<dyn SettingsGateway>,
        identity: Arc<dyn IdentityProvider>,
        local: LocalFallback,
    ) -> Self {
        Self {
            gateway,
            identity,
            local,
            current: Mutex::new(Settings::default()),
        }
    }

    pub fn current(&self) -> Settings {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_current(&self, settings: Settings) {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = settings;
    }

    /// Loads the active settings and makes them current.
    ///
    /// Order: account settings when authenticated, then the local store, then
    /// defaults. Never fails; each fallback is logged.
    pub async fn load(&self) -> LoadedSettings {
        if self.identity.is_authenticated() {
            match self.gateway.get_settings().await {
                Ok(settings) => return self.adopt(settings, SettingsSource::Remote),
                Err(e) => {
                    tracing::warn!(
                        "[SettingsService] Remote settings unavailable, using local: {}",
                        e
                    );
                }
            }
        }

        match self.local.load_settings().await {
            Ok(Some(settings)) => match settings.validate() {
                Ok(()) => self.adopt(settings, SettingsSource::Local),
                Err(e) => {
                    tracing::warn!("[SettingsService] Ignoring invalid local settings: {}", e);
                    self.adopt(Settings::default(), SettingsSource::Defaults)
                }
            },
            Ok(None) => self.adopt(Settings::default(), SettingsSource::Defaults),
            Err(e) => {
                tracing::warn!("[SettingsService] Failed to read local settings: {}", e);
                self.adopt(Settings::default(), SettingsSource::Defaults)
            }
        }
    }

    fn adopt(&self, settings: Settings, source: SettingsSource) -> LoadedSettings {
        self.set_current(settings);
        tracing::info!("[SettingsService] Loaded settings from {:?}", source);
        LoadedSettings { settings, source }
    }

    /// Validates and saves `settings`.
    ///
    /// # Returns
    ///
    /// - `Ok(report)`: Settings are current and written locally; `report.remote`
    ///   says whether the account copy was updated
    /// - `Err(PomoError::Validation)`: Out-of-range value; nothing changed
    pub async fn save(&self, settings: Settings) -> Result<SaveReport> {
        settings.validate()?;
        self.set_current(settings);

        if let Err(e) = self.local.save_settings(&settings).await {
            tracing::warn!("[SettingsService] Failed to write local settings: {}", e);
        }

        if !self.identity.is_authenticated() {
            return Ok(SaveReport {
                settings,
                remote: RemoteSync::Skipped,
            });
        }

        if let Err(e) = settings.validate_for_account() {
            tracing::warn!("[SettingsService] Settings kept local only: {}", e);
            return Ok(SaveReport {
                settings,
                remote: RemoteSync::Failed(e),
            });
        }

        let remote = match self.gateway.put_settings(&settings).await {
            Ok(_) => RemoteSync::Synced,
            Err(e) => {
                tracing::warn!("[SettingsService] Failed to save settings remotely: {}", e);
                RemoteSync::Failed(e)
            }
        };
        Ok(SaveReport { settings, remote })
    }

    /// Whether locally stored settings should be offered to the account.
    pub async fn needs_migration(&self) -> Result<bool> {
        if !self.identity.is_authenticated() || self.local.migration_completed().await? {
            return Ok(false);
        }
        Ok(self.local.load_settings().await?.is_some())
    }

    /// Pushes local settings to the account and marks the migration done.
    ///
    /// # Returns
    ///
    /// - `Ok(true)`: Local settings were uploaded and are now current
    /// - `Ok(false)`: Nothing stored locally; only the marker was set
    /// - `Err(PomoError::Unauthorized)`: No identity present
    /// - `Err(_)`: Upload failed; the marker is left unset so it can be retried
    pub async fn migrate_local_to_account(&self) -> Result<bool> {
        if !self.identity.is_authenticated() {
            return Err(PomoError::Unauthorized);
        }

        let Some(settings) = self.local.load_settings().await? else {
            self.local.mark_migration_completed().await?;
            return Ok(false);
        };
        settings.validate_for_account()?;

        let stored = self.gateway.put_settings(&settings).await?;
        self.local.mark_migration_completed().await?;
        self.set_current(stored);
        tracing::info!("[SettingsService] Migrated local settings to account");
        Ok(true)
    }

    /// Declines the migration; local settings stay where they are.
    pub async fn skip_migration(&self) -> Result<()> {
        self.local.mark_migration_completed().await?;
        tracing::info!("[SettingsService] Migration skipped");
        Ok(())
    }
}

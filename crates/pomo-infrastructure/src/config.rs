//! Application configuration (`config.toml`).
//!
//! Every section and field is defaulted, so an absent or partial file is
//! valid. Precedence, lowest to highest: file, environment, CLI flags (the
//! latter applied by the binary).

use pomo_core::error::{PomoError, Result};
use pomo_core::timer::TickSourceKind;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::storage::AtomicTomlFile;

pub const ENV_API_URL: &str = "POMO_API_URL";
pub const ENV_SESSION_TOKEN: &str = "POMO_SESSION_TOKEN";
pub const ENV_USER_ID: &str = "POMO_USER_ID";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub timer: TimerConfig,
    pub notifications: NotificationConfig,
}

/// Persistence façade connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: Option<String>,
    pub session_token: Option<String>,
    pub user_id: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            session_token: None,
            user_id: None,
            timeout_secs: 10,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
    pub tick_source: TickSourceKind,
    pub tick_period_ms: u64,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            tick_source: TickSourceKind::Background,
            tick_period_ms: 1000,
        }
    }
}

impl TimerConfig {
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub enabled: bool,
    pub sound: bool,
    pub desktop: bool,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sound: true,
            desktop: true,
        }
    }
}

impl AppConfig {
    /// Loads the configuration file.
    ///
    /// # Returns
    ///
    /// - `Ok(AppConfig)`: Parsed file, or defaults if the file is missing
    /// - `Err(PomoError::Serialization)`: The file is not valid TOML for this schema
    pub fn load(path: &Path) -> Result<Self> {
        let file = AtomicTomlFile::<AppConfig>::new(path.to_path_buf());
        let config = file.load()?.unwrap_or_default();
        tracing::debug!("[Config] Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Applies `POMO_API_URL`, `POMO_SESSION_TOKEN` and `POMO_USER_ID`.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Applies overrides from an arbitrary lookup. Empty values are ignored.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_API_URL) {
            self.api.base_url = Some(url);
        }
        if let Some(token) = get(ENV_SESSION_TOKEN) {
            self.api.session_token = Some(token);
        }
        if let Some(user_id) = get(ENV_USER_ID) {
            self.api.user_id = Some(user_id);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.timer.tick_period_ms == 0 {
            return Err(PomoError::config("timer.tick_period_ms must be greater than 0"));
        }
        if self.api.timeout_secs == 0 {
            return Err(PomoError::config("api.timeout_secs must be greater than 0"));
        }
        if let Some(url) = &self.api.base_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(PomoError::config(format!(
                    "api.base_url must be an http(s) URL, got '{}'",
                    url
                )));
            }
        }
        Ok(())
    }
}

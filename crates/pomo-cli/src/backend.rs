//! Composition of the persistence side: façade client, identity and local store.

use anyhow::{Context, Result};
use pomo_core::identity::IdentityProvider;
use pomo_core::local_store::{InMemoryKeyValueStore, KeyValueStore, LocalFallback};
use pomo_core::session::SessionGateway;
use pomo_core::settings::SettingsGateway;
use pomo_core::stats::StatsGateway;
use pomo_infrastructure::{
    AppConfig, ConfiguredIdentity, HttpPomoApi, InMemoryPomoApi, PomoPaths, TomlKeyValueStore,
};
use std::sync::Arc;

pub struct Backend {
    pub sessions: Arc<dyn SessionGateway>,
    pub settings: Arc<dyn SettingsGateway>,
    pub stats: Arc<dyn StatsGateway>,
    pub identity: Arc<dyn IdentityProvider>,
    pub local: LocalFallback,
    /// Whether a façade URL is configured at all.
    pub remote_configured: bool,
}

impl Backend {
    /// Wires the façade and local store from configuration.
    ///
    /// Without `api.base_url` the in-memory façade stands in; the identity is
    /// then always anonymous, so nothing is sent to it during timing.
    pub fn build(config: &AppConfig, paths: &PomoPaths, ephemeral: bool) -> Result<Self> {
        let identity: Arc<dyn IdentityProvider> =
            Arc::new(ConfiguredIdentity::from_config(&config.api));

        let (sessions, settings, stats): (
            Arc<dyn SessionGateway>,
            Arc<dyn SettingsGateway>,
            Arc<dyn StatsGateway>,
        ) = if config.api.base_url.is_some() {
            let api = Arc::new(
                HttpPomoApi::from_config(&config.api).context("Failed to configure API client")?,
            );
            (api.clone(), api.clone(), api)
        } else {
            tracing::info!("[Backend] No API configured; running local-only");
            let api = Arc::new(InMemoryPomoApi::new());
            (api.clone(), api.clone(), api)
        };

        let store: Arc<dyn KeyValueStore> = if ephemeral {
            Arc::new(InMemoryKeyValueStore::new())
        } else {
            Arc::new(TomlKeyValueStore::new(paths.local_store_file()))
        };
        tracing::debug!(
            "[Backend] Local store: {}",
            if ephemeral {
                "memory".to_string()
            } else {
                paths.local_store_file().display().to_string()
            }
        );

        Ok(Self {
            sessions,
            settings,
            stats,
            identity,
            local: LocalFallback::new(store),
            remote_configured: config.api.base_url.is_some(),
        })
    }
}

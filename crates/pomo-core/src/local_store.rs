//! Local fallback storage.
//!
//! Settings and the rotation counter live under fixed keys in a key-value
//! store. This is the only persistence path for anonymous use; it is read at
//! startup and written on every change.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::Result;
use crate::settings::Settings;

pub const SETTINGS_KEY: &str = "pomodoroSettings";
pub const POMODOROS_COMPLETED_KEY: &str = "pomodorosCompleted";
pub const MIGRATION_COMPLETED_KEY: &str = "migrationCompleted";

/// A durable string-keyed JSON store.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads a value.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(value))`: Key present
    /// - `Ok(None)`: Key absent
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Writes a value, replacing any previous one.
    async fn set(&self, key: &str, value: Value) -> Result<()>;

    /// Removes a key. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;
}

/// Process-local store, used for tests and `--ephemeral` runs.
#[derive(Debug, Default)]
pub struct InMemoryKeyValueStore {
    entries: Mutex<BTreeMap<String, Value>>,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        self.entries.lock().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}

/// Typed access to the fixed local keys.
#[derive(Clone)]
pub struct LocalFallback {
    store: Arc<dyn KeyValueStore>,
}

impl LocalFallback {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Loads locally stored settings.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(settings))`: Settings were stored
    /// - `Ok(None)`: Nothing stored yet
    /// - `Err(PomoError::Serialization)`: The stored value is malformed
    pub async fn load_settings(&self) -> Result<Option<Settings>> {
        match self.store.get(SETTINGS_KEY).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    pub async fn save_settings(&self, settings: &Settings) -> Result<()> {
        self.store
            .set(SETTINGS_KEY, serde_json::to_value(settings)?)
            .await
    }

    /// Loads the rotation counter; an absent key reads as 0.
    pub async fn load_pomodoros_completed(&self) -> Result<u32> {
        match self.store.get(POMODOROS_COMPLETED_KEY).await? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(0),
        }
    }

    pub async fn save_pomodoros_completed(&self, count: u32) -> Result<()> {
        self.store
            .set(POMODOROS_COMPLETED_KEY, Value::from(count))
            .await
    }

    pub async fn migration_completed(&self) -> Result<bool> {
        match self.store.get(MIGRATION_COMPLETED_KEY).await? {
            Some(value) => Ok(value.as_bool().unwrap_or(false)),
            None => Ok(false),
        }
    }

    pub async fn mark_migration_completed(&self) -> Result<()> {
        self.store
            .set(MIGRATION_COMPLETED_KEY, Value::Bool(true))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fallback() -> (Arc<InMemoryKeyValueStore>, LocalFallback) {
        let store = Arc::new(InMemoryKeyValueStore::new());
        let local = LocalFallback::new(store.clone());
        (store, local)
    }

    #[tokio::test]
    async fn test_empty_store_reads_as_defaults() {
        let (_, local) = fallback();
        assert_eq!(local.load_settings().await.unwrap(), None);
        assert_eq!(local.load_pomodoros_completed().await.unwrap(), 0);
        assert!(!local.migration_completed().await.unwrap());
    }

    #[tokio::test]
    async fn test_values_land_under_fixed_keys() {
        let (store, local) = fallback();
        let settings = Settings {
            focus_minutes: 50,
            ..Settings::default()
        };
        local.save_settings(&settings).await.unwrap();
        local.save_pomodoros_completed(3).await.unwrap();
        local.mark_migration_completed().await.unwrap();

        let raw = store.get("pomodoroSettings").await.unwrap().unwrap();
        assert_eq!(raw["pomodoroDuration"], 50);
        assert_eq!(
            store.get("pomodorosCompleted").await.unwrap(),
            Some(Value::from(3))
        );
        assert_eq!(
            store.get("migrationCompleted").await.unwrap(),
            Some(Value::Bool(true))
        );

        assert_eq!(local.load_settings().await.unwrap(), Some(settings));
        assert_eq!(local.load_pomodoros_completed().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_malformed_counter_is_serialization_error() {
        let (store, local) = fallback();
        store
            .set(POMODOROS_COMPLETED_KEY, Value::String("many".to_string()))
            .await
            .unwrap();
        let err = local.load_pomodoros_completed().await.unwrap_err();
        assert!(matches!(err, crate::PomoError::Serialization { .. }));
    }
}

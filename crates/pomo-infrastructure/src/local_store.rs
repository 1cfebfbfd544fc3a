//! File-backed local store.
//!
//! Entries are kept as JSON text under an `[entries]` table of a TOML document,
//! the same shape browser local storage has (string keys, serialized values).
//! File access runs on the blocking pool.

use async_trait::async_trait;
use pomo_core::error::{PomoError, Result};
use pomo_core::local_store::KeyValueStore;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::storage::AtomicTomlFile;

#[derive(Debug, Default, Serialize, Deserialize)]
struct LocalDocument {
    #[serde(default)]
    entries: BTreeMap<String, String>,
}

pub struct TomlKeyValueStore {
    file: Arc<AtomicTomlFile<LocalDocument>>,
}

impl TomlKeyValueStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            file: Arc::new(AtomicTomlFile::new(path)),
        }
    }

    async fn blocking<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&AtomicTomlFile<LocalDocument>) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let file = self.file.clone();
        tokio::task::spawn_blocking(move || f(&file))
            .await
            .map_err(|e| PomoError::internal(format!("local store task failed: {}", e)))?
    }
}

#[async_trait]
impl KeyValueStore for TomlKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let key = key.to_string();
        self.blocking(move |file| {
            let document = file.load()?.unwrap_or_default();
            match document.entries.get(&key) {
                Some(text) => Ok(Some(serde_json::from_str(text)?)),
                None => Ok(None),
            }
        })
        .await
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let key = key.to_string();
        let text = serde_json::to_string(&value)?;
        self.blocking(move |file| {
            file.update(LocalDocument::default(), |document| {
                document.entries.insert(key, text);
                Ok(())
            })?;
            Ok(())
        })
        .await?;
        tracing::debug!("[LocalStore] Wrote entry");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let key = key.to_string();
        self.blocking(move |file| {
            file.update(LocalDocument::default(), |document| {
                document.entries.remove(&key);
                Ok(())
            })?;
            Ok(())
        })
        .await
    }
}

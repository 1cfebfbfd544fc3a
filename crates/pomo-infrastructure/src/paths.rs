//! Path management for pomo configuration and local data.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/pomo/              # Config directory (dirs::config_dir)
//! └── config.toml              # Application configuration
//!
//! ~/.local/share/pomo/         # Data directory (dirs::data_local_dir)
//! ├── local.toml               # Local fallback store (settings, rotation counter)
//! └── logs/                    # Application logs
//!     └── pomo.log.YYYY-MM-DD
//! ```

use pomo_core::error::{PomoError, Result};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "pomo";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PomoPaths {
    config_dir: PathBuf,
    data_dir: PathBuf,
}

impl PomoPaths {
    /// Resolves the platform directories (XDG on Linux, the native locations elsewhere).
    ///
    /// # Returns
    ///
    /// - `Ok(PomoPaths)`: Both directories resolved
    /// - `Err(PomoError::Config)`: The platform has no home/config directory
    pub fn platform() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| PomoError::config("cannot determine config directory"))?
            .join(APP_DIR);
        let data_dir = dirs::data_local_dir()
            .ok_or_else(|| PomoError::config("cannot determine data directory"))?
            .join(APP_DIR);
        Ok(Self {
            config_dir,
            data_dir,
        })
    }

    /// Places both directories under a single root. Used by tests and `--data-dir`.
    pub fn with_root(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            config_dir: root.join("config"),
            data_dir: root.join("data"),
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    pub fn local_store_file(&self) -> PathBuf {
        self.data_dir.join("local.toml")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rooted_layout() {
        let paths = PomoPaths::with_root("/tmp/pomo-test");
        assert_eq!(
            paths.config_file(),
            PathBuf::from("/tmp/pomo-test/config/config.toml")
        );
        assert_eq!(
            paths.local_store_file(),
            PathBuf::from("/tmp/pomo-test/data/local.toml")
        );
        assert_eq!(paths.logs_dir(), PathBuf::from("/tmp/pomo-test/data/logs"));
    }
}

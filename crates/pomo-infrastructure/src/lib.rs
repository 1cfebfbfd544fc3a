//! Adapters behind the pomo core traits: the HTTP persistence façade client,
//! an in-memory façade, the TOML-backed local store, configuration loading,
//! platform paths and notification channels.

pub mod config;
pub mod http;
pub mod identity;
pub mod local_store;
pub mod memory_api;
pub mod notify;
pub mod paths;
pub mod storage;

pub use config::{ApiConfig, AppConfig, NotificationConfig, TimerConfig};
pub use http::HttpPomoApi;
pub use identity::ConfiguredIdentity;
pub use local_store::TomlKeyValueStore;
pub use memory_api::InMemoryPomoApi;
pub use notify::{
    DesktopNotificationChannel, DesktopNotifier, TerminalBellChannel, TerminalTextChannel,
};
pub use paths::PomoPaths;
pub use storage::AtomicTomlFile;

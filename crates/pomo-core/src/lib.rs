//! Domain layer of the pomo timer.
//!
//! Holds the pure pieces (countdown state machine, rotation policy, settings
//! validation) and the collaborator traits the application layer is wired
//! against. Nothing in this crate performs I/O.

pub mod accomplishment;
pub mod error;
pub mod identity;
pub mod local_store;
pub mod notification;
pub mod rotation;
pub mod session;
pub mod settings;
pub mod stats;
pub mod timer;

// Re-export common error type
pub use error::{PomoError, Result};

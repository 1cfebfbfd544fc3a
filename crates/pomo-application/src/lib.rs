//! Application layer for pomo.
//!
//! Use cases wiring the pure domain pieces to their collaborators: the async
//! countdown engine, the visibility reconciler, the session lifecycle
//! coordinator, the notification dispatcher, the settings service and the
//! timer controller that drives the end-to-end flow.

pub mod controller;
pub mod coordinator;
pub mod dispatcher;
pub mod engine;
pub mod reconciler;
pub mod settings_service;
mod task_chain;

pub use controller::{ControllerEvent, StatusLine, TimerController, TimerServices};
pub use coordinator::{CompletedSegment, SessionCoordinator};
pub use dispatcher::{DispatchReport, NotificationDispatcher};
pub use engine::CountdownEngine;
pub use reconciler::{ReconcileOutcome, VisibilityReconciler};
pub use settings_service::{LoadedSettings, RemoteSync, SaveReport, SettingsService, SettingsSource};

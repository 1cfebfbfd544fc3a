//! Accomplishment capture: the UI step that asks what a focus segment produced.

use async_trait::async_trait;

use crate::session::SessionKind;

#[async_trait]
pub trait AccomplishmentCapture: Send + Sync {
    /// Asks the user what they accomplished during the segment that just ended.
    ///
    /// Completion of a focus segment waits on this call. An empty string means
    /// the user skipped the prompt; it is never an error.
    async fn capture(&self, kind: SessionKind) -> String;
}

/// Capture that never prompts and always returns an empty note.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkipCapture;

#[async_trait]
impl AccomplishmentCapture for SkipCapture {
    async fn capture(&self, _kind: SessionKind) -> String {
        String::new()
    }
}

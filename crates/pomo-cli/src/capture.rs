use async_trait::async_trait;
use pomo_core::accomplishment::AccomplishmentCapture;
use pomo_core::session::SessionKind;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::oneshot;

/// Asks for accomplishment notes on the terminal.
///
/// The prompt is answered by the next input line, which the input router
/// hands over through [`PromptCapture::offer`] instead of treating it as a
/// command.
#[derive(Clone, Default)]
pub struct PromptCapture {
    pending: Arc<Mutex<Option<oneshot::Sender<String>>>>,
    closed: Arc<AtomicBool>,
}

impl PromptCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers `line` to a waiting prompt.
    ///
    /// # Returns
    ///
    /// `true` if a prompt consumed the line.
    pub fn offer(&self, line: &str) -> bool {
        let pending = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match pending {
            Some(tx) => {
                let _ = tx.send(line.to_string());
                true
            }
            None => false,
        }
    }

    /// Abandons a waiting prompt and any later one; they resolve to an empty note.
    pub fn cancel(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}

#[async_trait]
impl AccomplishmentCapture for PromptCapture {
    async fn capture(&self, kind: SessionKind) -> String {
        let (tx, rx) = oneshot::channel();
        *self.pending.lock().unwrap_or_else(PoisonError::into_inner) = Some(tx);
        if self.closed.load(Ordering::SeqCst) {
            return String::new();
        }

        print!(
            "\nWhat did you accomplish during this {} session? (Enter to skip) > ",
            kind.label().to_lowercase()
        );
        let _ = std::io::stdout().flush();

        rx.await.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_offer_answers_pending_prompt() {
        let capture = PromptCapture::new();
        assert!(!capture.offer("ignored"));

        let waiting = capture.clone();
        let task = tokio::spawn(async move { waiting.capture(SessionKind::Focus).await });
        while !capture.offer("wrote tests") {
            tokio::task::yield_now().await;
        }
        assert_eq!(task.await.unwrap(), "wrote tests");
    }

    #[tokio::test]
    async fn test_cancel_resolves_empty() {
        let capture = PromptCapture::new();
        let waiting = capture.clone();
        let task = tokio::spawn(async move { waiting.capture(SessionKind::Focus).await });
        while capture.pending.lock().unwrap().is_none() {
            tokio::task::yield_now().await;
        }
        capture.cancel();
        assert_eq!(task.await.unwrap(), "");
        assert_eq!(capture.capture(SessionKind::Focus).await, "");
    }
}

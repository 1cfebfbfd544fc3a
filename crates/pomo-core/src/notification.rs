//! Completion notifications.
//!
//! A [`NotificationChannel`] is one way of telling the user a segment ended:
//! an audible tone, a line in the terminal, an OS-level notification. The
//! dispatcher in the application layer fans a [`NotificationMessage`] out to
//! every configured channel and tolerates individual failures.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::session::SessionKind;

/// What a channel delivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelKind {
    Audio,
    Visual,
    System,
}

/// Title and body announcing the end of a segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationMessage {
    pub kind: SessionKind,
    pub title: String,
    pub body: String,
}

impl NotificationMessage {
    /// Standard text for the completion of a segment of `kind`.
    pub fn for_kind(kind: SessionKind) -> Self {
        let (title, body) = match kind {
            SessionKind::Focus => ("Pomodoro Complete!", "Great work! Time for a break."),
            SessionKind::ShortBreak => ("Break Complete!", "Ready to get back to work?"),
            SessionKind::LongBreak => (
                "Long Break Complete!",
                "Refreshed and ready for the next session!",
            ),
        };
        Self {
            kind,
            title: title.to_string(),
            body: body.to_string(),
        }
    }
}

#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Short name used in logs and dispatch reports.
    fn name(&self) -> &str;

    fn kind(&self) -> ChannelKind;

    /// Delivers the message.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Delivered
    /// - `Err(PomoError::Unavailable)`: Channel not usable right now (e.g. audio not armed)
    /// - `Err(_)`: Delivery failed
    async fn send(&self, message: &NotificationMessage) -> Result<()>;

    /// Signals that a user interaction happened. Channels gated on a prior
    /// gesture (audio) become usable from here on.
    fn arm(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_per_kind() {
        let focus = NotificationMessage::for_kind(SessionKind::Focus);
        assert_eq!(focus.title, "Pomodoro Complete!");
        assert_eq!(focus.body, "Great work! Time for a break.");

        let short = NotificationMessage::for_kind(SessionKind::ShortBreak);
        assert_eq!(short.title, "Break Complete!");

        let long = NotificationMessage::for_kind(SessionKind::LongBreak);
        assert_eq!(long.body, "Refreshed and ready for the next session!");
    }
}

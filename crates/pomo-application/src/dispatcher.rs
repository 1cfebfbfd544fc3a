//! Notification dispatcher.
//!
//! Fans one completion message out to every channel concurrently. A channel
//! that fails or does not answer in time is reported, never propagated.

use futures::future::join_all;
use pomo_core::error::PomoError;
use pomo_core::notification::{ChannelKind, NotificationChannel, NotificationMessage};
use pomo_core::session::SessionKind;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Upper bound on a single channel's delivery.
const CHANNEL_TIMEOUT: Duration = Duration::from_secs(10);

/// Which channels delivered and which did not.
#[derive(Debug, Default)]
pub struct DispatchReport {
    pub delivered: Vec<String>,
    pub failed: Vec<(String, PomoError)>,
}

impl DispatchReport {
    /// Whether the user saw or heard anything.
    pub fn reached_user(&self) -> bool {
        !self.delivered.is_empty()
    }
}

pub struct NotificationDispatcher {
    channels: Vec<Arc<dyn NotificationChannel>>,
    enabled: AtomicBool,
}

impl NotificationDispatcher {
    pub fn new(channels: Vec<Arc<dyn NotificationChannel>>) -> Self {
        Self {
            channels,
            enabled: AtomicBool::new(true),
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn channel_kinds(&self) -> Vec<ChannelKind> {
        self.channels.iter().map(|c| c.kind()).collect()
    }

    /// Forwards a user interaction to every channel, so gesture-gated audio
    /// becomes usable.
    pub fn arm_audio(&self) {
        for channel in &self.channels {
            channel.arm();
        }
    }

    /// Announces the completion of a segment of `kind`.
    ///
    /// Call exactly once per completion signal.
    pub async fn notify(&self, kind: SessionKind) -> DispatchReport {
        if !self.enabled.load(Ordering::SeqCst) {
            tracing::debug!("[Dispatcher] Notifications disabled; skipping {}", kind);
            return DispatchReport::default();
        }

        let message = NotificationMessage::for_kind(kind);
        let results = join_all(self.channels.iter().map(|channel| {
            let message = &message;
            async move {
                let result = match tokio::time::timeout(CHANNEL_TIMEOUT, channel.send(message)).await
                {
                    Ok(result) => result,
                    Err(_) => Err(PomoError::unavailable(format!(
                        "no answer within {:?}",
                        CHANNEL_TIMEOUT
                    ))),
                };
                (channel.name().to_string(), result)
            }
        }))
        .await;

        let mut report = DispatchReport::default();
        for (name, result) in results {
            match result {
                Ok(()) => report.delivered.push(name),
                Err(e) => {
                    tracing::debug!("[Dispatcher] Channel '{}' did not deliver: {}", name, e);
                    report.failed.push((name, e));
                }
            }
        }

        if report.reached_user() {
            tracing::info!(
                "[Dispatcher] {} completion delivered via {}",
                kind,
                report.delivered.join(", ")
            );
        } else {
            tracing::warn!("[Dispatcher] No channel delivered the {} notification", kind);
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pomo_core::error::Result;
    use std::sync::Mutex;

    struct Recording {
        name: &'static str,
        kind: ChannelKind,
        gated: bool,
        armed: AtomicBool,
        sent: Mutex<Vec<NotificationMessage>>,
    }

    impl Recording {
        fn new(name: &'static str, kind: ChannelKind, gated: bool) -> Arc<Self> {
            Arc::new(Self {
                name,
                kind,
                gated,
                armed: AtomicBool::new(false),
                sent: Mutex::new(Vec::new()),
            })
        }

        fn sent(&self) -> usize {
            self.sent.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl NotificationChannel for Recording {
        fn name(&self) -> &str {
            self.name
        }

        fn kind(&self) -> ChannelKind {
            self.kind
        }

        async fn send(&self, message: &NotificationMessage) -> Result<()> {
            if self.gated && !self.armed.load(Ordering::SeqCst) {
                return Err(PomoError::unavailable("not armed"));
            }
            self.sent.lock().unwrap().push(message.clone());
            Ok(())
        }

        fn arm(&self) {
            self.armed.store(true, Ordering::SeqCst);
        }
    }

    struct Broken;

    #[async_trait]
    impl NotificationChannel for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn kind(&self) -> ChannelKind {
            ChannelKind::System
        }

        async fn send(&self, _message: &NotificationMessage) -> Result<()> {
            Err(PomoError::internal("permission denied"))
        }
    }

    #[tokio::test]
    async fn test_unarmed_audio_degrades_to_visual() {
        let audio = Recording::new("bell", ChannelKind::Audio, true);
        let visual = Recording::new("terminal", ChannelKind::Visual, false);
        let dispatcher = NotificationDispatcher::new(vec![
            audio.clone(),
            visual.clone(),
            Arc::new(Broken),
        ]);

        let report = dispatcher.notify(SessionKind::Focus).await;

        assert_eq!(report.delivered, vec!["terminal".to_string()]);
        assert_eq!(report.failed.len(), 2);
        assert_eq!(audio.sent(), 0);
        assert_eq!(visual.sent(), 1);
        assert_eq!(
            visual.sent.lock().unwrap()[0].title,
            "Pomodoro Complete!"
        );
    }

    #[tokio::test]
    async fn test_arming_enables_audio() {
        let audio = Recording::new("bell", ChannelKind::Audio, true);
        let dispatcher = NotificationDispatcher::new(vec![audio.clone()]);

        dispatcher.arm_audio();
        let report = dispatcher.notify(SessionKind::ShortBreak).await;

        assert!(report.reached_user());
        assert_eq!(audio.sent(), 1);
    }

    #[tokio::test]
    async fn test_disabled_sends_nothing() {
        let visual = Recording::new("terminal", ChannelKind::Visual, false);
        let dispatcher = NotificationDispatcher::new(vec![visual.clone()]);
        dispatcher.set_enabled(false);

        let report = dispatcher.notify(SessionKind::LongBreak).await;
        assert!(!report.reached_user());
        assert_eq!(visual.sent(), 0);
    }

    struct Hanging;

    #[async_trait]
    impl NotificationChannel for Hanging {
        fn name(&self) -> &str {
            "hanging"
        }

        fn kind(&self) -> ChannelKind {
            ChannelKind::System
        }

        async fn send(&self, _message: &NotificationMessage) -> Result<()> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_channel_that_never_answers_is_cut_off() {
        let visual = Recording::new("terminal", ChannelKind::Visual, false);
        let dispatcher = NotificationDispatcher::new(vec![Arc::new(Hanging), visual.clone()]);

        let report = dispatcher.notify(SessionKind::Focus).await;

        assert_eq!(report.delivered, vec!["terminal".to_string()]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "hanging");
        assert!(matches!(report.failed[0].1, PomoError::Unavailable(_)));
    }
}

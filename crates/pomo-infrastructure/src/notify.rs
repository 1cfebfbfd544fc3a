//! Notification channels for a terminal host.
//!
//! - [`TerminalBellChannel`]: audible bell, usable only once armed by a user
//!   interaction.
//! - [`TerminalTextChannel`]: a visible line in the terminal. Always available.
//! - [`DesktopNotificationChannel`]: OS notification via `notify-send` or
//!   `osascript`, best effort.

use async_trait::async_trait;
use pomo_core::error::{PomoError, Result};
use pomo_core::notification::{ChannelKind, NotificationChannel, NotificationMessage};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// How long an OS notifier process may run before it is given up on.
const DESKTOP_NOTIFY_TIMEOUT: Duration = Duration::from_secs(5);

type SharedWriter = Arc<Mutex<Box<dyn Write + Send>>>;

fn write_to(writer: &SharedWriter, text: &str) -> Result<()> {
    let mut out = writer.lock().unwrap_or_else(PoisonError::into_inner);
    out.write_all(text.as_bytes())?;
    out.flush()?;
    Ok(())
}

pub struct TerminalBellChannel {
    writer: SharedWriter,
    armed: AtomicBool,
}

impl TerminalBellChannel {
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Arc::new(Mutex::new(writer)),
            armed: AtomicBool::new(false),
        }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NotificationChannel for TerminalBellChannel {
    fn name(&self) -> &str {
        "bell"
    }

    fn kind(&self) -> ChannelKind {
        ChannelKind::Audio
    }

    async fn send(&self, _message: &NotificationMessage) -> Result<()> {
        if !self.is_armed() {
            return Err(PomoError::unavailable("audio not armed by a user interaction"));
        }
        write_to(&self.writer, "\x07")
    }

    fn arm(&self) {
        if !self.armed.swap(true, Ordering::SeqCst) {
            tracing::debug!("[Notify] Audio armed");
        }
    }
}

pub struct TerminalTextChannel {
    writer: SharedWriter,
}

impl TerminalTextChannel {
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Arc::new(Mutex::new(writer)),
        }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }
}

#[async_trait]
impl NotificationChannel for TerminalTextChannel {
    fn name(&self) -> &str {
        "terminal"
    }

    fn kind(&self) -> ChannelKind {
        ChannelKind::Visual
    }

    async fn send(&self, message: &NotificationMessage) -> Result<()> {
        write_to(
            &self.writer,
            &format!("\n*** {} {}\n", message.title, message.body),
        )
    }
}

/// How the desktop notifier expects its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DesktopNotifier {
    /// `notify-send <title> <body>` (freedesktop)
    NotifySend,
    /// `osascript -e 'display notification ...'` (macOS)
    Osascript,
}

pub struct DesktopNotificationChannel {
    program: String,
    notifier: DesktopNotifier,
}

impl DesktopNotificationChannel {
    /// Picks the notifier for the current platform.
    ///
    /// # Returns
    ///
    /// `None` on platforms without a supported notifier.
    pub fn detect() -> Option<Self> {
        if cfg!(target_os = "macos") {
            Some(Self::with_program("osascript", DesktopNotifier::Osascript))
        } else if cfg!(all(unix, not(target_os = "macos"))) {
            Some(Self::with_program("notify-send", DesktopNotifier::NotifySend))
        } else {
            None
        }
    }

    pub fn with_program(program: impl Into<String>, notifier: DesktopNotifier) -> Self {
        Self {
            program: program.into(),
            notifier,
        }
    }

    fn args(&self, message: &NotificationMessage) -> Vec<String> {
        match self.notifier {
            DesktopNotifier::NotifySend => vec![message.title.clone(), message.body.clone()],
            DesktopNotifier::Osascript => vec![
                "-e".to_string(),
                format!(
                    "display notification \"{}\" with title \"{}\"",
                    escape_applescript(&message.body),
                    escape_applescript(&message.title)
                ),
            ],
        }
    }
}

fn escape_applescript(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

#[async_trait]
impl NotificationChannel for DesktopNotificationChannel {
    fn name(&self) -> &str {
        "desktop"
    }

    fn kind(&self) -> ChannelKind {
        ChannelKind::System
    }

    async fn send(&self, message: &NotificationMessage) -> Result<()> {
        let mut command = tokio::process::Command::new(&self.program);
        command.args(self.args(message));
        run_notifier(command, DESKTOP_NOTIFY_TIMEOUT).await
    }
}

/// Runs a notifier to completion, killing it if it outlives `timeout`.
///
/// A notifier with no daemon to talk to can block indefinitely.
async fn run_notifier(mut command: tokio::process::Command, timeout: Duration) -> Result<()> {
    let program = command.as_std().get_program().to_string_lossy().into_owned();
    let status = command
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .kill_on_drop(true)
        .status();

    let status = match tokio::time::timeout(timeout, status).await {
        Ok(status) => {
            status.map_err(|e| PomoError::unavailable(format!("{} not runnable: {}", program, e)))?
        }
        Err(_) => {
            tracing::warn!("[Notify] {} did not finish within {:?}", program, timeout);
            return Err(PomoError::unavailable(format!(
                "{} timed out after {:?}",
                program, timeout
            )));
        }
    };

    if status.success() {
        Ok(())
    } else {
        Err(PomoError::unavailable(format!(
            "{} exited with {}",
            program, status
        )))
    }
}

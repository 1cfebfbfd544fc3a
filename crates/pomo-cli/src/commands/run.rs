//! Interactive timer session.

use anyhow::Result;
use pomo_application::{
    ControllerEvent, CountdownEngine, NotificationDispatcher, SessionCoordinator, SettingsService,
    TimerController, TimerServices, VisibilityReconciler,
};
use pomo_core::notification::NotificationChannel;
use pomo_core::session::{SessionKind, SessionRecord};
use pomo_core::timer::{Clock, MonotonicClock, TimerSignal, Visibility, format_clock};
use pomo_execution::select_tick_source;
use pomo_infrastructure::{
    AppConfig, DesktopNotificationChannel, NotificationConfig, TerminalBellChannel,
    TerminalTextChannel,
};
use std::io::Write;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::settings::describe;
use crate::backend::Backend;
use crate::capture::PromptCapture;
use crate::input::{HELP, Input};

fn channels(config: &NotificationConfig) -> Vec<Arc<dyn NotificationChannel>> {
    let mut channels: Vec<Arc<dyn NotificationChannel>> = vec![Arc::new(TerminalTextChannel::stdout())];
    if config.sound {
        channels.push(Arc::new(TerminalBellChannel::stdout()));
    }
    if config.desktop {
        if let Some(desktop) = DesktopNotificationChannel::detect() {
            channels.push(Arc::new(desktop));
        }
    }
    channels
}

pub async fn run(config: &AppConfig, backend: Backend) -> Result<()> {
    let clock: Arc<dyn Clock> = Arc::new(MonotonicClock);
    let tick_source = select_tick_source(
        config.timer.tick_source,
        tokio::runtime::Handle::current(),
    );
    let (engine, signals) = CountdownEngine::new(
        0,
        SessionKind::Focus,
        clock.clone(),
        tick_source,
        config.timer.tick_period(),
    );

    let dispatcher = Arc::new(NotificationDispatcher::new(channels(&config.notifications)));
    dispatcher.set_enabled(config.notifications.enabled);
    tracing::info!(
        "[Cli] Notification channels: {:?}",
        dispatcher.channel_kinds()
    );
    let settings = Arc::new(SettingsService::new(
        backend.settings.clone(),
        backend.identity.clone(),
        backend.local.clone(),
    ));
    let coordinator = Arc::new(SessionCoordinator::new(
        backend.sessions.clone(),
        backend.identity.clone(),
        backend.local.clone(),
    ));
    let capture = PromptCapture::new();

    let (controller, events) = TimerController::new(TimerServices {
        engine: engine.clone(),
        coordinator,
        dispatcher: dispatcher.clone(),
        settings: settings.clone(),
        capture: Arc::new(capture.clone()),
        sessions: backend.sessions.clone(),
        identity: backend.identity.clone(),
    });

    let loaded = controller.initialize().await;
    println!("pomo v{}", env!("CARGO_PKG_VERSION"));
    println!(
        "{} ({})",
        describe(&loaded.settings),
        if backend.identity.is_authenticated() {
            "signed in"
        } else {
            "local only"
        }
    );
    if settings.needs_migration().await.unwrap_or(false) {
        println!("Local settings found. Type 'migrate' to copy them to your account or 'skip-migration'.");
    }
    println!("Press Enter to start. Type 'help' for commands.");

    let cancel = CancellationToken::new();
    let (visibility_tx, visibility_rx) = mpsc::unbounded_channel();
    let reconciler = Arc::new(VisibilityReconciler::new(engine, clock));

    let mut tasks: Vec<JoinHandle<()>> = Vec::new();
    {
        let controller = controller.clone();
        let cancel = cancel.clone();
        tasks.push(tokio::spawn(async move { controller.run(signals, cancel).await }));
    }
    {
        let reconciler = reconciler.clone();
        let cancel = cancel.clone();
        tasks.push(tokio::spawn(async move { reconciler.run(visibility_rx, cancel).await }));
    }
    tasks.push(spawn_renderer(controller.clone(), events, cancel.clone()));
    if let Some(task) = spawn_resume_watcher(visibility_tx.clone(), cancel.clone()) {
        tasks.push(task);
    }

    let mut lines = spawn_input_reader()?;
    loop {
        let line = tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = lines.recv() => match line {
                Some(line) => line,
                None => break,
            },
        };

        // Any interaction unlocks audio.
        dispatcher.arm_audio();
        if capture.offer(&line) {
            continue;
        }

        match Input::parse(&line) {
            Input::Toggle => controller.toggle(),
            Input::Start => controller.start(),
            Input::Pause => controller.pause(),
            Input::Resume => controller.resume(),
            Input::Reset => controller.reset(),
            Input::Switch(kind) => controller.switch_kind(kind),
            Input::Status => println!("{}", controller.status()),
            Input::Sync => {
                let _ = visibility_tx.send(Visibility::Foreground);
            }
            Input::ResetRotation => {
                controller.reset_rotation();
                println!("Completed pomodoros reset.");
            }
            Input::Migrate => match settings.migrate_local_to_account().await {
                Ok(true) => {
                    controller.apply_settings(&settings.current());
                    println!("Settings copied: {}", describe(&settings.current()));
                }
                Ok(false) => println!("No local settings to copy."),
                Err(e) => println!("Migration failed: {}", e),
            },
            Input::SkipMigration => match settings.skip_migration().await {
                Ok(()) => println!("Local settings will stay local."),
                Err(e) => println!("Could not record that: {}", e),
            },
            Input::Help => println!("{}", HELP),
            Input::Quit => break,
            Input::Unknown(text) => println!("Unknown command '{}'. Type 'help'.", text),
        }
    }

    println!("\nStopping...");
    capture.cancel();
    cancel.cancel();
    for task in tasks {
        let _ = task.await;
    }
    controller.shutdown().await;
    Ok(())
}

/// Reads stdin on a dedicated thread. A blocking read must not hold up
/// runtime shutdown, so the thread is detached and dies with the process.
fn spawn_input_reader() -> Result<mpsc::UnboundedReceiver<String>> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::Builder::new()
        .name("pomo-input".to_string())
        .spawn(move || {
            for line in std::io::stdin().lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!("[Cli] Failed to read input: {}", e);
                        break;
                    }
                }
            }
        })?;
    Ok(rx)
}

fn print_status_line(text: &str) {
    print!("\r{}    ", text);
    let _ = std::io::stdout().flush();
}

fn describe_previous(record: &SessionRecord) -> String {
    let minutes = record
        .actual_duration_secs
        .unwrap_or(record.planned_duration_secs)
        / 60;
    let ended = record
        .ended_at
        .map(|t| t.with_timezone(&chrono::Local).format("%a %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string());
    match record.notes.as_deref() {
        Some(notes) => format!("Last focus session: {} min, ended {}: {}", minutes, ended, notes),
        None => format!("Last focus session: {} min, ended {}", minutes, ended),
    }
}

fn spawn_renderer(
    controller: Arc<TimerController>,
    mut events: mpsc::UnboundedReceiver<ControllerEvent>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let event = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                event = events.recv() => match event {
                    Some(event) => event,
                    None => break,
                },
            };

            match event {
                ControllerEvent::Timer(TimerSignal::Completed { .. }) => println!(),
                ControllerEvent::Timer(_) => print_status_line(&controller.status().to_string()),
                ControllerEvent::PreviousSession(record) => {
                    println!("\n{}", describe_previous(&record));
                }
                ControllerEvent::SegmentFinished {
                    completed,
                    next,
                    next_seconds,
                } => {
                    println!(
                        "{} done. Pomodoros completed: {}. Next: {} ({})",
                        completed.kind.label(),
                        completed.pomodoros_completed,
                        next.label(),
                        format_clock(next_seconds)
                    );
                }
                ControllerEvent::Notified(report) => {
                    if !report.reached_user() {
                        tracing::warn!("[Cli] Completion notification reached no channel");
                    }
                }
                ControllerEvent::AutoStarted(kind) => println!("Starting {}.", kind.label()),
            }
        }
    })
}

/// Maps a resume after a terminal suspend (`SIGCONT`) to a foreground event.
#[cfg(unix)]
fn spawn_resume_watcher(
    tx: mpsc::UnboundedSender<Visibility>,
    cancel: CancellationToken,
) -> Option<JoinHandle<()>> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut resumed = match signal(SignalKind::from_raw(libc::SIGCONT)) {
        Ok(stream) => stream,
        Err(e) => {
            tracing::warn!("[Cli] Cannot watch for SIGCONT: {}", e);
            return None;
        }
    };

    Some(tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                received = resumed.recv() => {
                    if received.is_none() {
                        break;
                    }
                    tracing::debug!("[Cli] Resumed from suspend");
                    let _ = tx.send(Visibility::Foreground);
                }
            }
        }
    }))
}

#[cfg(not(unix))]
fn spawn_resume_watcher(
    _tx: mpsc::UnboundedSender<Visibility>,
    _cancel: CancellationToken,
) -> Option<JoinHandle<()>> {
    None
}

use anyhow::Result;
use clap::Args;
use pomo_application::{RemoteSync, SettingsService};
use pomo_core::settings::Settings;

use crate::backend::Backend;

#[derive(Args, Debug, Default)]
pub struct SetArgs {
    /// Focus minutes (1-60)
    #[arg(long)]
    pub focus: Option<u32>,
    /// Short break minutes (1-30)
    #[arg(long)]
    pub short_break: Option<u32>,
    /// Long break minutes (1-60)
    #[arg(long)]
    pub long_break: Option<u32>,
    /// Focus segments before a long break (1-10)
    #[arg(long)]
    pub interval: Option<u32>,
    /// Start breaks automatically
    #[arg(long)]
    pub auto_start_breaks: Option<bool>,
    /// Start focus segments automatically
    #[arg(long)]
    pub auto_start_focus: Option<bool>,
}

impl SetArgs {
    fn apply(&self, mut settings: Settings) -> Settings {
        if let Some(v) = self.focus {
            settings.focus_minutes = v;
        }
        if let Some(v) = self.short_break {
            settings.short_break_minutes = v;
        }
        if let Some(v) = self.long_break {
            settings.long_break_minutes = v;
        }
        if let Some(v) = self.interval {
            settings.long_break_interval = v;
        }
        if let Some(v) = self.auto_start_breaks {
            settings.auto_start_breaks = v;
        }
        if let Some(v) = self.auto_start_focus {
            settings.auto_start_focus = v;
        }
        settings
    }
}

fn service(backend: &Backend) -> SettingsService {
    SettingsService::new(
        backend.settings.clone(),
        backend.identity.clone(),
        backend.local.clone(),
    )
}

pub fn describe(settings: &Settings) -> String {
    format!(
        "focus {} min, short break {} min, long break {} min, long break every {} pomodoros, \
         auto-start breaks: {}, auto-start focus: {}",
        settings.focus_minutes,
        settings.short_break_minutes,
        settings.long_break_minutes,
        settings.long_break_interval,
        on_off(settings.auto_start_breaks),
        on_off(settings.auto_start_focus)
    )
}

fn on_off(flag: bool) -> &'static str {
    if flag { "on" } else { "off" }
}

pub async fn show(backend: &Backend) -> Result<()> {
    let loaded = service(backend).load().await;
    println!("{} (from {:?})", describe(&loaded.settings), loaded.source);
    Ok(())
}

pub async fn set(backend: &Backend, args: SetArgs) -> Result<()> {
    let svc = service(backend);
    let current = svc.load().await.settings;
    let report = svc.save(args.apply(current)).await?;

    println!("Saved: {}", describe(&report.settings));
    print_remote(&report.remote);
    Ok(())
}

pub fn print_remote(remote: &RemoteSync) {
    match remote {
        RemoteSync::Skipped => println!("Stored locally (not signed in)."),
        RemoteSync::Synced => println!("Synced to your account."),
        RemoteSync::Failed(e) => println!("Stored locally, but saving to your account failed: {}", e),
    }
}

pub async fn migrate(backend: &Backend, skip: bool) -> Result<()> {
    let svc = service(backend);
    if skip {
        svc.skip_migration().await?;
        println!("Local settings will stay local.");
        return Ok(());
    }
    if svc.migrate_local_to_account().await? {
        println!("Local settings copied to your account: {}", describe(&svc.current()));
    } else {
        println!("No local settings to copy.");
    }
    Ok(())
}

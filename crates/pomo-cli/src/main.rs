use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use pomo_core::timer::TickSourceKind;
use pomo_infrastructure::{AppConfig, PomoPaths};
use std::path::PathBuf;

mod backend;
mod capture;
mod commands;
mod input;
mod logging;

use backend::Backend;

#[derive(Parser)]
#[command(name = "pomo", version)]
#[command(about = "pomo - pomodoro timer that keeps time while in the background", long_about = None)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Persistence façade URL (overrides config and POMO_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Tick execution context: background or interval
    #[arg(long, global = true)]
    tick_source: Option<TickSourceKind>,

    /// Log filter, e.g. "debug" or "pomo_application=trace"
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Keep config, local state and logs under this directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Keep local state in memory only
    #[arg(long, global = true)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the interactive timer (default)
    Run,
    /// Show daily focus statistics
    Stats {
        /// Number of days to include
        #[arg(long, default_value_t = 7)]
        days: u32,
        /// Last day of the range (YYYY-MM-DD), today if omitted
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Show or change timer settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print the active settings and where they came from
    Show,
    /// Change one or more settings
    Set(commands::settings::SetArgs),
    /// Copy locally stored settings to the account
    Migrate {
        /// Mark the migration done without uploading
        #[arg(long)]
        skip: bool,
    },
}

impl Cli {
    fn paths(&self) -> Result<PomoPaths> {
        match &self.data_dir {
            Some(root) => Ok(PomoPaths::with_root(root)),
            None => PomoPaths::platform().context("Failed to resolve platform directories"),
        }
    }

    /// Config file, then environment, then flags.
    fn load_config(&self, paths: &PomoPaths) -> Result<AppConfig> {
        let path = self.config.clone().unwrap_or_else(|| paths.config_file());
        let mut config = AppConfig::load(&path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?;
        config.apply_env_overrides();

        if let Some(url) = &self.api_url {
            config.api.base_url = Some(url.clone());
        }
        if let Some(kind) = self.tick_source {
            config.timer.tick_source = kind;
        }
        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let paths = cli.paths()?;
    let _log_guard = logging::init(&paths.logs_dir(), cli.log_level.as_deref())?;
    let config = cli.load_config(&paths)?;
    let backend = Backend::build(&config, &paths, cli.ephemeral)?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => commands::run::run(&config, backend).await,
        Commands::Stats { days, date } => commands::stats::run(&backend, days, date).await,
        Commands::Settings { action } => match action {
            SettingsAction::Show => commands::settings::show(&backend).await,
            SettingsAction::Set(args) => commands::settings::set(&backend, args).await,
            SettingsAction::Migrate { skip } => commands::settings::migrate(&backend, skip).await,
        },
    }
}

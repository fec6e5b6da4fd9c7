//! # CourseBell Daemon
//!
//! Runs the reminder scheduler: restores persisted triggers, fires due ones
//! (including anything that came due while the process was down), and
//! delivers reminders through the configured channel.
//!
//! Usage:
//!   coursebell                          # Run with ~/.coursebell/config.toml
//!   coursebell --config ./dev.toml      # Custom config
//!   coursebell --tick-interval 5        # Faster due-trigger checks

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use coursebell_channels::{ConsoleNotifier, DiscordNotifier};
use coursebell_core::CourseBellConfig;
use coursebell_core::traits::Notifier;
use coursebell_db::CourseBellDb;
use coursebell_lifecycle::register_jobs;
use coursebell_scheduler::{SqliteTriggerStore, TriggerScheduler, TriggerStore, spawn_scheduler};

#[derive(Parser)]
#[command(name = "coursebell", version, about = "🔔 CourseBell — course event reminder bot")]
struct Cli {
    /// Config file path (default: ~/.coursebell/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Domain database path (default: ~/.coursebell/coursebell.db)
    #[arg(long)]
    db: Option<PathBuf>,

    /// Seconds between due-trigger checks (overrides config)
    #[arg(long)]
    tick_interval: Option<u64>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "coursebell=debug"
    } else {
        "coursebell=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let config = match &cli.config {
        Some(path) => CourseBellConfig::load_from(path)?,
        None => CourseBellConfig::load()?,
    };

    let db_path = cli
        .db
        .unwrap_or_else(|| CourseBellConfig::home_dir().join("coursebell.db"));
    let db = Arc::new(CourseBellDb::open(&db_path)?);
    tracing::info!("💾 Domain database: {}", db_path.display());

    let store = Arc::new(SqliteTriggerStore::open(&config.scheduler.db_path())?);
    let pending = store.count()?;
    tracing::info!("📅 Restored {pending} pending trigger(s)");

    let notifier: Arc<dyn Notifier> = match &config.channel.discord {
        Some(discord) if discord.enabled && !discord.bot_token.is_empty() => {
            let notifier = DiscordNotifier::new(discord.clone());
            match notifier.get_me().await {
                Ok(me) => tracing::info!("🤖 Discord bot: @{}", me.username),
                Err(err) => tracing::warn!(%err, "⚠️ Discord credentials check failed"),
            }
            Arc::new(notifier)
        }
        _ => {
            tracing::info!("No chat channel configured, logging reminders to console");
            Arc::new(ConsoleNotifier)
        }
    };

    let scheduler = Arc::new(TriggerScheduler::new(store));
    register_jobs(&scheduler, db.clone(), db.clone(), db.clone(), notifier);

    let tick_interval = cli
        .tick_interval
        .unwrap_or(config.scheduler.tick_interval_secs);

    tokio::select! {
        _ = spawn_scheduler(scheduler, tick_interval) => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutting down");
        }
    }
    Ok(())
}

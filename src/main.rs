use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::info;

use masjid_sync::cli::args::{Cli, Commands};
use masjid_sync::cli::handlers;
use masjid_sync::db::{self, SqliteNotifier, SqliteStore};
use masjid_sync::prayer_times::SalahAdhanLookup;
use masjid_sync::{AppConfig, AppContext, Collaborators, HttpRemoteSource, SystemClock};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = AppConfig::load().context("Loading config")?;
    if !AppConfig::config_path()?.exists() {
        config.save().context("Writing default config")?;
    }

    // Ensure data directory exists and open DB
    AppConfig::ensure_data_dir()?;
    let db_path = AppConfig::db_path()?;
    let conn = db::repository::open(&db_path)
        .with_context(|| format!("Opening database at {:?}", db_path))?;
    info!("Using database at {:?}", db_path);

    let notifier = Arc::new(SqliteNotifier::new(conn.clone()));
    let ctx = AppContext::new(
        Collaborators {
            remote: Arc::new(HttpRemoteSource::new(&config.remote)?),
            adhan: Arc::new(SalahAdhanLookup::new(config.cities.clone())?),
            store: Arc::new(SqliteStore::new(conn)),
            notifier: notifier.clone(),
            clock: Arc::new(SystemClock),
        },
        config.dev_mode,
    );

    let Some(mosque_id) = cli.mosque.or_else(|| config.mosque.default_id.clone()) else {
        bail!("No mosque selected: pass --mosque <ID> or set mosque.default_id in {:?}", AppConfig::config_path()?);
    };

    match cli.command {
        Commands::Sync => handlers::handle_sync(&ctx, &mosque_id).await?,
        Commands::Times => handlers::handle_times(&ctx, &mosque_id).await?,
        Commands::Month => handlers::handle_month(&ctx, &mosque_id).await?,
        Commands::Resume => handlers::handle_resume(&ctx, &mosque_id).await?,
        Commands::Notify { action } => {
            handlers::handle_notify(&ctx, &notifier, &mosque_id, &action).await?
        }
    }

    Ok(())
}

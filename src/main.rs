//! # GitHub Mirror Main Entry Point
//!
//! `serve` (the default) runs the read API and, on the leader, the sync
//! scheduler. `sync-once` runs a single synchronization and exits. `migrate`
//! applies pending schema migrations.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use github_mirror::{
    config::ConfigLoader,
    db,
    server::run_server,
    sync::SyncOutcome,
    sync_executor::SyncExecutor,
    telemetry,
};
use tracing::info;

#[derive(Parser)]
#[command(name = "github-mirror")]
#[command(about = "Mirror a GitHub profile and its repositories into a local database", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the read API and run the periodic sync
    Serve,
    /// Run one synchronization against the configured database and exit
    SyncOnce,
    /// Apply pending database migrations and exit
    Migrate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration from layered env files and variables
    let config = ConfigLoader::new()
        .load()
        .context("loading configuration")?;
    telemetry::init_tracing(&config).context("initializing telemetry")?;

    info!(profile = %config.profile, "Loaded configuration");
    if let Ok(redacted_json) = config.redacted_json() {
        info!(config = %redacted_json, "Effective configuration");
    }

    let db = db::init_pool(&config)
        .await
        .context("initializing database connection pool")?;
    db::migrate(&db).await?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let role = config.scheduler_role();
            run_server(config, db, role).await
        }
        Commands::SyncOnce => {
            let executor = SyncExecutor::new(&config, Arc::new(db))
                .context("building GitHub client")?;
            match executor.run_once().await {
                SyncOutcome::Succeeded {
                    total_commits,
                    repositories,
                } => {
                    info!(total_commits, repositories, "Sync finished");
                    Ok(())
                }
                SyncOutcome::Failed { message } => bail!("sync failed: {}", message),
                SyncOutcome::Skipped { reason } => bail!("sync skipped: {}", reason),
            }
        }
        Commands::Migrate => {
            info!("Database migrations applied");
            Ok(())
        }
    }
}

//! Sync Executor
//!
//! Runs one GitHub synchronization: build a snapshot, swap it into the store
//! and append the outcome to the attempt log. Runs never overlap; a run
//! requested while another is in flight is skipped.

use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use sea_orm::DatabaseConnection;
use tokio::sync::Mutex;
use tracing::{error, info, instrument, warn};

use crate::config::AppConfig;
use crate::github::GitHubClient;
use crate::models::SyncStatus;
use crate::repositories::{SnapshotRepository, SyncAttemptRepository};
use crate::sync::{Snapshot, SnapshotBuilder, SyncError, SyncOutcome};
use crate::telemetry::{TraceContext, with_trace_context};

/// Message stored on successful attempts.
pub const SUCCESS_MESSAGE: &str = "sync completed";

/// Executes synchronization runs against the configured account
pub struct SyncExecutor {
    username: Option<String>,
    builder: SnapshotBuilder,
    snapshots: SnapshotRepository,
    attempts: SyncAttemptRepository,
    run_lock: Mutex<()>,
}

impl SyncExecutor {
    /// Create an executor from the loaded configuration.
    pub fn new(config: &AppConfig, db: Arc<DatabaseConnection>) -> Result<Self, reqwest::Error> {
        let client = GitHubClient::new(&config.github)?;
        if !client.is_authenticated() {
            warn!("No GitHub token configured; using anonymous API rate limits");
        }

        Ok(Self {
            username: config.github.tracked_username().map(str::to_string),
            builder: SnapshotBuilder::new(client),
            snapshots: SnapshotRepository::new(db.clone()),
            attempts: SyncAttemptRepository::new(db),
            run_lock: Mutex::new(()),
        })
    }

    /// Tracked GitHub login, if configured.
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Perform one synchronization run.
    ///
    /// Without a configured username nothing is fetched and no attempt row is
    /// written. Otherwise exactly one attempt row is appended: the `success`
    /// row commits together with the new snapshot, and any failure (including
    /// a failed swap) leaves the stored snapshot untouched and appends a
    /// `failed` row instead.
    #[instrument(skip(self))]
    pub async fn run_once(&self) -> SyncOutcome {
        let Some(username) = self.username.as_deref() else {
            error!("GitHub username is not configured; skipping sync");
            counter!("github_sync_runs_total", "status" => "skipped").increment(1);
            return SyncOutcome::Skipped {
                reason: "GitHub username is not configured".to_string(),
            };
        };

        let Ok(_guard) = self.run_lock.try_lock() else {
            warn!("A sync run is already in progress; skipping");
            counter!("github_sync_runs_total", "status" => "skipped").increment(1);
            return SyncOutcome::Skipped {
                reason: "sync already in progress".to_string(),
            };
        };

        with_trace_context(TraceContext::generate("sync"), self.execute(username)).await
    }

    async fn execute(&self, username: &str) -> SyncOutcome {
        let started = Instant::now();
        info!(username, "Starting GitHub sync");

        let result = self.sync(username).await;
        histogram!("github_sync_duration_ms").record(started.elapsed().as_secs_f64() * 1_000.0);

        match result {
            Ok(snapshot) => {
                counter!("github_sync_runs_total", "status" => "success").increment(1);
                gauge!("github_sync_repositories").set(snapshot.repositories.len() as f64);
                info!(
                    repositories = snapshot.repositories.len(),
                    total_commits = snapshot.total_commits,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "GitHub sync completed"
                );

                SyncOutcome::Succeeded {
                    total_commits: snapshot.total_commits,
                    repositories: snapshot.repositories.len(),
                }
            }
            Err(err) => {
                let message = err.to_string();
                error!(error = %message, "GitHub sync failed");
                self.record_failure(message.clone()).await;

                counter!("github_sync_runs_total", "status" => "failed").increment(1);
                SyncOutcome::Failed { message }
            }
        }
    }

    async fn sync(&self, username: &str) -> Result<Snapshot, SyncError> {
        let snapshot = self.builder.build(username).await?;
        self.snapshots.replace(&snapshot, SUCCESS_MESSAGE).await?;
        Ok(snapshot)
    }

    async fn record_failure(&self, message: String) {
        if let Err(err) = self
            .attempts
            .record(SyncStatus::Failed, Some(message), None)
            .await
        {
            error!(error = %err, "Failed to record failed sync attempt");
        }
    }
}

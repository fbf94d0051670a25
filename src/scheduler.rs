//! # Sync Scheduler
//!
//! Background task that runs one synchronization immediately and then one per
//! configured interval until shutdown. Only the leader process runs it; the
//! next planned run time is published through a [`ScheduleHandle`] so the
//! status endpoint can report it.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use metrics::histogram;
use tokio::time::{Duration, Instant, MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::sync::SyncOutcome;
use crate::sync_executor::SyncExecutor;

/// Shared view of the scheduler's next planned run.
#[derive(Debug, Clone, Default)]
pub struct ScheduleHandle {
    next_run_at: Arc<RwLock<Option<DateTime<Utc>>>>,
}

impl ScheduleHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` when no scheduler is running in this process.
    pub fn next_run_at(&self) -> Option<DateTime<Utc>> {
        self.next_run_at.read().ok().and_then(|guard| *guard)
    }

    fn set(&self, next: Option<DateTime<Utc>>) {
        if let Ok(mut guard) = self.next_run_at.write() {
            *guard = next;
        }
    }
}

/// Background scheduler service.
pub struct SyncScheduler {
    executor: Arc<SyncExecutor>,
    period: Duration,
    handle: ScheduleHandle,
}

impl SyncScheduler {
    pub fn new(executor: Arc<SyncExecutor>, period: Duration, handle: ScheduleHandle) -> Self {
        Self {
            executor,
            period,
            handle,
        }
    }

    /// Run the scheduler loop until the provided shutdown token fires.
    ///
    /// Runs execute inline, so they never overlap; ticks missed while a run
    /// is in progress are skipped rather than stacked. Shutdown is observed
    /// between runs, letting an in-flight run finish.
    #[instrument(skip_all, fields(period_secs = self.period.as_secs()))]
    pub async fn run(self, shutdown: CancellationToken) {
        info!("Starting sync scheduler");
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let started = Instant::now();
        // The first tick fires at once; the interval's next boundary is
        // visible while that run is still in flight.
        self.handle.set(Some(self.next_tick_after(started, started)));

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    info!("Sync scheduler shutdown requested");
                    break;
                }
                _ = ticker.tick() => {
                    let run_started = Instant::now();
                    let outcome = self.executor.run_once().await;
                    histogram!("github_sync_scheduler_run_ms")
                        .record(run_started.elapsed().as_secs_f64() * 1_000.0);

                    let next = self.next_tick_after(started, Instant::now());
                    self.handle.set(Some(next));
                    log_outcome(&outcome, next);
                }
            }
        }

        self.handle.set(None);
        info!("Sync scheduler stopped");
    }

    /// Wall-clock time of the first tick boundary after `now`.
    fn next_tick_after(&self, started: Instant, now: Instant) -> DateTime<Utc> {
        let period = self.period.max(Duration::from_millis(1));
        let elapsed = now.saturating_duration_since(started);
        let periods = elapsed.as_nanos() / period.as_nanos() + 1;
        let boundary = period.saturating_mul(u32::try_from(periods).unwrap_or(u32::MAX));
        let wait = boundary.saturating_sub(elapsed);

        Utc::now() + chrono::Duration::from_std(wait).unwrap_or_else(|_| chrono::Duration::zero())
    }
}

fn log_outcome(outcome: &SyncOutcome, next: DateTime<Utc>) {
    match outcome {
        SyncOutcome::Succeeded {
            total_commits,
            repositories,
        } => debug!(total_commits, repositories, next_run_at = %next, "Scheduled sync succeeded"),
        SyncOutcome::Failed { message } => {
            debug!(error = %message, next_run_at = %next, "Scheduled sync failed")
        }
        SyncOutcome::Skipped { reason } => {
            debug!(reason = %reason, next_run_at = %next, "Scheduled sync skipped")
        }
    }
}

//! # GitHub synchronization engine
//!
//! Builds an in-memory [`Snapshot`] of the tracked account from the GitHub
//! API. Persisting it and recording the run outcome is the job of
//! [`crate::sync_executor::SyncExecutor`].

use sea_orm::DbErr;
use thiserror::Error;

use crate::github::FetchError;

pub mod commit_counter;
pub mod snapshot;

pub use commit_counter::CommitCounter;
pub use snapshot::{RepositorySnapshot, Snapshot, SnapshotBuilder};

/// Errors that abort a synchronization run.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("GitHub fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("failed to persist snapshot: {0}")]
    Persistence(#[from] DbErr),
}

/// Result of one call to [`crate::sync_executor::SyncExecutor::run_once`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Nothing ran: no username configured, or another run was in flight.
    Skipped { reason: String },
    Succeeded {
        total_commits: u64,
        repositories: usize,
    },
    Failed { message: String },
}

impl SyncOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SyncOutcome::Succeeded { .. })
    }
}

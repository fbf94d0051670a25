//! # Repository Layer
//!
//! SeaORM access to the mirrored snapshot and the sync attempt log.

pub mod snapshot;
pub mod sync_attempt;

pub use snapshot::{SnapshotRepository, StoredSnapshot};
pub use sync_attempt::SyncAttemptRepository;

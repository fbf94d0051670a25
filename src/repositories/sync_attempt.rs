//! # SyncAttempt Repository
//!
//! Append-only log of synchronization outcomes.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryOrder, Set,
};
use uuid::Uuid;

use crate::models::sync_attempt::{self, Entity as SyncAttempt, SyncStatus};

/// Repository for sync attempt rows
#[derive(Debug, Clone)]
pub struct SyncAttemptRepository {
    db: Arc<DatabaseConnection>,
}

impl SyncAttemptRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Append one attempt row stamped with the current time.
    pub async fn record(
        &self,
        status: SyncStatus,
        message: Option<String>,
        total_commits: Option<i64>,
    ) -> Result<sync_attempt::Model, DbErr> {
        insert_attempt(self.db.as_ref(), status, message, total_commits).await
    }

    /// Most recent attempt, if any run has been recorded.
    pub async fn latest(&self) -> Result<Option<sync_attempt::Model>, DbErr> {
        SyncAttempt::find()
            .order_by_desc(sync_attempt::Column::AttemptedAt)
            .one(self.db.as_ref())
            .await
    }

    /// Every attempt, newest first.
    pub async fn list(&self) -> Result<Vec<sync_attempt::Model>, DbErr> {
        SyncAttempt::find()
            .order_by_desc(sync_attempt::Column::AttemptedAt)
            .all(self.db.as_ref())
            .await
    }
}

/// Insert one attempt row on `conn`, which may be an open transaction.
pub(crate) async fn insert_attempt<C: ConnectionTrait>(
    conn: &C,
    status: SyncStatus,
    message: Option<String>,
    total_commits: Option<i64>,
) -> Result<sync_attempt::Model, DbErr> {
    sync_attempt::ActiveModel {
        id: Set(Uuid::new_v4()),
        attempted_at: Set(Utc::now().fixed_offset()),
        status: Set(status),
        message: Set(message),
        total_commits: Set(total_commits),
    }
    .insert(conn)
    .await
}

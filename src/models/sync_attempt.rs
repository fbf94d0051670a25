//! SyncAttempt entity model
//!
//! SeaORM entity for the append-only sync_attempts table. Rows are written
//! once per synchronization run and never updated.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One synchronization run outcome
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "sync_attempts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub attempted_at: DateTimeWithTimeZone,

    pub status: SyncStatus,

    /// Completion note on success, error detail on failure
    pub message: Option<String>,

    /// Aggregate commit total; only set on success
    pub total_commits: Option<i64>,
}

/// Outcome of a synchronization attempt
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum SyncStatus {
    #[sea_orm(string_value = "processing")]
    #[serde(rename = "processing")]
    Processing,

    #[sea_orm(string_value = "success")]
    #[serde(rename = "success")]
    Success,

    #[sea_orm(string_value = "failed")]
    #[serde(rename = "failed")]
    Failed,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

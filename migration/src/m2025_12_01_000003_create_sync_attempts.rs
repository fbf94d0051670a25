//! Migration to create the sync_attempts table.
//!
//! Append-only log with one row per synchronization run. The newest row by
//! `attempted_at` is the current sync status.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SyncAttempts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SyncAttempts::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SyncAttempts::AttemptedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(SyncAttempts::Status).text().not_null())
                    .col(ColumnDef::new(SyncAttempts::Message).text().null())
                    .col(ColumnDef::new(SyncAttempts::TotalCommits).big_integer().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_sync_attempts_attempted_at")
                    .table(SyncAttempts::Table)
                    .col(SyncAttempts::AttemptedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_sync_attempts_attempted_at")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(SyncAttempts::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum SyncAttempts {
    Table,
    Id,
    AttemptedAt,
    Status,
    Message,
    TotalCommits,
}

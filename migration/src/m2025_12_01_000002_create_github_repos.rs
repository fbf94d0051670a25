//! Migration to create the github_repos table.
//!
//! One row per non-fork repository owned by the mirrored profile. Rows are
//! removed together with their owner through the cascading foreign key.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(GithubRepos::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GithubRepos::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(GithubRepos::GithubRepoId)
                            .big_integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(GithubRepos::OwnerId).uuid().not_null())
                    .col(ColumnDef::new(GithubRepos::Name).text().not_null())
                    .col(ColumnDef::new(GithubRepos::FullName).text().not_null())
                    .col(ColumnDef::new(GithubRepos::Description).text().null())
                    .col(ColumnDef::new(GithubRepos::HtmlUrl).text().not_null())
                    .col(ColumnDef::new(GithubRepos::Language).text().null())
                    .col(
                        ColumnDef::new(GithubRepos::StargazersCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(GithubRepos::ForksCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(GithubRepos::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GithubRepos::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GithubRepos::PushedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(GithubRepos::DefaultBranch)
                            .text()
                            .not_null()
                            .default("main"),
                    )
                    .col(
                        ColumnDef::new(GithubRepos::CommitCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_github_repos_owner_id")
                            .from(GithubRepos::Table, GithubRepos::OwnerId)
                            .to(GithubUsers::Table, GithubUsers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_github_repos_owner_id")
                    .table(GithubRepos::Table)
                    .col(GithubRepos::OwnerId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_github_repos_owner_id").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(GithubRepos::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum GithubRepos {
    Table,
    Id,
    GithubRepoId,
    OwnerId,
    Name,
    FullName,
    Description,
    HtmlUrl,
    Language,
    StargazersCount,
    ForksCount,
    CreatedAt,
    UpdatedAt,
    PushedAt,
    DefaultBranch,
    CommitCount,
}

#[derive(DeriveIden)]
enum GithubUsers {
    Table,
    Id,
}

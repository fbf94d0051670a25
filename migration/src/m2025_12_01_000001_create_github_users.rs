//! Migration to create the github_users table.
//!
//! Holds the mirrored profile of the tracked GitHub account. The row is
//! replaced wholesale on every successful sync.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(GithubUsers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GithubUsers::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(GithubUsers::Login)
                            .text()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(GithubUsers::Name).text().null())
                    .col(ColumnDef::new(GithubUsers::AvatarUrl).text().not_null())
                    .col(ColumnDef::new(GithubUsers::Bio).text().null())
                    .col(ColumnDef::new(GithubUsers::Location).text().null())
                    .col(ColumnDef::new(GithubUsers::Blog).text().null())
                    .col(ColumnDef::new(GithubUsers::HtmlUrl).text().not_null())
                    .col(
                        ColumnDef::new(GithubUsers::PublicRepos)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(GithubUsers::Followers)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(GithubUsers::Following)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(GithubUsers::RefreshedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(GithubUsers::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum GithubUsers {
    Table,
    Id,
    Login,
    Name,
    AvatarUrl,
    Bio,
    Location,
    Blog,
    HtmlUrl,
    PublicRepos,
    Followers,
    Following,
    RefreshedAt,
}

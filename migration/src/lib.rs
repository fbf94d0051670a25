//! Database migrations for the GitHub mirror.
//!
//! This module contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2025_12_01_000001_create_github_users;
mod m2025_12_01_000002_create_github_repos;
mod m2025_12_01_000003_create_sync_attempts;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2025_12_01_000001_create_github_users::Migration),
            Box::new(m2025_12_01_000002_create_github_repos::Migration),
            Box::new(m2025_12_01_000003_create_sync_attempts::Migration),
        ]
    }
}

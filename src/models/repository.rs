//! RepositoryRecord entity model
//!
//! SeaORM entity for the github_repos table. Each row belongs to exactly one
//! mirrored profile and carries the commit count computed during the sync
//! that wrote it.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

/// Non-fork repository owned by the tracked account
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "github_repos")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Repository id assigned by GitHub (unique)
    #[sea_orm(unique)]
    pub github_repo_id: i64,

    /// Owning profile (cascade on delete)
    pub owner_id: Uuid,

    pub name: String,

    /// `owner/name`, used to address the repository in API calls
    pub full_name: String,

    pub description: Option<String>,

    pub html_url: String,

    pub language: Option<String>,

    pub stargazers_count: i32,

    pub forks_count: i32,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,

    /// Null for repositories that never received a push
    pub pushed_at: Option<DateTimeWithTimeZone>,

    pub default_branch: String,

    /// Commits on the default branch authored by the tracked user (best effort)
    pub commit_count: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user_profile::Entity",
        from = "Column::OwnerId",
        to = "super::user_profile::Column::Id",
        on_delete = "Cascade"
    )]
    Owner,
}

impl Related<super::user_profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

//! UserProfile entity model
//!
//! SeaORM entity for the github_users table, the mirrored profile of the
//! tracked GitHub account.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

/// Mirrored GitHub profile; at most one row per tracked login
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "github_users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// GitHub login (unique)
    #[sea_orm(unique)]
    pub login: String,

    pub name: Option<String>,

    pub avatar_url: String,

    pub bio: Option<String>,

    pub location: Option<String>,

    /// External link shown on the profile ("blog" in the GitHub API)
    pub blog: Option<String>,

    pub html_url: String,

    pub public_repos: i32,

    pub followers: i32,

    pub following: i32,

    /// When this profile row was written by the store replacer
    pub refreshed_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::repository::Entity")]
    Repositories,
}

impl Related<super::repository::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Repositories.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

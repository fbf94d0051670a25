//! # Snapshot Repository
//!
//! Stores the mirrored profile and its repositories. The stored snapshot is
//! only ever swapped as a whole, together with the success row of the attempt
//! log: readers observe either the previous snapshot and attempt or the new
//! ones.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::{Expr, Func, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::github::{GitHubRepo, GitHubUser};
use super::sync_attempt::insert_attempt;
use crate::models::repository::{self, Entity as Repository};
use crate::models::sync_attempt::{self, SyncStatus};
use crate::models::user_profile::{self, Entity as UserProfile};
use crate::sync::{RepositorySnapshot, Snapshot};

/// Profile and repositories as currently stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSnapshot {
    pub profile: user_profile::Model,
    /// Ordered by star count, highest first
    pub repositories: Vec<repository::Model>,
}

/// Repository for the mirrored GitHub snapshot
#[derive(Debug, Clone)]
pub struct SnapshotRepository {
    db: Arc<DatabaseConnection>,
}

impl SnapshotRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Replace the stored snapshot for the profile's login and log the run.
    ///
    /// Existing rows for the login (matched case-insensitively) and any stored
    /// repository carrying one of the incoming GitHub ids are deleted, then the
    /// new profile, its repositories and a `success` attempt row carrying the
    /// commit total are inserted, all in one transaction. Any error rolls the
    /// whole swap back.
    #[instrument(skip_all, fields(login = %snapshot.profile.login))]
    pub async fn replace(
        &self,
        snapshot: &Snapshot,
        message: &str,
    ) -> Result<sync_attempt::Model, DbErr> {
        let now = Utc::now().fixed_offset();
        let txn = self.db.begin().await?;

        let removed = delete_existing(&txn, snapshot).await?;

        let profile = profile_model(&snapshot.profile, now).insert(&txn).await?;

        let repositories: Vec<repository::ActiveModel> = snapshot
            .repositories
            .iter()
            .map(|entry| repository_model(entry, profile.id))
            .collect();
        let inserted = repositories.len();
        if !repositories.is_empty() {
            Repository::insert_many(repositories)
                .exec_without_returning(&txn)
                .await?;
        }

        let total_commits = i64::try_from(snapshot.total_commits).unwrap_or(i64::MAX);
        let attempt = insert_attempt(
            &txn,
            SyncStatus::Success,
            Some(message.to_string()),
            Some(total_commits),
        )
        .await?;

        txn.commit().await?;

        debug!(
            removed_profiles = removed,
            repositories = inserted,
            "Replaced stored snapshot"
        );
        Ok(attempt)
    }

    /// Stored snapshot for `login` (case-insensitive), if any.
    pub async fn load(&self, login: &str) -> Result<Option<StoredSnapshot>, DbErr> {
        let Some(profile) = UserProfile::find()
            .filter(login_matches(login))
            .one(self.db.as_ref())
            .await?
        else {
            return Ok(None);
        };

        let repositories = Repository::find()
            .filter(repository::Column::OwnerId.eq(profile.id))
            .order_by_desc(repository::Column::StargazersCount)
            .order_by_asc(repository::Column::Name)
            .all(self.db.as_ref())
            .await?;

        Ok(Some(StoredSnapshot {
            profile,
            repositories,
        }))
    }
}

async fn delete_existing(txn: &DatabaseTransaction, snapshot: &Snapshot) -> Result<usize, DbErr> {
    let owner_ids: Vec<Uuid> = UserProfile::find()
        .filter(login_matches(&snapshot.profile.login))
        .all(txn)
        .await?
        .into_iter()
        .map(|profile| profile.id)
        .collect();

    let github_ids: Vec<i64> = snapshot.repositories.iter().map(|r| r.repo.id).collect();

    Repository::delete_many()
        .filter(
            repository::Column::OwnerId
                .is_in(owner_ids.clone())
                .or(repository::Column::GithubRepoId.is_in(github_ids)),
        )
        .exec(txn)
        .await?;

    if !owner_ids.is_empty() {
        UserProfile::delete_many()
            .filter(user_profile::Column::Id.is_in(owner_ids.clone()))
            .exec(txn)
            .await?;
    }

    Ok(owner_ids.len())
}

fn login_matches(login: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(user_profile::Column::Login))).eq(login.to_lowercase())
}

fn profile_model(user: &GitHubUser, now: DateTimeWithTimeZone) -> user_profile::ActiveModel {
    user_profile::ActiveModel {
        id: Set(Uuid::new_v4()),
        login: Set(user.login.clone()),
        name: Set(user.name.clone()),
        avatar_url: Set(user.avatar_url.clone()),
        bio: Set(user.bio.clone()),
        location: Set(user.location.clone()),
        blog: Set(user.blog.clone().filter(|blog| !blog.is_empty())),
        html_url: Set(user.html_url.clone()),
        public_repos: Set(saturating_i32(user.public_repos)),
        followers: Set(saturating_i32(user.followers)),
        following: Set(saturating_i32(user.following)),
        refreshed_at: Set(now),
    }
}

fn repository_model(entry: &RepositorySnapshot, owner_id: Uuid) -> repository::ActiveModel {
    let repo: &GitHubRepo = &entry.repo;
    repository::ActiveModel {
        id: Set(Uuid::new_v4()),
        github_repo_id: Set(repo.id),
        owner_id: Set(owner_id),
        name: Set(repo.name.clone()),
        full_name: Set(repo.full_name.clone()),
        description: Set(repo.description.clone()),
        html_url: Set(repo.html_url.clone()),
        language: Set(repo.language.clone()),
        stargazers_count: Set(saturating_i32(repo.stargazers_count)),
        forks_count: Set(saturating_i32(repo.forks_count)),
        created_at: Set(repo.created_at.fixed_offset()),
        updated_at: Set(repo.updated_at.fixed_offset()),
        pushed_at: Set(repo.pushed_at.map(|pushed| pushed.fixed_offset())),
        default_branch: Set(repo.branch().to_string()),
        commit_count: Set(i64::try_from(entry.commit_count).unwrap_or(i64::MAX)),
    }
}

fn saturating_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

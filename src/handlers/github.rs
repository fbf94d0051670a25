//! # GitHub Data Handlers
//!
//! Read side of the mirror: the stored snapshot and the state of the most
//! recent synchronization.

use std::sync::Arc;

use axum::{extract::State, response::Json};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{ApiError, not_found, service_unavailable};
use crate::models::{SyncStatus, repository, user_profile};
use crate::repositories::{SnapshotRepository, SyncAttemptRepository};
use crate::server::AppState;

/// Format used for every sync timestamp in responses (UTC).
pub const DISPLAY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Mirrored profile fields
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserInfo {
    #[schema(example = "octocat")]
    pub login: String,
    pub name: Option<String>,
    pub avatar_url: String,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub blog: Option<String>,
    pub html_url: String,
    pub public_repos: i32,
    pub followers: i32,
    pub following: i32,
}

/// Mirrored repository fields
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RepoInfo {
    /// GitHub repository id
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub html_url: String,
    pub language: Option<String>,
    pub stargazers_count: i32,
    pub forks_count: i32,
    pub updated_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub pushed_at: Option<DateTime<Utc>>,
    pub commit_count: i64,
}

/// Stored snapshot plus the time of the sync that produced it
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GitHubDataResponse {
    pub user_info: UserInfo,
    /// Ordered by star count, highest first
    pub repos: Vec<RepoInfo>,
    pub total_commits: i64,
    #[schema(example = "2025-12-01 08:00:00")]
    pub last_sync_time: String,
}

/// State of the most recent synchronization
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum SyncStatusResponse {
    /// No synchronization has been recorded yet
    NoData {
        #[schema(example = "no_data")]
        status: String,
        message: String,
        next_sync_time: Option<String>,
    },
    Recorded {
        status: SyncStatus,
        last_sync_time: String,
        next_sync_time: Option<String>,
        message: Option<String>,
        total_commits: Option<i64>,
    },
}

/// Mirrored profile and repositories of the tracked account
#[utoipa::path(
    get,
    path = "/api/github/data",
    responses(
        (status = 200, description = "Mirrored GitHub data", body = GitHubDataResponse),
        (status = 404, description = "No profile has been mirrored yet", body = ApiError),
        (status = 503, description = "Latest sync did not succeed", body = ApiError)
    ),
    tag = "github"
)]
pub async fn get_sync_data(
    State(state): State<AppState>,
) -> Result<Json<GitHubDataResponse>, ApiError> {
    let db = Arc::new(state.db.clone());

    let Some(username) = state.config.github.tracked_username() else {
        return Err(not_found("GitHub username is not configured"));
    };

    let Some(stored) = SnapshotRepository::new(db.clone()).load(username).await? else {
        return Err(not_found(
            "No GitHub profile has been mirrored yet; wait for the first sync",
        ));
    };

    let latest = SyncAttemptRepository::new(db).latest().await?;
    let Some(latest) = latest.filter(|attempt| attempt.status == SyncStatus::Success) else {
        return Err(
            service_unavailable("No successful sync backs the stored data; try again later")
                .with_retry_after(60),
        );
    };

    Ok(Json(GitHubDataResponse {
        user_info: user_info(&stored.profile),
        repos: stored.repositories.iter().map(repo_info).collect(),
        total_commits: latest.total_commits.unwrap_or(0),
        last_sync_time: display_time(&latest.attempted_at),
    }))
}

/// Latest sync outcome and next scheduled run
#[utoipa::path(
    get,
    path = "/api/github/sync/status",
    responses(
        (status = 200, description = "Latest sync state", body = SyncStatusResponse)
    ),
    tag = "github"
)]
pub async fn get_sync_status(
    State(state): State<AppState>,
) -> Result<Json<SyncStatusResponse>, ApiError> {
    let next_sync_time = state.schedule.next_run_at().map(|at| display_time(&at));
    let latest = SyncAttemptRepository::new(Arc::new(state.db.clone()))
        .latest()
        .await?;

    let response = match latest {
        None => SyncStatusResponse::NoData {
            status: "no_data".to_string(),
            message: "No synchronization has run yet".to_string(),
            next_sync_time,
        },
        Some(attempt) => SyncStatusResponse::Recorded {
            status: attempt.status,
            last_sync_time: display_time(&attempt.attempted_at),
            next_sync_time,
            message: attempt.message,
            total_commits: attempt.total_commits,
        },
    };

    Ok(Json(response))
}

/// Render `at` in UTC as `YYYY-MM-DD HH:MM:SS`.
pub fn display_time<Tz: TimeZone>(at: &DateTime<Tz>) -> String {
    at.with_timezone(&Utc).format(DISPLAY_TIME_FORMAT).to_string()
}

fn user_info(profile: &user_profile::Model) -> UserInfo {
    UserInfo {
        login: profile.login.clone(),
        name: profile.name.clone(),
        avatar_url: profile.avatar_url.clone(),
        bio: profile.bio.clone(),
        location: profile.location.clone(),
        blog: profile.blog.clone(),
        html_url: profile.html_url.clone(),
        public_repos: profile.public_repos,
        followers: profile.followers,
        following: profile.following,
    }
}

fn repo_info(repo: &repository::Model) -> RepoInfo {
    RepoInfo {
        id: repo.github_repo_id,
        name: repo.name.clone(),
        description: repo.description.clone(),
        html_url: repo.html_url.clone(),
        language: repo.language.clone(),
        stargazers_count: repo.stargazers_count,
        forks_count: repo.forks_count,
        updated_at: repo.updated_at.with_timezone(&Utc),
        created_at: repo.created_at.with_timezone(&Utc),
        pushed_at: repo.pushed_at.map(|at| at.with_timezone(&Utc)),
        commit_count: repo.commit_count,
    }
}

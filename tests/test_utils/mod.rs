//! Test utilities: in-memory databases and a mocked GitHub API.

#![allow(dead_code)]

use anyhow::Result;
use github_mirror::config::{AppConfig, GitHubConfig};
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const USERNAME: &str = "octocat";

/// Sets up an in-memory SQLite database with all migrations applied.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    // A single connection keeps every query on the same in-memory database.
    let mut options = sea_orm::ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).sqlx_logging(false);
    let db = Database::connect(options).await?;

    Migrator::up(&db, None).await?;

    Ok(db)
}

/// Sets up an in-memory SQLite database and returns it wrapped in an Arc.
pub async fn setup_test_db_arc() -> Result<Arc<DatabaseConnection>> {
    Ok(Arc::new(setup_test_db().await?))
}

/// Configuration pointing the GitHub client at `server`.
pub fn config_for(server: &MockServer) -> AppConfig {
    AppConfig {
        github: GitHubConfig {
            username: Some(USERNAME.to_string()),
            token: Some("test-token".to_string()),
            api_base: server.uri(),
            timeout_seconds: 1,
        },
        ..Default::default()
    }
}

pub fn user_json(login: &str) -> Value {
    json!({
        "login": login,
        "name": "The Octocat",
        "avatar_url": format!("https://avatars.githubusercontent.com/{}", login),
        "bio": "Testing things",
        "location": "San Francisco",
        "blog": "https://github.blog",
        "html_url": format!("https://github.com/{}", login),
        "public_repos": 8,
        "followers": 100,
        "following": 3
    })
}

pub fn repo_json(id: i64, name: &str, fork: bool, stars: u32) -> Value {
    json!({
        "id": id,
        "name": name,
        "full_name": format!("{}/{}", USERNAME, name),
        "description": format!("{} description", name),
        "html_url": format!("https://github.com/{}/{}", USERNAME, name),
        "language": "Rust",
        "fork": fork,
        "stargazers_count": stars,
        "forks_count": 1,
        "created_at": "2020-01-01T00:00:00Z",
        "updated_at": "2025-11-30T12:00:00Z",
        "pushed_at": "2025-11-30T12:00:00Z",
        "default_branch": "main"
    })
}

pub async fn mount_user(server: &MockServer, login: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/users/{}", USERNAME)))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json(login)))
        .mount(server)
        .await;
}

pub async fn mount_repos(server: &MockServer, repos: Vec<Value>) {
    Mock::given(method("GET"))
        .and(path(format!("/users/{}/repos", USERNAME)))
        .and(query_param("sort", "pushed"))
        .and(query_param("per_page", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Value::Array(repos)))
        .mount(server)
        .await;
}

/// Repository listing that answers only after the client timeout.
pub async fn mount_slow_repos(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(format!("/users/{}/repos", USERNAME)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(server)
        .await;
}

/// Commit probe for `name` whose `last` relation points at page `last_page`.
pub async fn mount_commits(server: &MockServer, name: &str, last_page: u64) {
    let link = format!(
        "<{}/repos/{}/{}/commits?sha=main&per_page=1&author={}&page={}>; rel=\"last\"",
        server.uri(),
        USERNAME,
        name,
        USERNAME,
        last_page
    );
    Mock::given(method("GET"))
        .and(path(format!("/repos/{}/{}/commits", USERNAME, name)))
        .and(query_param("per_page", "1"))
        .and(query_param("author", USERNAME))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("link", link.as_str())
                .set_body_json(json!([{"sha": "deadbeef"}])),
        )
        .mount(server)
        .await;
}

/// Commit probe for `name` answering with `status`.
pub async fn mount_commits_status(server: &MockServer, name: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(format!("/repos/{}/{}/commits", USERNAME, name)))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({"message": "nope"})))
        .mount(server)
        .await;
}

/// Mounts profile, `count` non-fork repositories and their commit probes.
pub async fn mount_account(server: &MockServer, count: i64, last_page: u64) -> Vec<String> {
    mount_user(server, USERNAME).await;
    let names: Vec<String> = (1..=count).map(|i| format!("repo-{}", i)).collect();
    let repos = names
        .iter()
        .enumerate()
        .map(|(i, name)| repo_json(1000 + i as i64, name, false, i as u32))
        .collect();
    mount_repos(server, repos).await;
    for name in &names {
        mount_commits(server, name, last_page).await;
    }
    names
}

/// Repository listing answering with `status`.
pub async fn mount_repos_status(server: &MockServer, status: u16) {
    Mock::given(method("GET"))
        .and(path(format!("/users/{}/repos", USERNAME)))
        .respond_with(ResponseTemplate::new(status).set_body_string("upstream exploded"))
        .mount(server)
        .await;
}

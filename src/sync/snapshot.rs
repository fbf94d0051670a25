//! Snapshot assembly: profile, own repositories and their commit counts.

use std::collections::HashSet;

use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument};

use super::commit_counter::CommitCounter;
use crate::github::{FetchError, GitHubClient, GitHubRepo, GitHubUser};

/// A repository together with the commit count computed for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositorySnapshot {
    pub repo: GitHubRepo,
    pub commit_count: u64,
}

/// Everything one synchronization run fetched from GitHub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub profile: GitHubUser,
    /// Non-fork repositories in upstream (most recently pushed first) order
    pub repositories: Vec<RepositorySnapshot>,
    pub total_commits: u64,
}

/// Fetches a [`Snapshot`] for one account.
#[derive(Debug, Clone)]
pub struct SnapshotBuilder {
    client: GitHubClient,
    counter: CommitCounter,
}

impl SnapshotBuilder {
    pub fn new(client: GitHubClient) -> Self {
        let counter = CommitCounter::new(client.clone());
        Self { client, counter }
    }

    /// Fetch the profile and repository list concurrently, then count commits
    /// for every own repository in parallel.
    ///
    /// A profile or list failure aborts the build. Commit counting never does.
    #[instrument(skip(self))]
    pub async fn build(&self, username: &str) -> Result<Snapshot, FetchError> {
        let (profile, listed) = tokio::try_join!(
            self.client.user(username),
            self.client.user_repos(username)
        )?;

        let listed_count = listed.len();
        let repos = own_repositories(listed);
        debug!(
            listed = listed_count,
            kept = repos.len(),
            "Filtered forks and duplicate repositories"
        );

        let counts = self.count_commits(&repos, username).await;

        let repositories: Vec<RepositorySnapshot> = repos
            .into_iter()
            .zip(counts)
            .map(|(repo, commit_count)| RepositorySnapshot { repo, commit_count })
            .collect();
        let total_commits = repositories.iter().map(|r| r.commit_count).sum();

        info!(
            repositories = repositories.len(),
            total_commits, "Built GitHub snapshot"
        );

        Ok(Snapshot {
            profile,
            repositories,
            total_commits,
        })
    }

    /// One probe per repository, all in flight at once. The returned counts
    /// line up with `repos`. Dropping this future aborts outstanding probes.
    async fn count_commits(&self, repos: &[GitHubRepo], author: &str) -> Vec<u64> {
        let mut probes = JoinSet::new();
        for (index, repo) in repos.iter().enumerate() {
            let counter = self.counter.clone();
            let full_name = repo.full_name.clone();
            let branch = repo.branch().to_string();
            let author = author.to_string();
            probes.spawn(async move {
                let count = counter.count(&full_name, &branch, &author).await;
                (index, count)
            });
        }

        let mut counts = vec![0; repos.len()];
        while let Some(joined) = probes.join_next().await {
            match joined {
                Ok((index, count)) => counts[index] = count,
                Err(err) => error!(error = %err, "Commit probe task failed; recording 0"),
            }
        }
        counts
    }
}

/// Drop forks and repeated ids, keeping the first occurrence.
fn own_repositories(listed: Vec<GitHubRepo>) -> Vec<GitHubRepo> {
    let mut seen = HashSet::new();
    listed
        .into_iter()
        .filter(|repo| !repo.fork)
        .filter(|repo| seen.insert(repo.id))
        .collect()
}

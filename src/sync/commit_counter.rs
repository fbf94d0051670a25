//! Per-repository commit counting.
//!
//! GitHub has no "commit count" field, so the counter asks for one commit per
//! page and reads the page number of the `last` pagination relation: with a
//! page size of one, the last page number is the number of commits.

use metrics::counter;
use serde::de::IgnoredAny;
use tracing::{debug, warn};

use crate::github::{ApiPage, FetchError, GitHubClient};

/// Counts commits on a repository branch authored by one user.
#[derive(Debug, Clone)]
pub struct CommitCounter {
    client: GitHubClient,
}

impl CommitCounter {
    pub fn new(client: GitHubClient) -> Self {
        Self { client }
    }

    /// Commit count for `full_name` on `branch` by `author`.
    ///
    /// Never fails: any error (non-2xx such as 409 for an empty repository,
    /// timeout, malformed cursor) is logged and counted as 0 for this
    /// repository only.
    pub async fn count(&self, full_name: &str, branch: &str, author: &str) -> u64 {
        match self.try_count(full_name, branch, author).await {
            Ok(count) => {
                debug!(repository = full_name, count, "Counted commits");
                count
            }
            Err(err) => {
                counter!("github_commit_probe_failures_total").increment(1);
                warn!(
                    repository = full_name,
                    error = %err,
                    "Failed to count commits; recording 0"
                );
                0
            }
        }
    }

    async fn try_count(
        &self,
        full_name: &str,
        branch: &str,
        author: &str,
    ) -> Result<u64, FetchError> {
        let path = format!("/repos/{}/commits", full_name);
        let page: ApiPage<Vec<IgnoredAny>> = self
            .client
            .get(
                &path,
                &[("sha", branch), ("per_page", "1"), ("author", author)],
            )
            .await?;

        match page.links.page_of("last") {
            Ok(Some(last)) => Ok(last),
            Ok(None) => Ok(page.payload.len().min(1) as u64),
            Err(source) => Err(FetchError::Pagination { path, source }),
        }
    }
}

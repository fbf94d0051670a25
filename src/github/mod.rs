//! # GitHub REST API access
//!
//! Thin typed client over the GitHub REST API: authenticated GET requests,
//! bounded by a per-request timeout, returning the decoded payload together
//! with the parsed `Link` pagination header.

pub mod client;
pub mod link;
pub mod types;

pub use client::{ApiPage, FetchError, GitHubClient};
pub use link::{LinkError, LinkHeader, LinkRelation};
pub use types::{GitHubRepo, GitHubUser};

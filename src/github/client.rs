//! GitHub REST client.
//!
//! Every request carries the v3 media type and a service `User-Agent`; the
//! `Authorization` header is attached only when a non-blank token is
//! configured (anonymous calls work, at a lower rate limit).

use reqwest::{
    Client, Response,
    header::{ACCEPT, AUTHORIZATION, HeaderMap, LINK, USER_AGENT},
};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument, warn};
use url::Url;

use super::link::{LinkError, LinkHeader};
use super::types::{GitHubRepo, GitHubUser};
use crate::config::GitHubConfig;

const ACCEPT_V3: &str = "application/vnd.github.v3+json";
const BODY_SNIPPET_CHARS: usize = 200;

/// Errors raised by a single GitHub request. Each variant names the request
/// path so the caller can report which fetch failed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("GET {path} failed with status {status}: {body}")]
    Status {
        path: String,
        status: u16,
        body: String,
    },

    #[error("GET {path} timed out")]
    Timeout { path: String },

    #[error("GET {path} network error: {source}")]
    Network {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("GET {path} returned an unparseable body: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("GET {path} returned a malformed Link header: {source}")]
    Pagination {
        path: String,
        #[source]
        source: LinkError,
    },

    #[error("cannot build URL for {path}: {source}")]
    InvalidUrl {
        path: String,
        #[source]
        source: url::ParseError,
    },
}

impl FetchError {
    pub fn path(&self) -> &str {
        match self {
            FetchError::Status { path, .. }
            | FetchError::Timeout { path }
            | FetchError::Network { path, .. }
            | FetchError::Decode { path, .. }
            | FetchError::Pagination { path, .. }
            | FetchError::InvalidUrl { path, .. } => path,
        }
    }

    fn transport(path: &str, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            FetchError::Timeout {
                path: path.to_string(),
            }
        } else {
            FetchError::Network {
                path: path.to_string(),
                source,
            }
        }
    }
}

/// Decoded response body plus its pagination relations.
#[derive(Debug, Clone)]
pub struct ApiPage<T> {
    pub payload: T,
    pub links: LinkHeader,
}

/// GitHub REST API client
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: Client,
    api_base: String,
    token: Option<String>,
    user_agent: String,
}

impl GitHubClient {
    /// Build a client bounded by the configured per-request timeout.
    pub fn new(config: &GitHubConfig) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            token: config.credential().map(str::to_string),
            user_agent: format!("github-mirror/{}", env!("CARGO_PKG_VERSION")),
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Fetch the profile of `username`.
    pub async fn user(&self, username: &str) -> Result<GitHubUser, FetchError> {
        let page = self
            .get::<GitHubUser>(&format!("/users/{}", username), &[])
            .await?;
        Ok(page.payload)
    }

    /// Fetch up to 100 repositories of `username`, most recently pushed first.
    pub async fn user_repos(&self, username: &str) -> Result<Vec<GitHubRepo>, FetchError> {
        let page = self
            .get::<Vec<GitHubRepo>>(
                &format!("/users/{}/repos", username),
                &[("sort", "pushed"), ("per_page", "100")],
            )
            .await?;
        Ok(page.payload)
    }

    /// Issue one GET against `path` (relative to the API base).
    #[instrument(skip(self, query), fields(authenticated = self.token.is_some()))]
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<ApiPage<T>, FetchError> {
        let url = self.endpoint(path, query)?;

        let mut request = self
            .http
            .get(url)
            .header(ACCEPT, ACCEPT_V3)
            .header(USER_AGENT, &self.user_agent);
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("token {}", token));
        }

        let response = request
            .send()
            .await
            .map_err(|err| FetchError::transport(path, err))?;

        log_rate_limit(path, response.headers());

        if !response.status().is_success() {
            return Err(status_error(path, response).await);
        }

        let links = match response.headers().get(LINK).and_then(|h| h.to_str().ok()) {
            Some(raw) => raw.parse::<LinkHeader>().map_err(|source| FetchError::Pagination {
                path: path.to_string(),
                source,
            })?,
            None => LinkHeader::default(),
        };

        let body = response
            .text()
            .await
            .map_err(|err| FetchError::transport(path, err))?;
        let payload = serde_json::from_str(&body).map_err(|source| FetchError::Decode {
            path: path.to_string(),
            source,
        })?;

        Ok(ApiPage { payload, links })
    }

    fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, FetchError> {
        let mut url = Url::parse(&format!("{}{}", self.api_base, path)).map_err(|source| {
            FetchError::InvalidUrl {
                path: path.to_string(),
                source,
            }
        })?;

        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query.iter().copied());
        }

        Ok(url)
    }
}

async fn status_error(path: &str, response: Response) -> FetchError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let body = if body.chars().count() > BODY_SNIPPET_CHARS {
        let truncated: String = body.chars().take(BODY_SNIPPET_CHARS).collect();
        format!("{}...", truncated)
    } else {
        body
    };

    if status == 403 || status == 429 {
        warn!(path, status, "GitHub API refused the request, likely rate limited");
    }

    FetchError::Status {
        path: path.to_string(),
        status,
        body,
    }
}

fn log_rate_limit(path: &str, headers: &HeaderMap) {
    let remaining = headers
        .get("X-RateLimit-Remaining")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u32>().ok());

    if let Some(remaining) = remaining {
        debug!(path, remaining, "GitHub rate limit");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use std::time::Duration;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer, token: Option<&str>) -> GitHubConfig {
        GitHubConfig {
            username: Some("octocat".to_string()),
            token: token.map(str::to_string),
            api_base: server.uri(),
            timeout_seconds: 15,
        }
    }

    #[tokio::test]
    async fn sends_standard_and_auth_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/octocat"))
            .and(header("accept", ACCEPT_V3))
            .and(header("authorization", "token ghp_test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"login": "octocat"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = GitHubClient::new(&config_for(&server, Some("  ghp_test "))).unwrap();
        let page: ApiPage<Value> = client.get("/users/octocat", &[]).await.unwrap();

        assert_eq!(page.payload["login"], "octocat");
        assert!(page.links.is_empty());

        let requests = server.received_requests().await.unwrap();
        let agent = requests[0].headers.get("user-agent").unwrap().to_str().unwrap();
        assert!(agent.starts_with("github-mirror/"));
    }

    #[tokio::test]
    async fn blank_token_sends_no_authorization() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/octocat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let client = GitHubClient::new(&config_for(&server, Some("   "))).unwrap();
        assert!(!client.is_authenticated());
        let _: ApiPage<Value> = client.get("/users/octocat", &[]).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        assert!(requests[0].headers.get("authorization").is_none());
    }

    #[tokio::test]
    async fn query_pairs_and_link_header_are_surfaced() {
        let server = MockServer::start().await;
        let last = format!(
            "<{}/repos/octocat/demo/commits?per_page=1&page=12>; rel=\"last\"",
            server.uri()
        );
        Mock::given(method("GET"))
            .and(path("/repos/octocat/demo/commits"))
            .and(query_param("sha", "main"))
            .and(query_param("per_page", "1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("link", last.as_str())
                    .set_body_json(json!([{"sha": "abc"}])),
            )
            .mount(&server)
            .await;

        let client = GitHubClient::new(&config_for(&server, None)).unwrap();
        let page: ApiPage<Vec<Value>> = client
            .get(
                "/repos/octocat/demo/commits",
                &[("sha", "main"), ("per_page", "1")],
            )
            .await
            .unwrap();

        assert_eq!(page.payload.len(), 1);
        assert_eq!(page.links.page_of("last").unwrap(), Some(12));
    }

    #[tokio::test]
    async fn non_success_status_is_a_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/ghost"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
            .mount(&server)
            .await;

        let client = GitHubClient::new(&config_for(&server, None)).unwrap();
        let err = client.user("ghost").await.unwrap_err();

        match err {
            FetchError::Status { path, status, body } => {
                assert_eq!(path, "/users/ghost");
                assert_eq!(status, 404);
                assert_eq!(body, "Not Found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unparseable_body_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/octocat"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = GitHubClient::new(&config_for(&server, None)).unwrap();
        let err = client.user("octocat").await.unwrap_err();

        assert!(matches!(err, FetchError::Decode { .. }));
        assert_eq!(err.path(), "/users/octocat");
    }

    #[tokio::test]
    async fn slow_responses_time_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/octocat"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({}))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let mut config = config_for(&server, None);
        config.timeout_seconds = 1;
        let client = GitHubClient::new(&config).unwrap();
        let err = client
            .get::<Value>("/users/octocat", &[])
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Timeout { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn long_error_bodies_are_truncated() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/octocat"))
            .respond_with(ResponseTemplate::new(500).set_body_string("x".repeat(500)))
            .mount(&server)
            .await;

        let client = GitHubClient::new(&config_for(&server, None)).unwrap();
        let Err(FetchError::Status { body, .. }) = client.get::<Value>("/users/octocat", &[]).await
        else {
            panic!("expected status error");
        };

        assert_eq!(body.chars().count(), BODY_SNIPPET_CHARS + 3);
    }
}

//! Configuration loading for the GitHub mirror.
//!
//! Loads layered `.env` files and environment variables prefixed with
//! `MIRROR_`, producing a typed [`AppConfig`].

use std::{collections::BTreeMap, env, net::SocketAddr, path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Prefix shared by every environment key this service reads.
const ENV_PREFIX: &str = "MIRROR_";

/// Application configuration derived from `MIRROR_*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct AppConfig {
    #[serde(default = "default_profile")]
    pub profile: String,
    #[serde(default = "default_api_bind_addr")]
    pub api_bind_addr: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_format")]
    pub log_format: String,
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,
    #[serde(default = "default_db_acquire_timeout_ms")]
    pub db_acquire_timeout_ms: u64,
    #[serde(default = "default_cors_allowed_origins")]
    pub cors_allowed_origins: Vec<String>,
    #[serde(default)]
    pub github: GitHubConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    /// Marker present on spawned sub-worker processes; its presence demotes
    /// this process to a scheduler follower.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker_id: Option<String>,
}

/// Upstream GitHub API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct GitHubConfig {
    /// Tracked account. Sync is skipped (with an error log) when absent.
    ///
    /// Environment variable: `MIRROR_GITHUB_USERNAME`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Optional access token; raises the API rate limit when present.
    ///
    /// Environment variable: `MIRROR_GITHUB_TOKEN`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Environment variable: `MIRROR_GITHUB_API_BASE`
    #[serde(default = "default_github_api_base")]
    pub api_base: String,

    /// Per-request timeout bound in seconds.
    ///
    /// Environment variable: `MIRROR_GITHUB_TIMEOUT_SECONDS`
    #[serde(default = "default_github_timeout_seconds")]
    pub timeout_seconds: u64,
}

/// Scheduler cadence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct SyncConfig {
    /// Hours between interval runs (default: 1)
    ///
    /// Environment variable: `MIRROR_SYNC_INTERVAL_HOURS`
    #[serde(default = "default_sync_interval_hours")]
    pub interval_hours: u64,
}

/// Whether this process owns the periodic sync job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerRole {
    Leader,
    Follower,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            profile: default_profile(),
            api_bind_addr: default_api_bind_addr(),
            log_level: default_log_level(),
            log_format: default_log_format(),
            database_url: default_database_url(),
            db_max_connections: default_db_max_connections(),
            db_acquire_timeout_ms: default_db_acquire_timeout_ms(),
            cors_allowed_origins: default_cors_allowed_origins(),
            github: GitHubConfig::default(),
            sync: SyncConfig::default(),
            worker_id: None,
        }
    }
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            username: None,
            token: None,
            api_base: default_github_api_base(),
            timeout_seconds: default_github_timeout_seconds(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_hours: default_sync_interval_hours(),
        }
    }
}

impl GitHubConfig {
    /// Tracked username, if configured and non-blank.
    pub fn tracked_username(&self) -> Option<&str> {
        self.username
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    /// Access token, if configured and non-blank.
    pub fn credential(&self) -> Option<&str> {
        self.token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Validate GitHub settings bounds
    pub fn validate(&self) -> Result<(), ConfigError> {
        Url::parse(&self.api_base).map_err(|source| ConfigError::InvalidGitHubApiBase {
            value: self.api_base.clone(),
            source,
        })?;

        if self.timeout_seconds == 0 || self.timeout_seconds > 120 {
            return Err(ConfigError::InvalidGitHubTimeout {
                value: self.timeout_seconds,
            });
        }

        Ok(())
    }
}

impl SyncConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_hours * 3600)
    }

    /// Validate sync interval bounds (1 hour to 1 week)
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_hours == 0 || self.interval_hours > 168 {
            return Err(ConfigError::InvalidSyncInterval {
                value: self.interval_hours,
            });
        }
        Ok(())
    }
}

impl AppConfig {
    /// Returns the configured bind address as a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        self.api_bind_addr.parse()
    }

    /// Leader unless a sub-worker marker is present.
    pub fn scheduler_role(&self) -> SchedulerRole {
        match self.worker_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => SchedulerRole::Follower,
            _ => SchedulerRole::Leader,
        }
    }

    /// Returns a redacted JSON representation (secrets are redacted).
    pub fn redacted_json(&self) -> serde_json::Result<String> {
        let mut config = self.clone();
        if config.github.token.is_some() {
            config.github.token = Some("[REDACTED]".to_string());
        }
        if let Ok(mut url) = Url::parse(&config.database_url)
            && url.password().is_some()
            && url.set_password(Some("REDACTED")).is_ok()
        {
            config.database_url = url.to_string();
        }
        serde_json::to_string_pretty(&config)
    }

    /// Validates the configuration bounds.
    ///
    /// A missing GitHub username is deliberately not an error here: the
    /// service still serves whatever snapshot is stored and each sync run
    /// reports the misconfiguration instead.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.log_format.as_str(), "json" | "pretty") {
            return Err(ConfigError::InvalidLogFormat {
                value: self.log_format.clone(),
            });
        }

        if self.database_url.trim().is_empty() {
            return Err(ConfigError::MissingDatabaseUrl);
        }

        self.github.validate()?;
        self.sync.validate()?;

        Ok(())
    }
}

fn default_profile() -> String {
    "local".to_string()
}

fn default_api_bind_addr() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_database_url() -> String {
    "sqlite://data/github_data.db?mode=rwc".to_string()
}

fn default_db_max_connections() -> u32 {
    5
}

fn default_db_acquire_timeout_ms() -> u64 {
    30_000
}

fn default_cors_allowed_origins() -> Vec<String> {
    vec!["http://localhost:3000".to_string()]
}

fn default_github_api_base() -> String {
    "https://api.github.com".to_string()
}

fn default_github_timeout_seconds() -> u64 {
    15
}

fn default_sync_interval_hours() -> u64 {
    1
}

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load environment file {path}: {source}")]
    EnvFile {
        path: PathBuf,
        source: dotenvy::Error,
    },
    #[error("invalid api bind address '{value}': {source}")]
    InvalidBindAddr {
        value: String,
        source: std::net::AddrParseError,
    },
    #[error("invalid value '{value}' for {key}")]
    InvalidNumber { key: String, value: String },
    #[error("log format must be 'json' or 'pretty', got '{value}'")]
    InvalidLogFormat { value: String },
    #[error("database url is missing; set MIRROR_DATABASE_URL")]
    MissingDatabaseUrl,
    #[error("invalid GitHub API base '{value}': {source}")]
    InvalidGitHubApiBase {
        value: String,
        source: url::ParseError,
    },
    #[error("GitHub request timeout must be between 1 and 120 seconds, got {value}")]
    InvalidGitHubTimeout { value: u64 },
    #[error("sync interval must be between 1 and 168 hours, got {value}")]
    InvalidSyncInterval { value: u64 },
}

/// Loads configuration using layered `.env` files and `MIRROR_*` env vars.
pub struct ConfigLoader {
    base_dir: PathBuf,
}

impl ConfigLoader {
    /// Creates a new loader rooted at the current working directory.
    pub fn new() -> Self {
        Self {
            base_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// Creates a loader rooted at the provided directory (useful for tests).
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Loads and validates configuration. Process environment wins over files.
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let (mut layered, profile_hint) = self.collect_layered_env()?;

        for (key, value) in env::vars() {
            if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                layered.insert(stripped.to_string(), value);
            }
        }

        let profile = take_string(&mut layered, "PROFILE").unwrap_or(profile_hint);
        let api_bind_addr =
            take_string(&mut layered, "API_BIND_ADDR").unwrap_or_else(default_api_bind_addr);
        let log_level = take_string(&mut layered, "LOG_LEVEL").unwrap_or_else(default_log_level);
        let log_format =
            take_string(&mut layered, "LOG_FORMAT").unwrap_or_else(default_log_format);
        let database_url =
            take_string(&mut layered, "DATABASE_URL").unwrap_or_else(default_database_url);
        let db_max_connections = take_parsed(&mut layered, "DB_MAX_CONNECTIONS")?
            .unwrap_or_else(default_db_max_connections);
        let db_acquire_timeout_ms = take_parsed(&mut layered, "DB_ACQUIRE_TIMEOUT_MS")?
            .unwrap_or_else(default_db_acquire_timeout_ms);

        let cors_allowed_origins = take_string(&mut layered, "CORS_ALLOWED_ORIGINS")
            .map(|origins| {
                origins
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_else(default_cors_allowed_origins);

        let github = GitHubConfig {
            username: take_string(&mut layered, "GITHUB_USERNAME"),
            token: take_string(&mut layered, "GITHUB_TOKEN"),
            api_base: take_string(&mut layered, "GITHUB_API_BASE")
                .unwrap_or_else(default_github_api_base),
            timeout_seconds: take_parsed(&mut layered, "GITHUB_TIMEOUT_SECONDS")?
                .unwrap_or_else(default_github_timeout_seconds),
        };

        let sync = SyncConfig {
            interval_hours: take_parsed(&mut layered, "SYNC_INTERVAL_HOURS")?
                .unwrap_or_else(default_sync_interval_hours),
        };

        let worker_id = take_string(&mut layered, "WORKER_ID");

        let config = AppConfig {
            profile,
            api_bind_addr,
            log_level,
            log_format,
            database_url,
            db_max_connections,
            db_acquire_timeout_ms,
            cors_allowed_origins,
            github,
            sync,
            worker_id,
        };

        config.validate()?;

        match config.bind_addr() {
            Ok(_) => Ok(config),
            Err(source) => Err(ConfigError::InvalidBindAddr {
                value: config.api_bind_addr.clone(),
                source,
            }),
        }
    }

    fn collect_layered_env(&self) -> Result<(BTreeMap<String, String>, String), ConfigError> {
        let mut values = BTreeMap::new();

        self.merge_dotenv(self.base_dir.join(".env"), &mut values)?;
        self.merge_dotenv(self.base_dir.join(".env.local"), &mut values)?;

        let profile = env::var(format!("{ENV_PREFIX}PROFILE"))
            .ok()
            .or_else(|| values.get("PROFILE").cloned())
            .unwrap_or_else(default_profile);

        self.merge_dotenv(
            self.base_dir.join(format!(".env.{}", &profile)),
            &mut values,
        )?;
        self.merge_dotenv(
            self.base_dir.join(format!(".env.{}.local", &profile)),
            &mut values,
        )?;

        Ok((values, profile))
    }

    fn merge_dotenv(
        &self,
        path: PathBuf,
        values: &mut BTreeMap<String, String>,
    ) -> Result<(), ConfigError> {
        match dotenvy::from_path_iter(&path) {
            Ok(iter) => {
                for item in iter {
                    let (key, value) = item.map_err(|source| ConfigError::EnvFile {
                        path: path.clone(),
                        source,
                    })?;
                    if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                        values.insert(stripped.to_string(), value);
                    }
                }
                Ok(())
            }
            Err(dotenvy::Error::Io(ref io_err))
                if io_err.kind() == std::io::ErrorKind::NotFound =>
            {
                Ok(())
            }
            Err(err) => Err(ConfigError::EnvFile { path, source: err }),
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Removes a key, treating blank values as unset.
fn take_string(values: &mut BTreeMap<String, String>, key: &str) -> Option<String> {
    values
        .remove(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn take_parsed<T: std::str::FromStr>(
    values: &mut BTreeMap<String, String>,
    key: &str,
) -> Result<Option<T>, ConfigError> {
    match take_string(values, key) {
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber {
                key: format!("{ENV_PREFIX}{key}"),
                value: raw,
            }),
        None => Ok(None),
    }
}

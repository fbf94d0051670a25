use github_mirror::config::{ConfigError, ConfigLoader, SchedulerRole};
use std::{
    env, fs,
    sync::{Mutex, MutexGuard, OnceLock},
};
use tempfile::TempDir;

const KEYS: &[&str] = &[
    "MIRROR_PROFILE",
    "MIRROR_API_BIND_ADDR",
    "MIRROR_LOG_LEVEL",
    "MIRROR_LOG_FORMAT",
    "MIRROR_DATABASE_URL",
    "MIRROR_CORS_ALLOWED_ORIGINS",
    "MIRROR_GITHUB_USERNAME",
    "MIRROR_GITHUB_TOKEN",
    "MIRROR_GITHUB_API_BASE",
    "MIRROR_GITHUB_TIMEOUT_SECONDS",
    "MIRROR_SYNC_INTERVAL_HOURS",
    "MIRROR_WORKER_ID",
];

fn env_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

fn env_guard() -> MutexGuard<'static, ()> {
    env_lock()
        .lock()
        .unwrap_or_else(|poison| poison.into_inner())
}

fn clear_env() {
    for key in KEYS {
        unsafe {
            env::remove_var(key);
        }
    }
}

fn write_env_file(dir: &TempDir, name: &str, contents: &str) {
    let path = dir.path().join(name);
    fs::write(path, contents).unwrap();
}

fn loader_in(dir: &TempDir) -> ConfigLoader {
    ConfigLoader::with_base_dir(dir.path().to_path_buf())
}

#[test]
fn loads_defaults_when_no_env_present() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    let cfg = loader_in(&temp_dir).load().expect("config loads with defaults");

    assert_eq!(cfg.profile, "local");
    assert_eq!(cfg.api_bind_addr, "0.0.0.0:8000");
    assert_eq!(cfg.log_format, "json");
    assert_eq!(cfg.database_url, "sqlite://data/github_data.db?mode=rwc");
    assert_eq!(cfg.github.api_base, "https://api.github.com");
    assert_eq!(cfg.github.timeout_seconds, 15);
    assert_eq!(cfg.sync.interval_hours, 1);
    assert!(cfg.github.tracked_username().is_none());
    assert_eq!(cfg.scheduler_role(), SchedulerRole::Leader);
    cfg.bind_addr().expect("default bind addr parses");
}

#[test]
fn layered_env_files_apply_in_order() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(&temp_dir, ".env", "MIRROR_API_BIND_ADDR=127.0.0.1:3000\n");
    write_env_file(
        &temp_dir,
        ".env.test",
        "MIRROR_API_BIND_ADDR=192.168.0.10:5000\nMIRROR_GITHUB_USERNAME=from-profile\n",
    );
    write_env_file(
        &temp_dir,
        ".env.test.local",
        "MIRROR_API_BIND_ADDR=10.0.0.5:6000\n",
    );

    // Select profile via .env.local before profile-specific files load.
    write_env_file(
        &temp_dir,
        ".env.local",
        "MIRROR_PROFILE=test\nMIRROR_API_BIND_ADDR=127.0.0.1:4000\nMIRROR_SYNC_INTERVAL_HOURS=6\n",
    );

    let cfg = loader_in(&temp_dir).load().expect("layered config loads");

    assert_eq!(cfg.profile, "test");
    assert_eq!(cfg.api_bind_addr, "10.0.0.5:6000");
    assert_eq!(cfg.github.tracked_username(), Some("from-profile"));
    assert_eq!(cfg.sync.interval_hours, 6);
}

#[test]
fn os_environment_has_highest_precedence() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(
        &temp_dir,
        ".env",
        "MIRROR_GITHUB_USERNAME=file-user\nMIRROR_GITHUB_TOKEN=file-token\n",
    );

    unsafe {
        env::set_var("MIRROR_GITHUB_USERNAME", "env-user");
        env::set_var("MIRROR_WORKER_ID", "worker-2");
    }

    let cfg = loader_in(&temp_dir).load().expect("config loads");

    assert_eq!(cfg.github.tracked_username(), Some("env-user"));
    assert_eq!(cfg.github.credential(), Some("file-token"));
    assert_eq!(cfg.scheduler_role(), SchedulerRole::Follower);
    clear_env();
}

#[test]
fn unprefixed_keys_are_ignored() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(
        &temp_dir,
        ".env",
        "GITHUB_USERNAME=someone\nDATABASE_URL=postgres://elsewhere\n",
    );

    let cfg = loader_in(&temp_dir).load().expect("config loads");

    assert!(cfg.github.tracked_username().is_none());
    assert!(cfg.database_url.starts_with("sqlite://"));
}

#[test]
fn invalid_bind_addr_returns_error() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    unsafe {
        env::set_var("MIRROR_API_BIND_ADDR", "not-an-addr");
    }

    let err = loader_in(&temp_dir).load().unwrap_err();
    assert!(matches!(err, ConfigError::InvalidBindAddr { .. }));
    clear_env();
}

#[test]
fn out_of_range_interval_is_rejected() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(&temp_dir, ".env", "MIRROR_SYNC_INTERVAL_HOURS=0\n");

    let err = loader_in(&temp_dir).load().unwrap_err();
    assert!(matches!(err, ConfigError::InvalidSyncInterval { .. }));
}

#[test]
fn non_numeric_timeout_is_rejected() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(&temp_dir, ".env", "MIRROR_GITHUB_TIMEOUT_SECONDS=soon\n");

    let err = loader_in(&temp_dir).load().unwrap_err();
    assert!(matches!(err, ConfigError::InvalidNumber { .. }));
}

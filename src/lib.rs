//! # GitHub Mirror Library
//!
//! Mirrors a GitHub account's public profile and repository metadata into a
//! local SQL store and serves it over a small read API.

pub mod config;
pub mod db;
pub mod error;
pub mod github;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod scheduler;
pub mod server;
pub mod sync;
pub mod sync_executor;
pub mod telemetry;
pub use migration;

//! # Data Models
//!
//! SeaORM entities for the mirrored GitHub data plus the small response types
//! shared by handlers.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod repository;
pub mod sync_attempt;
pub mod user_profile;

pub use repository::Entity as Repository;
pub use sync_attempt::Entity as SyncAttempt;
pub use sync_attempt::SyncStatus;
pub use user_profile::Entity as UserProfile;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
    /// Path of the interactive API documentation
    pub docs: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "github-mirror".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            docs: "/docs".to_string(),
        }
    }
}

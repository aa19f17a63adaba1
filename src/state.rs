//! Application state management
//!
//! Shared state constructed once at startup and injected into every handler;
//! nothing here lives in process-wide statics.

use crate::config::{AuthConfig, Settings, UploadConfig};
use crate::db::users::UserRepository;
use deadpool_postgres::Pool;
use std::sync::Arc;

/// Application state shared across all handlers
pub struct AppState {
    /// Database connection pool (required)
    pub pool: Pool,

    /// User repository for auth flows
    pub users: UserRepository,

    /// Token signing configuration
    pub auth: AuthConfig,

    /// Upload storage configuration
    pub uploads: UploadConfig,
}

impl AppState {
    pub fn new(pool: Pool, settings: &Settings) -> Self {
        let users = UserRepository::new(pool.clone());

        Self {
            pool,
            users,
            auth: settings.auth.clone(),
            uploads: settings.uploads.clone(),
        }
    }
}

/// Type alias for shared state
pub type SharedState = Arc<AppState>;

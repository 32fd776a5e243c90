//! Application state for Wired.
//!
//! Contains the shared state that is passed to all handlers.

use crate::db::DbPool;
use crate::services::{AuthService, PermissionService, ProjectService, RequestService};
use crate::{config, Result};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: DbPool,
    /// Join request ledger.
    pub requests: RequestService,
    /// Project management service.
    pub projects: ProjectService,
    /// Registration and token service.
    pub auth: AuthService,
}

impl AppState {
    /// Create a new application state from the global configuration.
    pub async fn new() -> Result<Self> {
        let config = config::config();

        let db = crate::db::connect(&config.database.path).await?;

        Ok(Self::from_pool(db, config.auth.bootstrap_token.clone()))
    }

    /// Build the state around an already initialised pool.
    pub fn from_pool(db: DbPool, bootstrap_token: Option<String>) -> Self {
        let requests = RequestService::new(db.clone(), PermissionService::new(db.clone()));
        let projects = ProjectService::new(db.clone());
        let auth = AuthService::new(db.clone(), bootstrap_token);

        Self {
            db,
            requests,
            projects,
            auth,
        }
    }
}

//! Wired - project collaboration platform
//!
//! Connects students, mentors and projects through join requests. Students
//! and mentors ask a project's owner to join; the owner accepts or rejects,
//! and accepted requests become project membership.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::config;
pub use error::{Error, Result};
pub use state::AppState;

/// Build the application router with all middleware applied.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(api::routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

//! API Routes for Wired
//!
//! This module combines all API routes into a single router.
//! Routes are organized by domain and apply appropriate middleware.

mod admin;
mod auth;
mod projects;
mod requests;
pub mod status;
mod users;

use axum::extract::FromRequest;
use axum::Router;

use crate::middleware::{require_admin, require_token};
use crate::{AppState, Error};

/// JSON request body whose rejections render as `INVALID_INPUT` errors.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub struct JsonBody<T>(pub T);

/// Build the complete router.
///
/// Route structure:
/// - /health - Health check (public)
/// - /api/auth/* - Registration (public)
/// - /api/user/*, /api/project/*, /api/request/* - Token-protected
/// - /api/admin/* - Token-protected, admin only
pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(status::routes())
        .nest("/api", api_routes(state))
}

fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::routes())
        .merge(protected_routes(state.clone()))
        .nest("/admin", admin_routes(state))
}

/// Routes that require a valid token.
fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/user", users::routes())
        .nest("/project", projects::routes())
        .nest("/request", requests::routes())
        .layer(axum::middleware::from_fn_with_state(state, require_token))
}

/// Admin routes. `require_admin` runs after `require_token` has injected
/// the caller.
fn admin_routes(state: AppState) -> Router<AppState> {
    admin::routes()
        .layer(axum::middleware::from_fn(require_admin))
        .layer(axum::middleware::from_fn_with_state(state, require_token))
}

//! API token authentication middleware.
//!
//! Validates Bearer tokens. Supports both:
//! - `Authorization: Bearer {token}` headers (recommended)
//! - `?token={token}` query string parameters
//!
//! Token format: `wired_{prefix}_{random}`. See [`AuthService`](crate::services::AuthService)
//! for how tokens are issued and verified.

use axum::{
    body::Body,
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use crate::models::Actor;
use crate::{error::Error, AppState};

/// Extract token from Authorization header or query string.
///
/// Priority:
/// 1. Authorization: Bearer {token} header
/// 2. ?token={token} query parameter
fn extract_token_from_request(req: &Request<Body>) -> Option<String> {
    if let Some(auth_header) = req.headers().get(AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.trim().to_string());
            }
        }
    }

    if let Some(query) = req.uri().query() {
        for part in query.split('&') {
            if let Some(token) = part.strip_prefix("token=") {
                if let Ok(decoded) = urlencoding::decode(token) {
                    return Some(decoded.into_owned());
                }
                return Some(token.to_string());
            }
        }
    }

    None
}

/// Authentication context injected into request extensions after successful token validation.
#[derive(Clone, Debug)]
pub struct AuthContext {
    /// Unique identifier for the token (for audit logging)
    pub token_id: String,
    /// The user the token belongs to
    pub actor: Actor,
}

/// Middleware that requires a valid API token.
///
/// Resolves the token to an [`Actor`] and injects [`AuthContext`] into the
/// request extensions. Returns 401 when the token is missing, malformed,
/// unknown or revoked.
///
/// ```rust,ignore
/// let app = Router::new()
///     .route("/api/request", post(create_request))
///     .layer(middleware::from_fn_with_state(state.clone(), require_token));
/// ```
pub async fn require_token(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, Error> {
    let token = extract_token_from_request(&req).ok_or(Error::Unauthenticated)?;

    let identity = state.auth.validate(&token).await.map_err(|e| {
        debug!(error = %e, "Token rejected");
        e
    })?;

    // Update last_used_at without blocking the request
    let auth = state.auth.clone();
    let token_id = identity.token_id.clone();
    tokio::spawn(async move {
        if let Err(e) = auth.touch(&token_id).await {
            warn!(token_id = %token_id, error = %e, "Failed to record token use");
        }
    });

    req.extensions_mut().insert(AuthContext {
        token_id: identity.token_id,
        actor: identity.actor,
    });

    Ok(next.run(req).await)
}

/// Middleware that requires the authenticated user to be an admin.
///
/// Must be layered inside `require_token`.
pub async fn require_admin(req: Request<Body>, next: Next) -> Result<Response, Error> {
    let auth = req
        .extensions()
        .get::<AuthContext>()
        .ok_or(Error::Unauthenticated)?;

    if !auth.actor.is_admin() {
        warn!(user_id = %auth.actor.user_id, "Access denied: user is not an admin");
        return Err(Error::Forbidden);
    }

    debug!(user_id = %auth.actor.user_id, "Admin access granted");

    Ok(next.run(req).await)
}

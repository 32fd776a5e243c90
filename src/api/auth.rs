//! Authentication Routes
//!
//! Routes:
//! - POST /auth/register - Create an account and receive an API token (public)

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::db::User;
use crate::models::UserRole;
use crate::services::Registration;
use super::JsonBody;
use crate::{AppState, Result};

/// Build auth routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/register", post(register))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterBody {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub phone_number: Option<String>,
    pub role: String,
    #[serde(default)]
    pub technological_stack: Vec<String>,
    /// Required when registering an admin.
    pub bootstrap_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user: User,
    /// Plaintext API token. Only returned once.
    pub token: String,
}

/// Register a user.
///
/// POST /auth/register
async fn register(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<RegisterBody>,
) -> Result<(StatusCode, Json<RegisterResponse>)> {
    let role: UserRole = body.role.parse()?;

    let (user, token) = state
        .auth
        .register(
            Registration {
                name: body.name,
                email: body.email,
                phone_number: body.phone_number,
                role,
                technological_stack: body.technological_stack,
            },
            body.bootstrap_token.as_deref(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(RegisterResponse { user, token })))
}

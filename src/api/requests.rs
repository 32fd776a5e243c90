//! Join Request Routes
//!
//! Routes:
//! - POST /request - Open a join request to a project owner
//! - GET /request/me - Incoming and outgoing requests for the caller
//! - GET /request/project/:project_id - All requests for a project
//! - PUT /request/:request_id/status - Accept, reject or cancel a request

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::Deserialize;

use crate::db::{JoinRequest, RequestView};
use crate::middleware::AuthContext;
use crate::models::{RequestStatus, RequestType};
use crate::services::{NewRequest, UserRequests};
use super::JsonBody;
use crate::{AppState, Result};

/// Build request routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_request))
        .route("/me", get(list_my_requests))
        .route("/project/:project_id", get(list_project_requests))
        .route("/:request_id/status", put(update_request_status))
}

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequestBody {
    pub receiver_id: String,
    pub project_id: String,
    #[serde(rename = "type")]
    pub request_type: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusBody {
    pub status: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// Open a join request.
///
/// POST /request
async fn create_request(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    JsonBody(body): JsonBody<CreateRequestBody>,
) -> Result<(StatusCode, Json<JoinRequest>)> {
    let request_type: RequestType = body.request_type.parse()?;

    let request = state
        .requests
        .create(
            &auth.actor,
            NewRequest {
                receiver_id: body.receiver_id,
                project_id: body.project_id,
                request_type,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(request)))
}

/// List the caller's incoming and outgoing requests.
///
/// GET /request/me
async fn list_my_requests(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<UserRequests>> {
    let requests = state.requests.list_for_user(&auth.actor.user_id).await?;
    Ok(Json(requests))
}

/// List every request for a project.
///
/// GET /request/project/:project_id
async fn list_project_requests(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> Result<Json<Vec<RequestView>>> {
    let requests = state.requests.list_for_project(&project_id).await?;
    Ok(Json(requests))
}

/// Resolve a pending request.
///
/// PUT /request/:request_id/status
async fn update_request_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(request_id): Path<String>,
    JsonBody(body): JsonBody<UpdateStatusBody>,
) -> Result<Json<JoinRequest>> {
    let target = RequestStatus::parse_target(&body.status)?;

    let request = state
        .requests
        .transition(&auth.actor, &request_id, target)
        .await?;

    Ok(Json(request))
}

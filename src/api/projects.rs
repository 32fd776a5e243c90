//! Project Routes
//!
//! Routes:
//! - POST /project - Create a project owned by the caller
//! - GET /project - List projects
//! - GET /project/search?q= - Search projects
//! - GET /project/:id - Project with owner and members resolved
//! - PUT /project/:id/status - Change project status (owner or admin)

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Extension, Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::db::{Project, ProjectDetail};
use crate::middleware::AuthContext;
use crate::models::ProjectStatus;
use crate::services::NewProject;
use super::JsonBody;
use crate::{AppState, Result};

/// Build project routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_projects).post(create_project))
        .route("/search", get(search_projects))
        .route("/:id", get(get_project))
        .route("/:id/status", put(update_project_status))
}

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectBody {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub team_members: Vec<String>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Default)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusBody {
    pub status: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// Create a project.
///
/// POST /project
async fn create_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    JsonBody(body): JsonBody<CreateProjectBody>,
) -> Result<(StatusCode, Json<Project>)> {
    let project = state
        .projects
        .create(
            &auth.actor,
            NewProject {
                name: body.name,
                description: body.description,
                technologies: body.technologies,
                team_members: body.team_members,
                end_date: body.end_date,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(project)))
}

async fn list_projects(State(state): State<AppState>) -> Result<Json<Vec<Project>>> {
    Ok(Json(state.projects.list().await?))
}

/// GET /project/search?q=
async fn search_projects(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Project>>> {
    Ok(Json(state.projects.search(&query.q).await?))
}

async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProjectDetail>> {
    Ok(Json(state.projects.get(&id).await?))
}

/// Change a project's status.
///
/// PUT /project/:id/status
async fn update_project_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<UpdateStatusBody>,
) -> Result<Json<Project>> {
    let status: ProjectStatus = body.status.parse()?;
    let project = state.projects.update_status(&auth.actor, &id, status).await?;
    Ok(Json(project))
}

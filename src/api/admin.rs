//! Admin Routes
//!
//! Dashboard aggregates and request housekeeping. Every route requires an
//! admin token.
//!
//! Routes:
//! - GET /admin/total-projects
//! - GET /admin/total-students
//! - GET /admin/total-mentors
//! - GET /admin/recent-project
//! - GET /admin/top-students
//! - GET /admin/projects-by-tech
//! - GET /admin/projects-by-status
//! - GET /admin/database-growth
//! - POST /admin/delete-old-requests

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::db::{self, DatabaseGrowth, Project, StatusCount, TechnologyCount, TopStudent};
use crate::models::{RequestStatus, UserRole};
use super::JsonBody;
use crate::{AppState, Error, Result};

const TOP_STUDENTS_LIMIT: i64 = 5;
const TOP_TECHNOLOGIES_LIMIT: i64 = 10;

/// Build admin routes. Callers layer `require_admin` on top.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/total-projects", get(total_projects))
        .route("/total-students", get(total_students))
        .route("/total-mentors", get(total_mentors))
        .route("/recent-project", get(recent_project))
        .route("/top-students", get(top_students))
        .route("/projects-by-tech", get(projects_by_tech))
        .route("/projects-by-status", get(projects_by_status))
        .route("/database-growth", get(database_growth))
        .route("/delete-old-requests", post(delete_old_requests))
}

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalProjects {
    pub total_projects: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalStudents {
    pub total_students: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalMentors {
    pub total_mentors: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentProject {
    pub recent_project: Option<Project>,
}

#[derive(Debug, Serialize)]
pub struct TopStudents {
    pub students: Vec<TopStudent>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectsByTech {
    pub projects_by_tech: Vec<TechnologyCount>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectsByStatus {
    pub projects_by_status: Vec<StatusCount>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOldRequestsBody {
    #[serde(default)]
    pub status: Vec<String>,
    pub older_than_date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeleteOldRequestsResponse {
    pub deleted: u64,
}

// ============================================================================
// Handlers
// ============================================================================

async fn total_projects(State(state): State<AppState>) -> Result<Json<TotalProjects>> {
    Ok(Json(TotalProjects {
        total_projects: db::count_projects(&state.db).await?,
    }))
}

async fn total_students(State(state): State<AppState>) -> Result<Json<TotalStudents>> {
    Ok(Json(TotalStudents {
        total_students: db::count_users_by_role(&state.db, UserRole::Student).await?,
    }))
}

async fn total_mentors(State(state): State<AppState>) -> Result<Json<TotalMentors>> {
    Ok(Json(TotalMentors {
        total_mentors: db::count_users_by_role(&state.db, UserRole::Mentor).await?,
    }))
}

async fn recent_project(State(state): State<AppState>) -> Result<Json<RecentProject>> {
    Ok(Json(RecentProject {
        recent_project: db::most_recent_project(&state.db).await?,
    }))
}

async fn top_students(State(state): State<AppState>) -> Result<Json<TopStudents>> {
    Ok(Json(TopStudents {
        students: db::top_students(&state.db, TOP_STUDENTS_LIMIT).await?,
    }))
}

async fn projects_by_tech(State(state): State<AppState>) -> Result<Json<ProjectsByTech>> {
    Ok(Json(ProjectsByTech {
        projects_by_tech: db::projects_by_technology(&state.db, TOP_TECHNOLOGIES_LIMIT).await?,
    }))
}

async fn projects_by_status(State(state): State<AppState>) -> Result<Json<ProjectsByStatus>> {
    Ok(Json(ProjectsByStatus {
        projects_by_status: db::projects_by_status(&state.db).await?,
    }))
}

async fn database_growth(State(state): State<AppState>) -> Result<Json<DatabaseGrowth>> {
    Ok(Json(db::database_growth(&state.db).await?))
}

/// Delete requests in the given statuses created before a date.
///
/// POST /admin/delete-old-requests
async fn delete_old_requests(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<DeleteOldRequestsBody>,
) -> Result<Json<DeleteOldRequestsResponse>> {
    let older_than = body
        .older_than_date
        .as_deref()
        .ok_or_else(|| Error::InvalidInput("status and olderThanDate are required".into()))
        .and_then(parse_cutoff)?;

    if body.status.is_empty() {
        return Err(Error::InvalidInput("status and olderThanDate are required".into()));
    }

    let statuses = body
        .status
        .iter()
        .map(|s| s.parse::<RequestStatus>())
        .collect::<Result<Vec<_>>>()?;

    let deleted = state.requests.purge_old(&statuses, older_than).await?;

    Ok(Json(DeleteOldRequestsResponse { deleted }))
}

/// Accept either a full RFC3339 timestamp or a bare `YYYY-MM-DD` date
/// (midnight UTC).
fn parse_cutoff(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
        .ok_or_else(|| Error::InvalidInput(format!("Invalid olderThanDate '{}'", raw)))
}

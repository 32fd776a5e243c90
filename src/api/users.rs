//! User Routes
//!
//! Routes:
//! - GET /user/profile - Caller's profile
//! - PUT /user/profile - Update caller's profile
//! - GET /user/students - List students
//! - POST /user/students/search - Students sharing any of the given skills
//! - GET /user/mentors - List mentors
//! - POST /user/mentors/search - Mentors sharing any of the given skills

use axum::{
    extract::State,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;

use crate::db::{self, UpdateUser, User};
use crate::middleware::AuthContext;
use crate::models::{normalize_technologies, UserRole};
use super::JsonBody;
use crate::{AppState, Result};

/// Build user routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile).put(update_profile))
        .route("/students", get(list_students))
        .route("/students/search", post(search_students))
        .route("/mentors", get(list_mentors))
        .route("/mentors/search", post(search_mentors))
}

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileBody {
    pub name: Option<String>,
    pub phone_number: Option<String>,
    pub technological_stack: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StackSearchBody {
    #[serde(default)]
    pub tech_stack: Vec<String>,
}

// ============================================================================
// Handlers
// ============================================================================

async fn get_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<User>> {
    let user = db::get_user(&state.db, &auth.actor.user_id).await?;
    Ok(Json(user))
}

/// Update the caller's profile. Absent fields are left unchanged.
async fn update_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    JsonBody(body): JsonBody<UpdateProfileBody>,
) -> Result<Json<User>> {
    let user = db::update_user(
        &state.db,
        &auth.actor.user_id,
        UpdateUser {
            name: body.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
            phone_number: body.phone_number,
            technological_stack: body
                .technological_stack
                .map(|stack| normalize_technologies(&stack)),
        },
    )
    .await?;

    Ok(Json(user))
}

async fn list_students(State(state): State<AppState>) -> Result<Json<Vec<User>>> {
    Ok(Json(db::list_users_by_role(&state.db, UserRole::Student).await?))
}

async fn list_mentors(State(state): State<AppState>) -> Result<Json<Vec<User>>> {
    Ok(Json(db::list_users_by_role(&state.db, UserRole::Mentor).await?))
}

/// An empty stack returns every student.
async fn search_students(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<StackSearchBody>,
) -> Result<Json<Vec<User>>> {
    let stack = normalize_technologies(&body.tech_stack);
    let users = if stack.is_empty() {
        db::list_users_by_role(&state.db, UserRole::Student).await?
    } else {
        db::search_users_by_stack(&state.db, UserRole::Student, &stack).await?
    };
    Ok(Json(users))
}

async fn search_mentors(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<StackSearchBody>,
) -> Result<Json<Vec<User>>> {
    let stack = normalize_technologies(&body.tech_stack);
    let users = db::search_users_by_stack(&state.db, UserRole::Mentor, &stack).await?;
    Ok(Json(users))
}

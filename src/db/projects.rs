//! Project database queries.
//!
//! The Project Store. Membership lives in `project_members`, keyed on
//! (project, user, role), so inserting a member has set-add semantics at
//! the storage layer.

use crate::models::{MemberRole, ProjectStatus};
use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{FromRow, SqliteExecutor};

use super::{DbPool, UserSummary};

// ============================================================================
// Types
// ============================================================================

/// Project record from the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: String,
    pub owner_id: String,
    pub technologies: Json<Vec<String>>,
    pub status: ProjectStatus,
    pub end_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner_id == user_id
    }
}

/// Input for creating a new project.
#[derive(Debug, Clone)]
pub struct CreateProject {
    pub id: String,
    pub name: String,
    pub description: String,
    pub owner_id: String,
    pub technologies: Vec<String>,
    pub team_members: Vec<String>,
    pub end_date: Option<NaiveDate>,
}

/// A project with owner, team members and mentors resolved for display.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: Project,
    pub owner: Option<UserSummary>,
    pub team_members: Vec<UserSummary>,
    pub mentors: Vec<UserSummary>,
}

// ============================================================================
// Queries
// ============================================================================

/// Create a new project together with its initial team members.
pub async fn create_project(pool: &DbPool, input: CreateProject) -> Result<Project> {
    let now = Utc::now();
    let mut tx = pool.begin().await?;

    let project = sqlx::query_as::<_, Project>(
        r#"
        INSERT INTO projects (id, name, description, owner_id, technologies, status, end_date, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(&input.id)
    .bind(&input.name)
    .bind(&input.description)
    .bind(&input.owner_id)
    .bind(Json(&input.technologies))
    .bind(ProjectStatus::default())
    .bind(input.end_date)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    for member in &input.team_members {
        add_project_member(&mut *tx, &project.id, member, MemberRole::Teammate).await?;
    }

    tx.commit().await?;

    Ok(project)
}

/// Get a project by ID.
pub async fn get_project(pool: &DbPool, id: &str) -> Result<Project> {
    find_project(pool, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Project not found: {}", id)))
}

/// Get a project by ID, returning `None` when absent.
pub async fn find_project<'e, E>(executor: E, id: &str) -> Result<Option<Project>>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = ?")
        .bind(id)
        .fetch_optional(executor)
        .await
        .map_err(Error::Database)
}

/// Check whether a project exists.
pub async fn project_exists(pool: &DbPool, id: &str) -> Result<bool> {
    let exists: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM projects WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(exists.is_some())
}

/// List all projects, newest first.
pub async fn list_projects(pool: &DbPool) -> Result<Vec<Project>> {
    sqlx::query_as::<_, Project>("SELECT * FROM projects ORDER BY created_at DESC")
        .fetch_all(pool)
        .await
        .map_err(Error::Database)
}

/// Search projects by name, description or technology.
///
/// Name matches rank ahead of description/technology matches.
pub async fn search_projects(pool: &DbPool, query: &str) -> Result<Vec<Project>> {
    let pattern = format!("%{}%", query);
    sqlx::query_as::<_, Project>(
        r#"
        SELECT * FROM projects
        WHERE name LIKE ?1
           OR description LIKE ?1
           OR EXISTS (
                SELECT 1 FROM json_each(projects.technologies) AS tech
                WHERE tech.value LIKE ?1
           )
        ORDER BY CASE WHEN name LIKE ?1 THEN 0 ELSE 1 END, created_at DESC
        "#,
    )
    .bind(&pattern)
    .fetch_all(pool)
    .await
    .map_err(Error::Database)
}

/// Update a project's lifecycle status.
pub async fn update_project_status(
    pool: &DbPool,
    id: &str,
    status: ProjectStatus,
) -> Result<Project> {
    sqlx::query_as::<_, Project>(
        "UPDATE projects SET status = ?, updated_at = ? WHERE id = ? RETURNING *",
    )
    .bind(status)
    .bind(Utc::now())
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| Error::NotFound(format!("Project not found: {}", id)))
}

/// Load a project with owner and membership resolved.
pub async fn get_project_detail(pool: &DbPool, id: &str) -> Result<ProjectDetail> {
    let project = get_project(pool, id).await?;

    let owner = sqlx::query_as::<_, UserSummary>("SELECT id, name, email FROM users WHERE id = ?")
        .bind(&project.owner_id)
        .fetch_optional(pool)
        .await?;
    let team_members = list_project_members(pool, id, MemberRole::Teammate).await?;
    let mentors = list_project_members(pool, id, MemberRole::Mentor).await?;

    Ok(ProjectDetail {
        project,
        owner,
        team_members,
        mentors,
    })
}

// ============================================================================
// Project Members
// ============================================================================

/// Add a user to a project's membership list.
///
/// Returns `true` when a row was inserted and `false` when the user already
/// held that role.
pub async fn add_project_member<'e, E>(
    executor: E,
    project_id: &str,
    user_id: &str,
    role: MemberRole,
) -> Result<bool>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        INSERT INTO project_members (project_id, user_id, role, added_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT (project_id, user_id, role) DO NOTHING
        "#,
    )
    .bind(project_id)
    .bind(user_id)
    .bind(role)
    .bind(Utc::now())
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Check whether a user holds a membership role on a project.
pub async fn is_project_member<'e, E>(
    executor: E,
    project_id: &str,
    user_id: &str,
    role: MemberRole,
) -> Result<bool>
where
    E: SqliteExecutor<'e>,
{
    let row: Option<(i64,)> = sqlx::query_as(
        "SELECT 1 FROM project_members WHERE project_id = ? AND user_id = ? AND role = ?",
    )
    .bind(project_id)
    .bind(user_id)
    .bind(role)
    .fetch_optional(executor)
    .await?;

    Ok(row.is_some())
}

/// List the users holding a membership role, in the order they joined.
pub async fn list_project_members(
    pool: &DbPool,
    project_id: &str,
    role: MemberRole,
) -> Result<Vec<UserSummary>> {
    sqlx::query_as::<_, UserSummary>(
        r#"
        SELECT u.id, u.name, u.email
        FROM project_members pm
        INNER JOIN users u ON pm.user_id = u.id
        WHERE pm.project_id = ? AND pm.role = ?
        ORDER BY pm.added_at ASC, u.id ASC
        "#,
    )
    .bind(project_id)
    .bind(role)
    .fetch_all(pool)
    .await
    .map_err(Error::Database)
}

/// Count how many times a user appears in a membership list.
pub async fn count_member_rows(
    pool: &DbPool,
    project_id: &str,
    user_id: &str,
    role: MemberRole,
) -> Result<i64> {
    let (count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM project_members WHERE project_id = ? AND user_id = ? AND role = ?",
    )
    .bind(project_id)
    .bind(user_id)
    .bind(role)
    .fetch_one(pool)
    .await?;
    Ok(count)
}

//! Join request database queries.
//!
//! Pending uniqueness is enforced by `idx_requests_pending_unique`, and
//! status changes go through [`compare_and_set_status`] so two writers can
//! never both resolve the same request.

use crate::models::{RequestStatus, RequestType};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{FromRow, SqliteExecutor};

use super::{DbPool, UserSummary};

// ============================================================================
// Types
// ============================================================================

/// Join request record from the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    pub id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub project_id: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub request_type: RequestType,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

/// Input for recording a new pending request.
#[derive(Debug, Clone)]
pub struct CreateRequest {
    pub id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub project_id: String,
    pub request_type: RequestType,
    pub created_at: DateTime<Utc>,
}

/// Project fields shown alongside a request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub id: String,
    pub name: String,
}

/// A request with sender, receiver and project resolved for display.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestView {
    #[serde(flatten)]
    pub request: JoinRequest,
    pub sender: UserSummary,
    pub receiver: UserSummary,
    pub project: ProjectSummary,
}

#[derive(FromRow)]
struct RequestViewRow {
    #[sqlx(flatten)]
    request: JoinRequest,
    sender_name: String,
    sender_email: String,
    receiver_name: String,
    receiver_email: String,
    project_name: String,
}

impl From<RequestViewRow> for RequestView {
    fn from(row: RequestViewRow) -> Self {
        let sender = UserSummary {
            id: row.request.sender_id.clone(),
            name: row.sender_name,
            email: row.sender_email,
        };
        let receiver = UserSummary {
            id: row.request.receiver_id.clone(),
            name: row.receiver_name,
            email: row.receiver_email,
        };
        let project = ProjectSummary {
            id: row.request.project_id.clone(),
            name: row.project_name,
        };
        Self {
            request: row.request,
            sender,
            receiver,
            project,
        }
    }
}

const VIEW_SELECT: &str = r#"
    SELECT r.*,
           s.name AS sender_name, s.email AS sender_email,
           rc.name AS receiver_name, rc.email AS receiver_email,
           p.name AS project_name
    FROM requests r
    INNER JOIN users s ON r.sender_id = s.id
    INNER JOIN users rc ON r.receiver_id = rc.id
    INNER JOIN projects p ON r.project_id = p.id
"#;

// ============================================================================
// Queries
// ============================================================================

/// Record a new pending request.
///
/// A concurrent insert that loses the race on the pending-uniqueness index
/// surfaces as [`Error::DuplicatePending`].
pub async fn insert_request(pool: &DbPool, input: CreateRequest) -> Result<JoinRequest> {
    sqlx::query_as::<_, JoinRequest>(
        r#"
        INSERT INTO requests (id, sender_id, receiver_id, project_id, type, status, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(&input.id)
    .bind(&input.sender_id)
    .bind(&input.receiver_id)
    .bind(&input.project_id)
    .bind(input.request_type)
    .bind(RequestStatus::Pending)
    .bind(input.created_at)
    .bind(input.created_at)
    .fetch_one(pool)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            Error::DuplicatePending
        }
        _ => Error::Database(e),
    })
}

/// Get a request by ID.
pub async fn get_request(pool: &DbPool, id: &str) -> Result<JoinRequest> {
    sqlx::query_as::<_, JoinRequest>("SELECT * FROM requests WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Request not found: {}", id)))
}

/// Find the pending request for a (sender, receiver, project, type) tuple.
pub async fn find_pending_request(
    pool: &DbPool,
    sender_id: &str,
    receiver_id: &str,
    project_id: &str,
    request_type: RequestType,
) -> Result<Option<JoinRequest>> {
    sqlx::query_as::<_, JoinRequest>(
        r#"
        SELECT * FROM requests
        WHERE sender_id = ? AND receiver_id = ? AND project_id = ? AND type = ?
          AND status = 'pending'
        "#,
    )
    .bind(sender_id)
    .bind(receiver_id)
    .bind(project_id)
    .bind(request_type)
    .fetch_optional(pool)
    .await
    .map_err(Error::Database)
}

/// Move a pending request to `target`.
///
/// Returns `None` when the request is no longer pending, which means another
/// writer resolved it first.
pub async fn compare_and_set_status<'e, E>(
    executor: E,
    id: &str,
    target: RequestStatus,
    now: DateTime<Utc>,
) -> Result<Option<JoinRequest>>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, JoinRequest>(
        r#"
        UPDATE requests
        SET status = ?, updated_at = ?, resolved_at = ?
        WHERE id = ? AND status = 'pending'
        RETURNING *
        "#,
    )
    .bind(target)
    .bind(now)
    .bind(now)
    .bind(id)
    .fetch_optional(executor)
    .await
    .map_err(Error::Database)
}

/// Requests the user has sent, newest first.
pub async fn list_requests_by_sender(pool: &DbPool, user_id: &str) -> Result<Vec<RequestView>> {
    list_views(pool, "r.sender_id", user_id).await
}

/// Requests addressed to the user, newest first.
pub async fn list_requests_by_receiver(pool: &DbPool, user_id: &str) -> Result<Vec<RequestView>> {
    list_views(pool, "r.receiver_id", user_id).await
}

/// Every request for a project, newest first.
pub async fn list_requests_for_project(
    pool: &DbPool,
    project_id: &str,
) -> Result<Vec<RequestView>> {
    list_views(pool, "r.project_id", project_id).await
}

async fn list_views(pool: &DbPool, column: &'static str, value: &str) -> Result<Vec<RequestView>> {
    let sql = format!(
        "{} WHERE {} = ? ORDER BY r.created_at DESC, r.id DESC",
        VIEW_SELECT, column
    );
    let rows = sqlx::query_as::<_, RequestViewRow>(&sql)
        .bind(value)
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(RequestView::from).collect())
}

/// Delete requests in any of `statuses` created strictly before `older_than`.
///
/// Returns the number of rows removed.
pub async fn purge_requests(
    pool: &DbPool,
    statuses: &[RequestStatus],
    older_than: DateTime<Utc>,
) -> Result<u64> {
    if statuses.is_empty() {
        return Ok(0);
    }

    let result = sqlx::query(
        r#"
        DELETE FROM requests
        WHERE status IN (SELECT value FROM json_each(?))
          AND created_at < ?
        "#,
    )
    .bind(Json(statuses))
    .bind(older_than)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Count all stored requests.
pub async fn count_requests(pool: &DbPool) -> Result<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM requests")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

//! User and API token database queries.
//!
//! The Identity Store: user records with their role and skill tags, plus
//! the hashed bearer tokens that resolve to them.

use crate::models::UserRole;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

use super::DbPool;

// ============================================================================
// User Types
// ============================================================================

/// User record from the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub role: UserRole,
    pub technological_stack: Json<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Input for creating a new user.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub role: UserRole,
    pub technological_stack: Vec<String>,
}

/// Input for updating a user. Absent fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub phone_number: Option<String>,
    pub technological_stack: Option<Vec<String>>,
}

/// Name and email of a user, for embedding in other records.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub name: String,
    pub email: String,
}

// ============================================================================
// API Token Types
// ============================================================================

/// API token record.
#[derive(Debug, Clone, FromRow)]
pub struct ApiToken {
    pub id: String,
    pub user_id: String,
    pub token_prefix: String,
    pub token_hash: String,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub revoked_at: Option<DateTime<Utc>>,
}

/// Input for creating an API token.
#[derive(Debug, Clone)]
pub struct CreateApiToken {
    pub id: String,
    pub user_id: String,
    pub token_prefix: String,
    pub token_hash: String,
}

// ============================================================================
// User Queries
// ============================================================================

/// Create a new user.
pub async fn create_user(pool: &DbPool, input: CreateUser) -> Result<User> {
    let now = Utc::now();
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, name, email, phone_number, role, technological_stack, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(&input.id)
    .bind(&input.name)
    .bind(&input.email)
    .bind(&input.phone_number)
    .bind(input.role)
    .bind(Json(&input.technological_stack))
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            Error::AlreadyExists(format!("User with email '{}' already exists", input.email))
        }
        _ => Error::Database(e),
    })
}

/// Get a user by ID.
pub async fn get_user(pool: &DbPool, id: &str) -> Result<User> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("User not found: {}", id)))
}

/// Get a user by email.
pub async fn get_user_by_email(pool: &DbPool, email: &str) -> Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await
        .map_err(Error::Database)
}

/// Check that every id refers to an existing user.
pub async fn all_users_exist(pool: &DbPool, ids: &[String]) -> Result<bool> {
    if ids.is_empty() {
        return Ok(true);
    }

    let (found,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM users WHERE id IN (SELECT DISTINCT value FROM json_each(?))",
    )
    .bind(Json(ids))
    .fetch_one(pool)
    .await?;

    let mut distinct: Vec<&String> = ids.iter().collect();
    distinct.sort();
    distinct.dedup();

    Ok(found as usize == distinct.len())
}

/// Update a user.
pub async fn update_user(pool: &DbPool, id: &str, input: UpdateUser) -> Result<User> {
    sqlx::query_as::<_, User>(
        r#"
        UPDATE users SET
            name = COALESCE(?, name),
            phone_number = COALESCE(?, phone_number),
            technological_stack = COALESCE(?, technological_stack),
            updated_at = ?
        WHERE id = ?
        RETURNING *
        "#,
    )
    .bind(input.name)
    .bind(input.phone_number)
    .bind(input.technological_stack.map(Json))
    .bind(Utc::now())
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| Error::NotFound(format!("User not found: {}", id)))
}

/// List users holding a role.
pub async fn list_users_by_role(pool: &DbPool, role: UserRole) -> Result<Vec<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE role = ? ORDER BY name ASC")
        .bind(role)
        .fetch_all(pool)
        .await
        .map_err(Error::Database)
}

/// List users holding a role whose stack shares at least one tag with `stack`.
pub async fn search_users_by_stack(
    pool: &DbPool,
    role: UserRole,
    stack: &[String],
) -> Result<Vec<User>> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT * FROM users
        WHERE role = ?
          AND EXISTS (
            SELECT 1 FROM json_each(users.technological_stack) AS tag
            WHERE tag.value IN (SELECT value FROM json_each(?))
          )
        ORDER BY name ASC
        "#,
    )
    .bind(role)
    .bind(Json(stack))
    .fetch_all(pool)
    .await
    .map_err(Error::Database)
}

/// Count users holding a role.
pub async fn count_users_by_role(pool: &DbPool, role: UserRole) -> Result<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE role = ?")
        .bind(role)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

// ============================================================================
// API Token Queries
// ============================================================================

/// Store a new API token hash.
pub async fn create_api_token(pool: &DbPool, input: CreateApiToken) -> Result<ApiToken> {
    sqlx::query_as::<_, ApiToken>(
        r#"
        INSERT INTO api_tokens (id, user_id, token_prefix, token_hash, created_at)
        VALUES (?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(&input.id)
    .bind(&input.user_id)
    .bind(&input.token_prefix)
    .bind(&input.token_hash)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
    .map_err(Error::Database)
}

/// Look up a token by its public prefix.
pub async fn get_api_token_by_prefix(pool: &DbPool, prefix: &str) -> Result<Option<ApiToken>> {
    sqlx::query_as::<_, ApiToken>("SELECT * FROM api_tokens WHERE token_prefix = ?")
        .bind(prefix)
        .fetch_optional(pool)
        .await
        .map_err(Error::Database)
}

/// Record that a token was just used.
pub async fn touch_api_token(pool: &DbPool, id: &str) -> Result<()> {
    sqlx::query("UPDATE api_tokens SET last_used_at = ? WHERE id = ?")
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

//! Membership synchronizer.
//!
//! Turns an accepted request into a project membership. Insertion is a
//! storage-level set-add, so applying the same grant twice is harmless.

use sqlx::SqliteExecutor;
use tracing::debug;

use crate::db::{self, DbPool};
use crate::error::{Error, Result};
use crate::models::RequestType;

/// Service that owns membership writes for accepted requests.
#[derive(Clone)]
pub struct MembershipService {
    db: DbPool,
}

impl MembershipService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    /// Add `user_id` to the membership list matching `request_type`.
    ///
    /// Returns `true` if the membership changed.
    pub async fn apply(
        &self,
        project_id: &str,
        user_id: &str,
        request_type: RequestType,
    ) -> Result<bool> {
        if db::find_project(&self.db, project_id).await?.is_none() {
            return Err(Error::NotFound(format!("Project not found: {}", project_id)));
        }

        Self::apply_in(&self.db, project_id, user_id, request_type).await
    }

    /// Same as [`apply`](Self::apply), but runs on the caller's executor so it
    /// can join an open transaction.
    pub async fn apply_in<'e, E>(
        executor: E,
        project_id: &str,
        user_id: &str,
        request_type: RequestType,
    ) -> Result<bool>
    where
        E: SqliteExecutor<'e>,
    {
        let role = request_type.member_role();
        let changed = db::add_project_member(executor, project_id, user_id, role).await?;

        debug!(
            project_id = %project_id,
            user_id = %user_id,
            role = %role,
            changed,
            "Applied membership"
        );

        Ok(changed)
    }
}

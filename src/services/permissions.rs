//! Permission service for centralized access control.
//!
//! Decides who may open a join request, who may resolve one, and who may
//! manage a project:
//! - Create: anyone not already holding the requested membership role
//! - Accept/reject: the request's stored receiver
//! - Cancel: the request's sender
//! - Project status: the owner or a global admin

use tracing::{debug, warn};

use crate::db::{self, DbPool, JoinRequest, Project};
use crate::error::{Error, Result};
use crate::models::{Actor, Party, RequestStatus, RequestType};

/// Service for checking permissions.
#[derive(Clone)]
pub struct PermissionService {
    db: DbPool,
}

impl PermissionService {
    /// Create a new permission service.
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    /// Check that `actor` may ask to join `project` in the given role.
    ///
    /// Membership is read fresh from storage on every call.
    pub async fn check_can_request(
        &self,
        actor: &Actor,
        project: &Project,
        request_type: RequestType,
    ) -> Result<()> {
        let role = request_type.member_role();
        let already = db::is_project_member(&self.db, &project.id, &actor.user_id, role).await?;

        debug!(
            user_id = %actor.user_id,
            project_id = %project.id,
            role = %role,
            already_member = already,
            "Checked request eligibility"
        );

        if already {
            return Err(Error::AlreadyMember(format!(
                "user {} is already a {} on project {}",
                actor.user_id, role, project.id
            )));
        }

        Ok(())
    }

    /// Check that `actor` may move `request` to `target`.
    ///
    /// Only the roles stored on the request are consulted, never the
    /// project's current owner.
    pub fn authorize_transition(
        actor: &Actor,
        request: &JoinRequest,
        target: RequestStatus,
    ) -> Result<()> {
        let party = if actor.user_id == request.receiver_id {
            Some(Party::Receiver)
        } else if actor.user_id == request.sender_id {
            Some(Party::Sender)
        } else {
            None
        };

        let Some(party) = party else {
            warn!(
                user_id = %actor.user_id,
                request_id = %request.id,
                "Transition attempted by a third party"
            );
            return Err(Error::Forbidden);
        };

        let required = target.resolving_party().ok_or_else(|| {
            Error::InvalidTargetStatus(format!(
                "'{}'. Only accepted, rejected or canceled are allowed",
                target
            ))
        })?;

        // Self-addressed requests make the actor both parties.
        let allowed = required == party
            || (request.sender_id == request.receiver_id && actor.user_id == request.sender_id);

        if !allowed {
            warn!(
                user_id = %actor.user_id,
                request_id = %request.id,
                target = %target,
                "Transition attempted by the wrong party"
            );
            return Err(Error::Forbidden);
        }

        Ok(())
    }

    /// Check that `actor` may change a project's status.
    pub fn check_can_manage_project(actor: &Actor, project: &Project) -> Result<()> {
        if actor.is_admin() {
            debug!(user_id = %actor.user_id, project_id = %project.id, "Admin bypass: manage project");
            return Ok(());
        }

        if project.is_owned_by(&actor.user_id) {
            return Ok(());
        }

        Err(Error::Forbidden)
    }
}

//! Request ledger.
//!
//! Owns the lifecycle of join requests. Creation validates the project,
//! receiver and sender eligibility before inserting; transitions run as a
//! compare-and-set inside a transaction that also applies the membership
//! grant on acceptance, so an accepted request and its membership row commit
//! together or not at all.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::db::{self, CreateRequest, DbPool, JoinRequest, RequestView};
use crate::error::{Error, Result};
use crate::models::{Actor, RequestStatus, RequestType};

use super::{MembershipService, PermissionService};

/// Input for opening a join request.
#[derive(Debug, Clone)]
pub struct NewRequest {
    pub receiver_id: String,
    pub project_id: String,
    pub request_type: RequestType,
}

/// Requests a user is party to, split by direction.
#[derive(Debug, Clone, Serialize)]
pub struct UserRequests {
    pub incoming: Vec<RequestView>,
    pub outgoing: Vec<RequestView>,
}

/// Service for managing join requests.
#[derive(Clone)]
pub struct RequestService {
    db: DbPool,
    permissions: PermissionService,
}

impl RequestService {
    pub fn new(db: DbPool, permissions: PermissionService) -> Self {
        Self { db, permissions }
    }

    /// Open a pending request from `actor` to the project's owner.
    pub async fn create(&self, actor: &Actor, input: NewRequest) -> Result<JoinRequest> {
        let project = db::find_project(&self.db, &input.project_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Project not found: {}", input.project_id)))?;

        let receiver = db::get_user(&self.db, &input.receiver_id).await?;
        if !project.is_owned_by(&receiver.id) {
            return Err(Error::InvalidInput(format!(
                "Receiver {} is not the owner of project {}",
                receiver.id, project.id
            )));
        }

        self.permissions
            .check_can_request(actor, &project, input.request_type)
            .await?;

        if db::find_pending_request(
            &self.db,
            &actor.user_id,
            &receiver.id,
            &project.id,
            input.request_type,
        )
        .await?
        .is_some()
        {
            return Err(Error::DuplicatePending);
        }

        // The unique index still decides if another insert slipped in since
        // the check above.
        let request = db::insert_request(
            &self.db,
            CreateRequest {
                id: Uuid::new_v4().to_string(),
                sender_id: actor.user_id.clone(),
                receiver_id: receiver.id,
                project_id: project.id,
                request_type: input.request_type,
                created_at: Utc::now(),
            },
        )
        .await?;

        info!(
            request_id = %request.id,
            sender_id = %request.sender_id,
            project_id = %request.project_id,
            request_type = %request.request_type,
            "Created join request"
        );

        Ok(request)
    }

    /// Move a pending request to a terminal status.
    ///
    /// Accepting also grants the sender the matching membership in the same
    /// transaction.
    pub async fn transition(
        &self,
        actor: &Actor,
        request_id: &str,
        target: RequestStatus,
    ) -> Result<JoinRequest> {
        let request = db::get_request(&self.db, request_id).await?;

        PermissionService::authorize_transition(actor, &request, target)?;

        if !request.status.can_transition_to(target) {
            return Err(Error::InvalidTransition(request.status.to_string()));
        }

        let mut tx = self.db.begin().await?;

        let Some(updated) =
            db::compare_and_set_status(&mut *tx, request_id, target, Utc::now()).await?
        else {
            tx.rollback().await?;
            let current = db::get_request(&self.db, request_id).await?;
            warn!(
                request_id = %request_id,
                status = %current.status,
                "Lost transition race"
            );
            return Err(Error::InvalidTransition(current.status.to_string()));
        };

        if updated.status == RequestStatus::Accepted {
            MembershipService::apply_in(
                &mut *tx,
                &updated.project_id,
                &updated.sender_id,
                updated.request_type,
            )
            .await?;
        }

        tx.commit().await?;

        info!(
            request_id = %updated.id,
            user_id = %actor.user_id,
            status = %updated.status,
            "Resolved join request"
        );

        Ok(updated)
    }

    /// Incoming and outgoing requests for a user, newest first.
    pub async fn list_for_user(&self, user_id: &str) -> Result<UserRequests> {
        let (incoming, outgoing) = futures::try_join!(
            db::list_requests_by_receiver(&self.db, user_id),
            db::list_requests_by_sender(&self.db, user_id),
        )?;

        debug!(
            user_id = %user_id,
            incoming = incoming.len(),
            outgoing = outgoing.len(),
            "Listed requests"
        );

        Ok(UserRequests { incoming, outgoing })
    }

    /// Every request for a project, newest first.
    pub async fn list_for_project(&self, project_id: &str) -> Result<Vec<RequestView>> {
        if !db::project_exists(&self.db, project_id).await? {
            return Err(Error::NotFound(format!("Project not found: {}", project_id)));
        }
        db::list_requests_for_project(&self.db, project_id).await
    }

    /// Delete requests in `statuses` created before `older_than`.
    pub async fn purge_old(
        &self,
        statuses: &[RequestStatus],
        older_than: DateTime<Utc>,
    ) -> Result<u64> {
        let deleted = db::purge_requests(&self.db, statuses, older_than).await?;

        info!(
            deleted,
            older_than = %older_than,
            statuses = ?statuses,
            "Purged old requests"
        );

        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{connect, count_member_rows, create_project, create_user, CreateProject, CreateUser};
    use crate::models::{MemberRole, UserRole};

    struct Fixture {
        pool: DbPool,
        service: RequestService,
        owner: Actor,
        alice: Actor,
        stranger: Actor,
    }

    async fn setup() -> Fixture {
        let pool = connect(":memory:").await.unwrap();
        for id in ["owner", "alice", "stranger"] {
            create_user(
                &pool,
                CreateUser {
                    id: id.to_string(),
                    name: id.to_string(),
                    email: format!("{}@example.com", id),
                    phone_number: None,
                    role: UserRole::Student,
                    technological_stack: vec![],
                },
            )
            .await
            .unwrap();
        }
        create_project(
            &pool,
            CreateProject {
                id: "p1".to_string(),
                name: "Compiler".to_string(),
                description: "d".to_string(),
                owner_id: "owner".to_string(),
                technologies: vec![],
                team_members: vec![],
                end_date: None,
            },
        )
        .await
        .unwrap();

        let service = RequestService::new(pool.clone(), PermissionService::new(pool.clone()));
        Fixture {
            pool,
            service,
            owner: Actor::new("owner", UserRole::Student),
            alice: Actor::new("alice", UserRole::Student),
            stranger: Actor::new("stranger", UserRole::Student),
        }
    }

    fn teammate_request() -> NewRequest {
        NewRequest {
            receiver_id: "owner".to_string(),
            project_id: "p1".to_string(),
            request_type: RequestType::TeammateRequest,
        }
    }

    #[tokio::test]
    async fn test_accept_grants_membership() {
        let f = setup().await;
        let request = f.service.create(&f.alice, teammate_request()).await.unwrap();
        assert_eq!(request.status, RequestStatus::Pending);
        assert_eq!(
            count_member_rows(&f.pool, "p1", "alice", MemberRole::Teammate).await.unwrap(),
            0
        );

        let accepted = f
            .service
            .transition(&f.owner, &request.id, RequestStatus::Accepted)
            .await
            .unwrap();
        assert_eq!(accepted.status, RequestStatus::Accepted);
        assert!(accepted.resolved_at.is_some());
        assert_eq!(
            count_member_rows(&f.pool, "p1", "alice", MemberRole::Teammate).await.unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_failed_membership_write_rolls_back_accept() {
        let f = setup().await;
        let request = f.service.create(&f.alice, teammate_request()).await.unwrap();

        sqlx::query("DROP TABLE project_members")
            .execute(&f.pool)
            .await
            .unwrap();

        let result = f
            .service
            .transition(&f.owner, &request.id, RequestStatus::Accepted)
            .await;
        assert!(matches!(result, Err(Error::Database(_))));

        let stored = db::get_request(&f.pool, &request.id).await.unwrap();
        assert_eq!(stored.status, RequestStatus::Pending);
        assert!(stored.resolved_at.is_none());
    }

    #[tokio::test]
    async fn test_terminal_request_rejects_further_transitions() {
        let f = setup().await;
        let request = f.service.create(&f.alice, teammate_request()).await.unwrap();
        f.service
            .transition(&f.owner, &request.id, RequestStatus::Rejected)
            .await
            .unwrap();

        let again = f
            .service
            .transition(&f.owner, &request.id, RequestStatus::Accepted)
            .await;
        assert!(matches!(again, Err(Error::InvalidTransition(ref s)) if s == "rejected"));
    }

    #[tokio::test]
    async fn test_create_errors() {
        let f = setup().await;

        let missing = f
            .service
            .create(
                &f.alice,
                NewRequest {
                    project_id: "ghost".to_string(),
                    ..teammate_request()
                },
            )
            .await;
        assert!(matches!(missing, Err(Error::NotFound(_))));

        let not_owner = f
            .service
            .create(
                &f.alice,
                NewRequest {
                    receiver_id: "stranger".to_string(),
                    ..teammate_request()
                },
            )
            .await;
        assert!(matches!(not_owner, Err(Error::InvalidInput(_))));

        f.service.create(&f.alice, teammate_request()).await.unwrap();
        let duplicate = f.service.create(&f.alice, teammate_request()).await;
        assert!(matches!(duplicate, Err(Error::DuplicatePending)));
    }

    #[tokio::test]
    async fn test_existing_teammate_cannot_request_again() {
        let f = setup().await;
        let request = f.service.create(&f.alice, teammate_request()).await.unwrap();
        f.service
            .transition(&f.owner, &request.id, RequestStatus::Accepted)
            .await
            .unwrap();

        let result = f.service.create(&f.alice, teammate_request()).await;
        assert!(matches!(result, Err(Error::AlreadyMember(_))));

        // Mentor role is tracked separately.
        f.service
            .create(
                &f.alice,
                NewRequest {
                    request_type: RequestType::MentorRequest,
                    ..teammate_request()
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_third_party_cannot_accept() {
        let f = setup().await;
        let request = f.service.create(&f.alice, teammate_request()).await.unwrap();

        let result = f
            .service
            .transition(&f.stranger, &request.id, RequestStatus::Accepted)
            .await;
        assert!(matches!(result, Err(Error::Forbidden)));

        let sender_accept = f
            .service
            .transition(&f.alice, &request.id, RequestStatus::Accepted)
            .await;
        assert!(matches!(sender_accept, Err(Error::Forbidden)));

        let canceled = f
            .service
            .transition(&f.alice, &request.id, RequestStatus::Canceled)
            .await
            .unwrap();
        assert_eq!(canceled.status, RequestStatus::Canceled);
        assert_eq!(
            count_member_rows(&f.pool, "p1", "alice", MemberRole::Teammate).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_transition_missing_request() {
        let f = setup().await;
        let result = f
            .service
            .transition(&f.owner, "ghost", RequestStatus::Accepted)
            .await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_for_user_and_project() {
        let f = setup().await;
        f.service.create(&f.alice, teammate_request()).await.unwrap();

        let owner_view = f.service.list_for_user("owner").await.unwrap();
        assert_eq!(owner_view.incoming.len(), 1);
        assert!(owner_view.outgoing.is_empty());

        let alice_view = f.service.list_for_user("alice").await.unwrap();
        assert_eq!(alice_view.outgoing.len(), 1);

        assert_eq!(f.service.list_for_project("p1").await.unwrap().len(), 1);
        assert!(matches!(
            f.service.list_for_project("ghost").await,
            Err(Error::NotFound(_))
        ));
    }
}

//! Project service for project management.
//!
//! Validates project input and enforces owner/admin rights on status
//! changes. Membership after creation is only ever written by the
//! [`MembershipService`](super::MembershipService).

use chrono::NaiveDate;
use tracing::info;
use uuid::Uuid;

use crate::db::{self, CreateProject, DbPool, Project, ProjectDetail};
use crate::error::{Error, Result};
use crate::models::{normalize_technologies, Actor, ProjectStatus, MAX_TECHNOLOGIES};

use super::PermissionService;

/// Input for creating a project.
#[derive(Debug, Clone, Default)]
pub struct NewProject {
    pub name: String,
    pub description: String,
    pub technologies: Vec<String>,
    pub team_members: Vec<String>,
    pub end_date: Option<NaiveDate>,
}

/// Service for managing projects.
#[derive(Clone)]
pub struct ProjectService {
    db: DbPool,
}

impl ProjectService {
    /// Create a new project service.
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    /// Create a project owned by `actor`.
    pub async fn create(&self, actor: &Actor, input: NewProject) -> Result<Project> {
        let name = input.name.trim();
        let description = input.description.trim();
        if name.is_empty() || description.is_empty() {
            return Err(Error::Validation("Name and description are required".into()));
        }

        let technologies = normalize_technologies(&input.technologies);
        if technologies.len() > MAX_TECHNOLOGIES {
            return Err(Error::Validation(format!(
                "A project can list at most {} technologies",
                MAX_TECHNOLOGIES
            )));
        }

        let mut team_members = input.team_members;
        team_members.sort();
        team_members.dedup();
        if !db::all_users_exist(&self.db, &team_members).await? {
            return Err(Error::NotFound("One or more team members do not exist".into()));
        }

        let project = db::create_project(
            &self.db,
            CreateProject {
                id: Uuid::new_v4().to_string(),
                name: name.to_string(),
                description: description.to_string(),
                owner_id: actor.user_id.clone(),
                technologies,
                team_members,
                end_date: input.end_date,
            },
        )
        .await?;

        info!(project_id = %project.id, owner_id = %project.owner_id, "Created project");

        Ok(project)
    }

    pub async fn list(&self) -> Result<Vec<Project>> {
        db::list_projects(&self.db).await
    }

    /// Get a project with owner and members resolved.
    pub async fn get(&self, id: &str) -> Result<ProjectDetail> {
        db::get_project_detail(&self.db, id).await
    }

    /// Search projects by name, description or technology.
    pub async fn search(&self, query: &str) -> Result<Vec<Project>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::InvalidInput("Search query is required".into()));
        }
        db::search_projects(&self.db, query).await
    }

    /// Change a project's lifecycle status. Owner or admin only.
    pub async fn update_status(
        &self,
        actor: &Actor,
        id: &str,
        status: ProjectStatus,
    ) -> Result<Project> {
        let project = db::get_project(&self.db, id).await?;
        PermissionService::check_can_manage_project(actor, &project)?;

        let updated = db::update_project_status(&self.db, id, status).await?;

        info!(project_id = %id, status = %status, user_id = %actor.user_id, "Updated project status");

        Ok(updated)
    }
}

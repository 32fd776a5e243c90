//! Read-only aggregates for the admin dashboard.

use crate::models::{MemberRole, ProjectStatus, UserRole};
use crate::{Error, Result};
use serde::Serialize;
use sqlx::FromRow;

use super::{DbPool, Project};

/// A user ranked by how many projects they are a teammate on.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopStudent {
    pub id: String,
    pub name: String,
    pub email: String,
    pub project_count: i64,
}

/// Number of projects listing a technology.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnologyCount {
    pub technology: String,
    pub count: i64,
}

/// Number of projects in a lifecycle status.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCount {
    pub status: ProjectStatus,
    pub count: i64,
}

/// Records created in one calendar month (`YYYY-MM`).
#[derive(Debug, Clone, FromRow, Serialize, PartialEq, Eq)]
pub struct GrowthPoint {
    pub date: String,
    pub count: i64,
}

/// Monthly creation counts per entity.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseGrowth {
    pub students_growth: Vec<GrowthPoint>,
    pub mentors_growth: Vec<GrowthPoint>,
    pub projects_growth: Vec<GrowthPoint>,
}

pub async fn count_projects(pool: &DbPool) -> Result<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM projects")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// The most recently created project, if any.
pub async fn most_recent_project(pool: &DbPool) -> Result<Option<Project>> {
    sqlx::query_as::<_, Project>("SELECT * FROM projects ORDER BY created_at DESC, id DESC LIMIT 1")
        .fetch_optional(pool)
        .await
        .map_err(Error::Database)
}

/// Top users by teammate membership count.
pub async fn top_students(pool: &DbPool, limit: i64) -> Result<Vec<TopStudent>> {
    sqlx::query_as::<_, TopStudent>(
        r#"
        SELECT u.id, u.name, u.email, COUNT(*) AS project_count
        FROM project_members pm
        INNER JOIN users u ON pm.user_id = u.id
        WHERE pm.role = ?
        GROUP BY u.id, u.name, u.email
        ORDER BY project_count DESC, u.name ASC
        LIMIT ?
        "#,
    )
    .bind(MemberRole::Teammate)
    .bind(limit)
    .fetch_all(pool)
    .await
    .map_err(Error::Database)
}

/// Most used technologies across projects.
pub async fn projects_by_technology(pool: &DbPool, limit: i64) -> Result<Vec<TechnologyCount>> {
    sqlx::query_as::<_, TechnologyCount>(
        r#"
        SELECT tech.value AS technology, COUNT(*) AS count
        FROM projects, json_each(projects.technologies) AS tech
        GROUP BY tech.value
        ORDER BY count DESC, technology ASC
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await
    .map_err(Error::Database)
}

pub async fn projects_by_status(pool: &DbPool) -> Result<Vec<StatusCount>> {
    sqlx::query_as::<_, StatusCount>(
        "SELECT status, COUNT(*) AS count FROM projects GROUP BY status ORDER BY status",
    )
    .fetch_all(pool)
    .await
    .map_err(Error::Database)
}

/// Monthly creation counts for students, mentors and projects.
pub async fn database_growth(pool: &DbPool) -> Result<DatabaseGrowth> {
    Ok(DatabaseGrowth {
        students_growth: user_growth(pool, UserRole::Student).await?,
        mentors_growth: user_growth(pool, UserRole::Mentor).await?,
        projects_growth: project_growth(pool).await?,
    })
}

// created_at is RFC3339 text, so its first seven characters are YYYY-MM.
async fn user_growth(pool: &DbPool, role: UserRole) -> Result<Vec<GrowthPoint>> {
    sqlx::query_as::<_, GrowthPoint>(
        r#"
        SELECT substr(created_at, 1, 7) AS date, COUNT(*) AS count
        FROM users
        WHERE role = ?
        GROUP BY date
        ORDER BY date ASC
        "#,
    )
    .bind(role)
    .fetch_all(pool)
    .await
    .map_err(Error::Database)
}

async fn project_growth(pool: &DbPool) -> Result<Vec<GrowthPoint>> {
    sqlx::query_as::<_, GrowthPoint>(
        r#"
        SELECT substr(created_at, 1, 7) AS date, COUNT(*) AS count
        FROM projects
        GROUP BY date
        ORDER BY date ASC
        "#,
    )
    .fetch_all(pool)
    .await
    .map_err(Error::Database)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{add_project_member, connect, create_project, create_user, CreateProject, CreateUser};

    async fn setup_test_db() -> DbPool {
        let pool = connect(":memory:").await.unwrap();
        for (id, role) in [
            ("owner", UserRole::Student),
            ("alice", UserRole::Student),
            ("bob", UserRole::Student),
            ("mona", UserRole::Mentor),
        ] {
            create_user(
                &pool,
                CreateUser {
                    id: id.to_string(),
                    name: id.to_string(),
                    email: format!("{}@example.com", id),
                    phone_number: None,
                    role,
                    technological_stack: vec![],
                },
            )
            .await
            .unwrap();
        }
        for (id, techs) in [("p1", vec!["Rust", "SQL"]), ("p2", vec!["Rust"]), ("p3", vec![])] {
            create_project(
                &pool,
                CreateProject {
                    id: id.to_string(),
                    name: id.to_string(),
                    description: "d".to_string(),
                    owner_id: "owner".to_string(),
                    technologies: techs.into_iter().map(String::from).collect(),
                    team_members: vec![],
                    end_date: None,
                },
            )
            .await
            .unwrap();
        }
        pool
    }

    #[tokio::test]
    async fn test_counts() {
        let pool = setup_test_db().await;
        assert_eq!(count_projects(&pool).await.unwrap(), 3);
        assert_eq!(most_recent_project(&pool).await.unwrap().unwrap().id, "p3");
    }

    #[tokio::test]
    async fn test_top_students_ranks_by_team_count() {
        let pool = setup_test_db().await;
        add_project_member(&pool, "p1", "alice", MemberRole::Teammate).await.unwrap();
        add_project_member(&pool, "p2", "alice", MemberRole::Teammate).await.unwrap();
        add_project_member(&pool, "p1", "bob", MemberRole::Teammate).await.unwrap();
        add_project_member(&pool, "p1", "mona", MemberRole::Mentor).await.unwrap();

        let top = top_students(&pool, 5).await.unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].id, "alice");
        assert_eq!(top[0].project_count, 2);
        assert_eq!(top[1].id, "bob");
    }

    #[tokio::test]
    async fn test_projects_by_technology() {
        let pool = setup_test_db().await;
        let techs = projects_by_technology(&pool, 10).await.unwrap();
        assert_eq!(techs[0].technology, "Rust");
        assert_eq!(techs[0].count, 2);
        assert_eq!(techs[1].technology, "SQL");
    }

    #[tokio::test]
    async fn test_projects_by_status_and_growth() {
        let pool = setup_test_db().await;
        let statuses = projects_by_status(&pool).await.unwrap();
        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses[0].status, ProjectStatus::Pending);
        assert_eq!(statuses[0].count, 3);

        let growth = database_growth(&pool).await.unwrap();
        assert_eq!(growth.students_growth.len(), 1);
        assert_eq!(growth.students_growth[0].count, 3);
        assert_eq!(growth.students_growth[0].date.len(), 7);
        assert_eq!(growth.mentors_growth[0].count, 1);
        assert_eq!(growth.projects_growth[0].count, 3);
    }
}

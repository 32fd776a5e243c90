//! Database layer for Wired.
//!
//! Provides SQLite connection pooling and query modules
//! for all domain entities.

mod pool;
mod projects;
mod requests;
mod stats;
mod users;

pub use pool::PoolConfig;
pub use projects::*;
pub use requests::*;
pub use stats::*;
pub use users::*;

use crate::Result;
use std::path::Path;
use tracing::info;

/// Type alias for the SQLite connection pool.
pub type DbPool = sqlx::SqlitePool;

/// Initialize the database connection pool.
///
/// Creates parent directories if needed and configures SQLite with
/// settings suited to concurrent access.
pub async fn init_pool(path: &str) -> Result<DbPool> {
    init_pool_with_config(path, PoolConfig::for_path(path)).await
}

/// Initialize the database connection pool with explicit settings.
pub async fn init_pool_with_config(path: &str, config: PoolConfig) -> Result<DbPool> {
    if !path.contains(":memory:") {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
    }

    let options = config.build_connect_options(path)?;
    let pool = config.build_pool_options().connect_with(options).await?;

    info!(path, max_connections = config.max_connections, "Database pool initialized");

    Ok(pool)
}

/// Initialize the database schema.
///
/// Applies the complete schema from schema.sql. Uses IF NOT EXISTS
/// clauses so it's safe to run multiple times.
pub async fn initialize_schema(pool: &DbPool) -> Result<()> {
    let schema = include_str!("../../schema.sql");

    info!("Initializing database schema");

    // Split by semicolons and execute each statement
    for statement in schema.split(';') {
        // Strip comment lines, keeping only actual SQL
        let clean_stmt: String = statement
            .lines()
            .filter(|line| !line.trim().starts_with("--"))
            .collect::<Vec<_>>()
            .join("\n");
        let clean_stmt = clean_stmt.trim();
        if clean_stmt.is_empty() {
            continue;
        }
        sqlx::query(clean_stmt).execute(pool).await?;
    }

    info!("Database schema initialized successfully");

    Ok(())
}

/// Open a pool and apply the schema in one step.
pub async fn connect(path: &str) -> Result<DbPool> {
    let pool = init_pool(path).await?;
    initialize_schema(&pool).await?;
    Ok(pool)
}

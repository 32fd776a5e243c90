//! Service layer for Wired.
//!
//! Contains the business logic behind the HTTP handlers:
//! - Requests (join request ledger and state machine)
//! - Membership (applies accepted requests to project membership)
//! - Permissions (who may create, resolve and manage)
//! - Projects (project creation, search and status)
//! - Auth (registration and API tokens)
//! - Retention (background purge of resolved requests)

mod auth;
mod membership;
mod permissions;
mod projects;
mod requests;
mod retention;

pub use auth::{AuthService, Registration, TokenIdentity};
pub use membership::MembershipService;
pub use permissions::PermissionService;
pub use projects::{NewProject, ProjectService};
pub use requests::{NewRequest, RequestService, UserRequests};
pub use retention::{RetentionHandle, RetentionSweeper};

//! Middleware for Wired.
//!
//! - `token_auth` - API token validation and the admin gate

mod token_auth;

pub use token_auth::{require_admin, require_token, AuthContext};

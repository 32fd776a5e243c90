//! Domain models for Wired.
//!
//! Closed enums for every status and type field stored as text, plus the
//! `Actor` identity claim.

mod project;
mod request;
mod user;

pub use project::*;
pub use request::*;
pub use user::*;

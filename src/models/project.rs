//! Project status and membership roles.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Maximum number of technologies a project may list.
pub const MAX_TECHNOLOGIES: usize = 10;

/// Project lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum ProjectStatus {
    #[default]
    Pending,
    Active,
    Completed,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }
}

impl FromStr for ProjectStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            other => Err(Error::InvalidInput(format!(
                "Invalid status '{}'. Status must be one of pending, active, completed",
                other
            ))),
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which membership list a user sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum MemberRole {
    Teammate,
    Mentor,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Teammate => "teammate",
            Self::Mentor => "mentor",
        }
    }
}

impl fmt::Display for MemberRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalise a technology list: trim entries, drop blanks and repeats while
/// keeping first-seen order.
pub fn normalize_technologies(raw: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(raw.len());
    for tech in raw {
        let tech = tech.trim();
        if tech.is_empty() || out.iter().any(|t| t.eq_ignore_ascii_case(tech)) {
            continue;
        }
        out.push(tech.to_string());
    }
    out
}

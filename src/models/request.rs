//! Join request model and its status state machine.
//!
//! ```text
//! pending --accept(receiver)--> accepted
//! pending --reject(receiver)--> rejected
//! pending --cancel(sender)----> canceled
//! ```
//!
//! Terminal states have no outgoing transitions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::project::MemberRole;
use crate::Error;

/// What the sender is asking to become on the project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum RequestType {
    TeammateRequest,
    MentorRequest,
}

impl RequestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TeammateRequest => "teammate_request",
            Self::MentorRequest => "mentor_request",
        }
    }

    /// Membership list an accepted request of this type writes to.
    pub fn member_role(&self) -> MemberRole {
        match self {
            Self::TeammateRequest => MemberRole::Teammate,
            Self::MentorRequest => MemberRole::Mentor,
        }
    }
}

impl FromStr for RequestType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "teammate_request" => Ok(Self::TeammateRequest),
            "mentor_request" => Ok(Self::MentorRequest),
            other => Err(Error::InvalidInput(format!(
                "Unknown request type '{}'. Expected teammate_request or mentor_request",
                other
            ))),
        }
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a join request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
    Canceled,
}

/// Side of a request that is allowed to drive a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Party {
    Sender,
    Receiver,
}

impl RequestStatus {
    pub const ALL: [RequestStatus; 4] = [
        Self::Pending,
        Self::Accepted,
        Self::Rejected,
        Self::Canceled,
    ];

    pub const TERMINAL: [RequestStatus; 3] = [Self::Accepted, Self::Rejected, Self::Canceled];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Canceled => "canceled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Whether a request in this status may move to `target`.
    pub fn can_transition_to(&self, target: RequestStatus) -> bool {
        matches!(self, Self::Pending) && target.is_terminal()
    }

    /// The party allowed to move a request into this status, if any.
    pub fn resolving_party(&self) -> Option<Party> {
        match self {
            Self::Accepted | Self::Rejected => Some(Party::Receiver),
            Self::Canceled => Some(Party::Sender),
            Self::Pending => None,
        }
    }

    /// Parse a status supplied as a transition target.
    ///
    /// Anything other than a terminal status is rejected with
    /// `InvalidTargetStatus`.
    pub fn parse_target(s: &str) -> Result<Self, Error> {
        match s.parse::<Self>() {
            Ok(status) if status.is_terminal() => Ok(status),
            _ => Err(Error::InvalidTargetStatus(format!(
                "'{}'. Only accepted, rejected or canceled are allowed",
                s
            ))),
        }
    }
}

impl FromStr for RequestStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            "canceled" | "cancelled" => Ok(Self::Canceled),
            other => Err(Error::InvalidInput(format!("Unknown request status '{}'", other))),
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

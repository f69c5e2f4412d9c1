//! User identity types for MentorLoop.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// Role of a user account.
///
/// Roles are owned by the auth subsystem; the orchestrator only reads them
/// for authorization decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    NewHire,
    Mentor,
    Admin,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::NewHire => write!(f, "new_hire"),
            UserRole::Mentor => write!(f, "mentor"),
            UserRole::Admin => write!(f, "admin"),
        }
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "new_hire" => Ok(UserRole::NewHire),
            "mentor" => Ok(UserRole::Mentor),
            "admin" => Ok(UserRole::Admin),
            other => Err(format!("invalid user role: '{other}'")),
        }
    }
}

/// A user account, read-only from the orchestrator's point of view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub role: UserRole,
    pub display_name: String,
}

impl User {
    /// Convenience constructor used by callers assembling session context.
    pub fn new(id: Uuid, role: UserRole, display_name: impl Into<String>) -> Self {
        Self {
            id,
            role,
            display_name: display_name.into(),
        }
    }
}

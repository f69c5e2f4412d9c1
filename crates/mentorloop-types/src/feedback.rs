//! Feedback types for MentorLoop.
//!
//! Feedback attaches to a single assistant message. At most one feedback
//! row may exist per target message; the feedback store rejects a second
//! creation with a conflict (first writer wins).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// Role the feedback author acted in.
///
/// Always computed structurally from conversation ownership and active
/// mentor assignments, never taken from the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackAuthorRole {
    Mentor,
    NewHire,
}

impl fmt::Display for FeedbackAuthorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedbackAuthorRole::Mentor => write!(f, "mentor"),
            FeedbackAuthorRole::NewHire => write!(f, "new_hire"),
        }
    }
}

impl FromStr for FeedbackAuthorRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mentor" => Ok(FeedbackAuthorRole::Mentor),
            "new_hire" => Ok(FeedbackAuthorRole::NewHire),
            other => Err(format!("invalid feedback author role: '{other}'")),
        }
    }
}

/// Who may see a feedback entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackVisibility {
    /// Visible to the conversation owner and assigned mentors.
    Shared,
    /// Visible only to the author.
    Private,
}

impl Default for FeedbackVisibility {
    fn default() -> Self {
        FeedbackVisibility::Shared
    }
}

/// A mentor or self-reflection note attached to an assistant message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feedback {
    pub id: Uuid,
    pub target_message_id: Uuid,
    pub author_id: Uuid,
    pub author_role: FeedbackAuthorRole,
    pub content: String,
    pub visibility: FeedbackVisibility,
    pub created_at: DateTime<Utc>,
}

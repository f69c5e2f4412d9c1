//! Conversation and mentor-assignment types for MentorLoop.
//!
//! A conversation is owned by the new hire who created it. Mentor
//! assignments grant a mentor read/feedback rights over a new hire's
//! conversations for as long as the assignment is not revoked.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationState {
    Active,
    Archived,
}

impl fmt::Display for ConversationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversationState::Active => write!(f, "active"),
            ConversationState::Archived => write!(f, "archived"),
        }
    }
}

impl FromStr for ConversationState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(ConversationState::Active),
            "archived" => Ok(ConversationState::Archived),
            other => Err(format!("invalid conversation state: '{other}'")),
        }
    }
}

impl Default for ConversationState {
    fn default() -> Self {
        ConversationState::Active
    }
}

/// A conversation between a new hire and the assistant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    /// The new hire who created the conversation.
    pub owner_id: Uuid,
    pub title: String,
    pub state: ConversationState,
    pub created_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
}

/// A mentor-to-new-hire pairing.
///
/// An assignment grants rights only while `revoked_at` is unset; access
/// checks must filter on [`MentorAssignment::is_active`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MentorAssignment {
    pub mentor_id: Uuid,
    pub newhire_id: Uuid,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl MentorAssignment {
    /// Whether this assignment still grants any rights.
    pub fn is_active(&self) -> bool {
        self.revoked_at.is_none()
    }
}

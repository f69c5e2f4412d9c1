//! Message and delta types for MentorLoop.
//!
//! Messages are ordered by `(created_at, id)` within a conversation.
//! Assistant messages carry a lifecycle status; user messages have none
//! (they are final at creation). Deltas are the ephemeral streamed
//! fragments folded into an assistant message while it is being generated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Author role of a message within a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    NewHire,
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::NewHire => write!(f, "new_hire"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "new_hire" => Ok(MessageRole::NewHire),
            "assistant" => Ok(MessageRole::Assistant),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

/// Lifecycle status of an assistant message.
///
/// Status only ever moves forward: `Draft -> Partial -> Done`, with
/// `Cancelled` reachable from `Draft` or `Partial`. `Done` and `Cancelled`
/// are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Draft,
    Partial,
    Done,
    Cancelled,
}

impl MessageStatus {
    /// Whether this status admits no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, MessageStatus::Done | MessageStatus::Cancelled)
    }
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageStatus::Draft => write!(f, "draft"),
            MessageStatus::Partial => write!(f, "partial"),
            MessageStatus::Done => write!(f, "done"),
            MessageStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for MessageStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(MessageStatus::Draft),
            "partial" => Ok(MessageStatus::Partial),
            "done" => Ok(MessageStatus::Done),
            "cancelled" => Ok(MessageStatus::Cancelled),
            other => Err(format!("invalid message status: '{other}'")),
        }
    }
}

/// A single message within a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub role: MessageRole,
    pub content: String,
    /// Assistant messages only; user messages carry `None`.
    pub status: Option<MessageStatus>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn is_assistant(&self) -> bool {
        self.role == MessageRole::Assistant
    }

    /// Ordering key used everywhere messages are sorted: `(created_at, id)`.
    pub fn ordering_key(&self) -> (DateTime<Utc>, Uuid) {
        (self.created_at, self.id)
    }

    /// Compare two messages by their conversation ordering.
    pub fn cmp_by_order(&self, other: &Message) -> Ordering {
        self.ordering_key().cmp(&other.ordering_key())
    }
}

/// One streamed fragment of assistant text.
///
/// Ephemeral: deltas are folded into the active assistant message and never
/// persisted on their own. `seq_no` is strictly increasing per message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDelta {
    pub text: String,
    pub seq_no: u64,
}

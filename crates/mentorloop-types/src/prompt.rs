//! Prompt construction types for MentorLoop.
//!
//! A prompt is the ephemeral request shape handed to the generation port:
//! an optional system instruction plus an ordered list of role-tagged turns
//! built from a bounded trailing window of prior messages and the new
//! question.

use serde::{Deserialize, Serialize};

use std::fmt;

/// Role of a single prompt turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptRole {
    System,
    User,
    Assistant,
}

impl fmt::Display for PromptRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptRole::System => write!(f, "system"),
            PromptRole::User => write!(f, "user"),
            PromptRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// One role-tagged turn of a prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTurn {
    pub role: PromptRole,
    pub content: String,
}

impl PromptTurn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::Assistant,
            content: content.into(),
        }
    }
}

/// A fully assembled generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    pub turns: Vec<PromptTurn>,
}

impl Prompt {
    pub fn new(turns: Vec<PromptTurn>) -> Self {
        Self { turns }
    }

    /// The final user turn, i.e. the question being answered.
    pub fn question(&self) -> Option<&str> {
        self.turns
            .iter()
            .rev()
            .find(|t| t.role == PromptRole::User)
            .map(|t| t.content.as_str())
    }
}

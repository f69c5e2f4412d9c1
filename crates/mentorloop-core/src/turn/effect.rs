//! Declarative I/O effects queued by the turn controller.

use uuid::Uuid;

use mentorloop_types::feedback::{FeedbackAuthorRole, FeedbackVisibility};
use mentorloop_types::prompt::Prompt;

use std::fmt;

/// Unique id carried by every queued effect, used for acknowledgment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EffectId(Uuid);

impl EffectId {
    pub fn new() -> Self {
        EffectId(Uuid::now_v7())
    }
}

impl Default for EffectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A declarative request for I/O.
///
/// One variant per I/O kind, dispatched by exhaustive match in the
/// executor, so adding an effect kind is a compile-time-checked change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    PersistUserMessage {
        id: EffectId,
        conversation_id: Uuid,
        author_id: Uuid,
        content: String,
    },
    BeginAssistantMessage {
        id: EffectId,
        conversation_id: Uuid,
    },
    StreamAssistantResponse {
        id: EffectId,
        prompt: Prompt,
    },
    FinalizeAssistantMessage {
        id: EffectId,
        message_id: Uuid,
        final_text: String,
    },
    CancelAssistantMessage {
        id: EffectId,
        message_id: Uuid,
    },
    ListMessages {
        id: EffectId,
        conversation_id: Uuid,
        limit: i64,
    },
    ListFeedbacks {
        id: EffectId,
        message_id: Uuid,
        limit: i64,
    },
    CreateFeedback {
        id: EffectId,
        target_message_id: Uuid,
        author_id: Uuid,
        author_role: FeedbackAuthorRole,
        content: String,
        visibility: FeedbackVisibility,
    },
}

/// Discriminant of an [`Effect`], for logging and assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectKind {
    PersistUserMessage,
    BeginAssistantMessage,
    StreamAssistantResponse,
    FinalizeAssistantMessage,
    CancelAssistantMessage,
    ListMessages,
    ListFeedbacks,
    CreateFeedback,
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EffectKind::PersistUserMessage => "persist-user-message",
            EffectKind::BeginAssistantMessage => "begin-assistant-message",
            EffectKind::StreamAssistantResponse => "stream-assistant-response",
            EffectKind::FinalizeAssistantMessage => "finalize-assistant-message",
            EffectKind::CancelAssistantMessage => "cancel-assistant-message",
            EffectKind::ListMessages => "list-messages",
            EffectKind::ListFeedbacks => "list-feedbacks",
            EffectKind::CreateFeedback => "create-feedback",
        };
        write!(f, "{name}")
    }
}

impl Effect {
    pub fn id(&self) -> EffectId {
        match self {
            Effect::PersistUserMessage { id, .. }
            | Effect::BeginAssistantMessage { id, .. }
            | Effect::StreamAssistantResponse { id, .. }
            | Effect::FinalizeAssistantMessage { id, .. }
            | Effect::CancelAssistantMessage { id, .. }
            | Effect::ListMessages { id, .. }
            | Effect::ListFeedbacks { id, .. }
            | Effect::CreateFeedback { id, .. } => *id,
        }
    }

    pub fn kind(&self) -> EffectKind {
        match self {
            Effect::PersistUserMessage { .. } => EffectKind::PersistUserMessage,
            Effect::BeginAssistantMessage { .. } => EffectKind::BeginAssistantMessage,
            Effect::StreamAssistantResponse { .. } => EffectKind::StreamAssistantResponse,
            Effect::FinalizeAssistantMessage { .. } => EffectKind::FinalizeAssistantMessage,
            Effect::CancelAssistantMessage { .. } => EffectKind::CancelAssistantMessage,
            Effect::ListMessages { .. } => EffectKind::ListMessages,
            Effect::ListFeedbacks { .. } => EffectKind::ListFeedbacks,
            Effect::CreateFeedback { .. } => EffectKind::CreateFeedback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effect_ids_are_unique() {
        let a = Effect::BeginAssistantMessage {
            id: EffectId::new(),
            conversation_id: Uuid::now_v7(),
        };
        let b = Effect::BeginAssistantMessage {
            id: EffectId::new(),
            conversation_id: Uuid::now_v7(),
        };
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_effect_kind_display() {
        let effect = Effect::ListFeedbacks {
            id: EffectId::new(),
            message_id: Uuid::now_v7(),
            limit: 20,
        };
        assert_eq!(effect.kind().to_string(), "list-feedbacks");
    }
}

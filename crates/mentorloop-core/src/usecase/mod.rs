//! Pure use-case/validation layer.
//!
//! Every function here is synchronous, side-effect-free, and returns either
//! a validated, persistence-ready command value or a typed
//! [`UseCaseError`](mentorloop_types::error::UseCaseError). The turn
//! controller calls these before enqueueing any effect; nothing in this
//! module touches a port.

mod conversation;
mod feedback;
mod message;

pub use conversation::{build_prompt_for_conversation, create_conversation, NewConversation};
pub use feedback::{
    list_message_feedbacks, validate_feedback_rules, NewFeedback,
};
pub use message::{
    append_assistant_delta, begin_assistant_message, cancel_assistant_message,
    create_user_message, finalize_assistant_message, list_conversation_messages,
    NewAssistantMessage, NewUserMessage,
};

/// Maximum length of a user message, in characters.
pub const MAX_MESSAGE_CHARS: usize = 4000;

/// Maximum length of a conversation title, in characters.
pub const MAX_TITLE_CHARS: usize = 120;

/// Maximum length of a feedback note, in characters.
pub const MAX_FEEDBACK_CHARS: usize = 2000;

/// Default page size for list operations.
pub const DEFAULT_LIST_LIMIT: i64 = 20;

/// Largest page size a caller may request.
pub const MAX_LIST_LIMIT: i64 = 100;

/// A validated list request with its limit clamped to `[1, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListQuery {
    pub limit: i64,
}

pub(crate) fn clamp_limit(limit: Option<i64>) -> i64 {
    limit
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(1, MAX_LIST_LIMIT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_limit_defaults_to_twenty() {
        assert_eq!(clamp_limit(None), 20);
    }

    #[test]
    fn test_clamp_limit_bounds() {
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(-5)), 1);
        assert_eq!(clamp_limit(Some(100)), 100);
        assert_eq!(clamp_limit(Some(1000)), 100);
        assert_eq!(clamp_limit(Some(42)), 42);
    }
}

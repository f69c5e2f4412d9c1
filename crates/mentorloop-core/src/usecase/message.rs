//! Message use-cases and the assistant-message lifecycle state machine.
//!
//! The lifecycle is `Draft -> Partial -> Done`, with `Cancelled` reachable
//! from `Draft` or `Partial`. `Done` and `Cancelled` are terminal: any
//! further delta, finalize, or cancel is rejected as a validation error,
//! never silently ignored. These functions are the only code path allowed
//! to change an assistant message's status or content.

use mentorloop_types::conversation::{Conversation, MentorAssignment};
use mentorloop_types::error::UseCaseError;
use mentorloop_types::message::{Message, MessageDelta, MessageStatus};
use mentorloop_types::user::User;
use uuid::Uuid;

use crate::access::can_access_conversation;
use crate::usecase::{clamp_limit, ListQuery, MAX_MESSAGE_CHARS};

/// Persistence-ready payload for a new user message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUserMessage {
    pub conversation_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
}

/// Persistence-ready payload for a new assistant placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAssistantMessage {
    pub conversation_id: Uuid,
}

/// Validate a user's question before it is persisted.
///
/// Content is trimmed; empty or over-long content fails validation, and
/// only the conversation owner may post.
pub fn create_user_message(
    user: &User,
    conversation: &Conversation,
    content: &str,
) -> Result<NewUserMessage, UseCaseError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(UseCaseError::validation("Message content must not be empty."));
    }
    if trimmed.chars().count() > MAX_MESSAGE_CHARS {
        return Err(UseCaseError::validation(
            "Message content exceeds the allowed length.",
        ));
    }
    if user.id != conversation.owner_id {
        return Err(UseCaseError::forbidden(
            "Only the conversation owner can post messages.",
        ));
    }
    Ok(NewUserMessage {
        conversation_id: conversation.id,
        author_id: user.id,
        content: trimmed.to_string(),
    })
}

/// Authorize creation of the assistant placeholder for a turn.
pub fn begin_assistant_message(
    conversation: &Conversation,
    requester: &User,
) -> Result<NewAssistantMessage, UseCaseError> {
    if requester.id != conversation.owner_id {
        return Err(UseCaseError::forbidden(
            "Only the conversation owner can request an assistant reply.",
        ));
    }
    Ok(NewAssistantMessage {
        conversation_id: conversation.id,
    })
}

/// Fold one streamed delta into an assistant message.
///
/// `last_seq_no` is the highest sequence number already accepted for this
/// message (0 when none). A delta is accepted only if its sequence number
/// is strictly greater; violations are rejected, not reordered. The first
/// accepted delta moves the message to `Partial` with its content replaced;
/// later deltas append.
pub fn append_assistant_delta(
    message: &Message,
    delta: &MessageDelta,
    last_seq_no: u64,
) -> Result<Message, UseCaseError> {
    if !message.is_assistant() {
        return Err(UseCaseError::validation(
            "Only assistant messages accept deltas.",
        ));
    }
    if delta.seq_no <= last_seq_no {
        return Err(UseCaseError::validation(format!(
            "Delta sequence number {} is not greater than the last accepted {}.",
            delta.seq_no, last_seq_no
        )));
    }
    if delta.text.is_empty() {
        return Err(UseCaseError::validation("Delta text must not be empty."));
    }
    match message.status {
        Some(status) if status.is_terminal() => {
            return Err(UseCaseError::validation(format!(
                "A {status} message accepts no further deltas."
            )));
        }
        _ => {}
    }

    let mut updated = message.clone();
    match message.status {
        Some(MessageStatus::Partial) => updated.content.push_str(&delta.text),
        // Draft or unset: first chunk replaces whatever placeholder content exists.
        _ => updated.content = delta.text.clone(),
    }
    updated.status = Some(MessageStatus::Partial);
    Ok(updated)
}

/// Mark an assistant message done, overwriting accumulated content with the
/// authoritative final text.
///
/// The final text wins over the sum of fragments; this defends against
/// dropped or duplicated deltas at the boundary.
pub fn finalize_assistant_message(
    message: &Message,
    final_text: &str,
) -> Result<Message, UseCaseError> {
    if !message.is_assistant() {
        return Err(UseCaseError::validation(
            "Only assistant messages can be finalized.",
        ));
    }
    match message.status {
        Some(MessageStatus::Cancelled) => {
            return Err(UseCaseError::validation(
                "Cancelled messages cannot be finalized.",
            ));
        }
        Some(MessageStatus::Done) => {
            return Err(UseCaseError::validation(
                "Completed messages cannot be finalized again.",
            ));
        }
        _ => {}
    }
    let trimmed = final_text.trim();
    if trimmed.is_empty() {
        return Err(UseCaseError::validation("Final text must not be empty."));
    }

    let mut updated = message.clone();
    updated.status = Some(MessageStatus::Done);
    updated.content = trimmed.to_string();
    Ok(updated)
}

/// Cancel an in-flight assistant message, keeping whatever content has
/// accumulated so far.
pub fn cancel_assistant_message(message: &Message) -> Result<Message, UseCaseError> {
    if !message.is_assistant() {
        return Err(UseCaseError::validation(
            "Only assistant messages can be cancelled.",
        ));
    }
    match message.status {
        Some(MessageStatus::Done) => {
            return Err(UseCaseError::validation(
                "Completed messages cannot be cancelled.",
            ));
        }
        Some(MessageStatus::Cancelled) => {
            return Err(UseCaseError::validation(
                "The message is already cancelled.",
            ));
        }
        _ => {}
    }

    let mut updated = message.clone();
    updated.status = Some(MessageStatus::Cancelled);
    Ok(updated)
}

/// Validate a request to list a conversation's messages.
pub fn list_conversation_messages(
    requester: &User,
    conversation: &Conversation,
    mentor_assignments: &[MentorAssignment],
    limit: Option<i64>,
) -> Result<ListQuery, UseCaseError> {
    if !can_access_conversation(requester, conversation, mentor_assignments) {
        return Err(UseCaseError::forbidden(
            "You do not have access to this conversation.",
        ));
    }
    Ok(ListQuery {
        limit: clamp_limit(limit),
    })
}

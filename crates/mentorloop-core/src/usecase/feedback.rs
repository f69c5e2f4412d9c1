//! Feedback use-cases: listing and authoring rules.
//!
//! The author role is computed structurally from conversation ownership and
//! active mentor assignments. A caller-supplied role is never trusted.

use mentorloop_types::conversation::{Conversation, MentorAssignment};
use mentorloop_types::error::UseCaseError;
use mentorloop_types::feedback::{FeedbackAuthorRole, FeedbackVisibility};
use mentorloop_types::message::Message;
use mentorloop_types::user::{User, UserRole};
use uuid::Uuid;

use crate::access::can_access_conversation;
use crate::usecase::{clamp_limit, ListQuery, MAX_FEEDBACK_CHARS};

/// Persistence-ready payload for a new feedback entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFeedback {
    pub target_message_id: Uuid,
    pub author_id: Uuid,
    pub author_role: FeedbackAuthorRole,
    pub content: String,
    pub visibility: FeedbackVisibility,
}

/// Validate a request to list the feedback attached to a message.
pub fn list_message_feedbacks(
    requester: &User,
    conversation: &Conversation,
    target_message: &Message,
    mentor_assignments: &[MentorAssignment],
    limit: Option<i64>,
) -> Result<ListQuery, UseCaseError> {
    if !can_access_conversation(requester, conversation, mentor_assignments) {
        return Err(UseCaseError::forbidden(
            "You do not have access to this conversation.",
        ));
    }
    if target_message.conversation_id != conversation.id {
        return Err(UseCaseError::not_found(
            "The message does not belong to this conversation.",
        ));
    }
    Ok(ListQuery {
        limit: clamp_limit(limit),
    })
}

/// Validate a request to attach feedback to an assistant message.
///
/// The author is either the conversation owner (self-reflection) or a
/// mentor actively assigned to the owner; anyone else is forbidden.
pub fn validate_feedback_rules(
    requester: &User,
    conversation: &Conversation,
    target_message: &Message,
    content: &str,
    mentor_assignments: &[MentorAssignment],
) -> Result<NewFeedback, UseCaseError> {
    if target_message.conversation_id != conversation.id {
        return Err(UseCaseError::not_found(
            "The message does not belong to this conversation.",
        ));
    }
    if !target_message.is_assistant() {
        return Err(UseCaseError::validation(
            "Feedback can only target assistant messages.",
        ));
    }
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(UseCaseError::validation(
            "Feedback content must not be empty.",
        ));
    }
    if trimmed.chars().count() > MAX_FEEDBACK_CHARS {
        return Err(UseCaseError::validation(
            "Feedback content exceeds the allowed length.",
        ));
    }

    let author_role = resolve_author_role(requester, conversation, mentor_assignments)?;

    Ok(NewFeedback {
        target_message_id: target_message.id,
        author_id: requester.id,
        author_role,
        content: trimmed.to_string(),
        visibility: FeedbackVisibility::default(),
    })
}

fn resolve_author_role(
    requester: &User,
    conversation: &Conversation,
    mentor_assignments: &[MentorAssignment],
) -> Result<FeedbackAuthorRole, UseCaseError> {
    if requester.id == conversation.owner_id {
        return Ok(FeedbackAuthorRole::NewHire);
    }
    let actively_assigned = requester.role == UserRole::Mentor
        && mentor_assignments.iter().any(|a| {
            a.is_active() && a.mentor_id == requester.id && a.newhire_id == conversation.owner_id
        });
    if actively_assigned {
        return Ok(FeedbackAuthorRole::Mentor);
    }
    Err(UseCaseError::forbidden(
        "Only the conversation owner or an assigned mentor can leave feedback.",
    ))
}

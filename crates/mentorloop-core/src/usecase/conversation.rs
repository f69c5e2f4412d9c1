//! Conversation creation and prompt construction use-cases.

use mentorloop_types::conversation::Conversation;
use mentorloop_types::error::UseCaseError;
use mentorloop_types::message::{Message, MessageRole};
use mentorloop_types::prompt::{Prompt, PromptTurn};
use mentorloop_types::user::{User, UserRole};
use uuid::Uuid;

use crate::usecase::MAX_TITLE_CHARS;

/// Persistence-ready payload for a new conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewConversation {
    pub owner_id: Uuid,
    pub title: String,
    pub mentor_id: Option<Uuid>,
}

/// Validate a request to create a conversation.
///
/// Only new hires create conversations. When the caller's org exposes a
/// non-empty set of selectable mentors, picking one of them is mandatory;
/// when the set is empty, no mentor may be selected.
pub fn create_conversation(
    requester: &User,
    title: &str,
    mentor_id: Option<Uuid>,
    allowed_mentor_ids: &[Uuid],
) -> Result<NewConversation, UseCaseError> {
    if requester.role != UserRole::NewHire {
        return Err(UseCaseError::forbidden(
            "Only new hires can create conversations.",
        ));
    }
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(UseCaseError::validation("Title must not be empty."));
    }
    if trimmed.chars().count() > MAX_TITLE_CHARS {
        return Err(UseCaseError::validation(
            "Title exceeds the allowed length.",
        ));
    }
    if allowed_mentor_ids.is_empty() {
        if mentor_id.is_some() {
            return Err(UseCaseError::validation(
                "A mentor cannot be selected for this conversation.",
            ));
        }
    } else {
        let Some(selected) = mentor_id else {
            return Err(UseCaseError::validation("A mentor must be selected."));
        };
        if !allowed_mentor_ids.contains(&selected) {
            return Err(UseCaseError::validation(
                "The selected mentor is not available.",
            ));
        }
    }
    Ok(NewConversation {
        owner_id: requester.id,
        title: trimmed.to_string(),
        mentor_id,
    })
}

/// Assemble the generation prompt for one turn.
///
/// History is the last `history_window` of the supplied messages sorted by
/// `(created_at, id)` ascending, preceded by a system turn naming the
/// conversation topic (only when the title is non-empty) and followed by
/// the new question as the final user turn. A window of zero yields no
/// history turns.
pub fn build_prompt_for_conversation(
    user: &User,
    conversation: &Conversation,
    messages: &[Message],
    question: &str,
    history_window: i64,
) -> Result<Prompt, UseCaseError> {
    let trimmed_question = question.trim();
    if trimmed_question.is_empty() {
        return Err(UseCaseError::validation("Question must not be empty."));
    }
    if history_window < 0 {
        return Err(UseCaseError::validation(
            "History window must not be negative.",
        ));
    }
    if user.id != conversation.owner_id {
        return Err(UseCaseError::forbidden(
            "Only the conversation owner can build a prompt.",
        ));
    }

    let mut ordered: Vec<&Message> = messages.iter().collect();
    ordered.sort_by(|a, b| a.cmp_by_order(b));
    let window = history_window as usize;
    let skip = ordered.len().saturating_sub(window);

    let mut turns = Vec::with_capacity(ordered.len().min(window) + 2);
    let topic = conversation.title.trim();
    if !topic.is_empty() {
        turns.push(PromptTurn::system(format!("Conversation topic: {topic}")));
    }
    for message in ordered.into_iter().skip(skip) {
        let turn = match message.role {
            MessageRole::NewHire => PromptTurn::user(message.content.clone()),
            MessageRole::Assistant => PromptTurn::assistant(message.content.clone()),
        };
        turns.push(turn);
    }
    turns.push(PromptTurn::user(trimmed_question.to_string()));

    Ok(Prompt::new(turns))
}

//! In-memory port adapters.
//!
//! DashMap-backed implementations of the persistence, feedback, and lookup
//! ports. They back tests and local development; a relational store would
//! implement the same traits.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use mentorloop_core::ports::{DisplayNameLookup, FeedbackStore, MessagePage, MessageStore, Page};
use mentorloop_types::error::PortError;
use mentorloop_types::feedback::{Feedback, FeedbackAuthorRole, FeedbackVisibility};
use mentorloop_types::message::{Message, MessageRole, MessageStatus};

/// In-memory message store.
#[derive(Debug, Default)]
pub struct InMemoryMessageStore {
    messages: DashMap<Uuid, Message>,
    fail_next: AtomicBool,
}

impl InMemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next store call fail with an I/O error (test hook).
    pub fn fail_next_call(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    fn check_failure(&self) -> Result<(), PortError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(PortError::Io("injected failure".into()));
        }
        Ok(())
    }

    /// Direct read of a stored message (test inspection).
    pub fn get(&self, message_id: Uuid) -> Option<Message> {
        self.messages.get(&message_id).map(|m| m.clone())
    }
}

impl MessageStore for InMemoryMessageStore {
    async fn create_user_message(
        &self,
        conversation_id: Uuid,
        author_id: Uuid,
        content: &str,
    ) -> Result<Message, PortError> {
        self.check_failure()?;
        let _ = author_id;
        let message = Message {
            id: Uuid::now_v7(),
            conversation_id,
            role: MessageRole::NewHire,
            content: content.to_string(),
            status: None,
            created_at: Utc::now(),
        };
        self.messages.insert(message.id, message.clone());
        Ok(message)
    }

    async fn begin_assistant_message(
        &self,
        conversation_id: Uuid,
    ) -> Result<Message, PortError> {
        self.check_failure()?;
        let message = Message {
            id: Uuid::now_v7(),
            conversation_id,
            role: MessageRole::Assistant,
            content: String::new(),
            status: Some(MessageStatus::Draft),
            created_at: Utc::now(),
        };
        self.messages.insert(message.id, message.clone());
        Ok(message)
    }

    async fn finalize_assistant_message(
        &self,
        message_id: Uuid,
        final_text: &str,
    ) -> Result<Message, PortError> {
        self.check_failure()?;
        let mut entry = self
            .messages
            .get_mut(&message_id)
            .ok_or(PortError::NotFound)?;
        entry.status = Some(MessageStatus::Done);
        entry.content = final_text.to_string();
        Ok(entry.clone())
    }

    async fn cancel_assistant_message(&self, message_id: Uuid) -> Result<Message, PortError> {
        self.check_failure()?;
        let mut entry = self
            .messages
            .get_mut(&message_id)
            .ok_or(PortError::NotFound)?;
        entry.status = Some(MessageStatus::Cancelled);
        Ok(entry.clone())
    }

    async fn list_conversation_messages(
        &self,
        conversation_id: Uuid,
        cursor: Option<&str>,
        limit: i64,
    ) -> Result<MessagePage, PortError> {
        self.check_failure()?;
        let mut items: Vec<Message> = self
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .map(|m| m.clone())
            .collect();
        items.sort_by(|a, b| a.cmp_by_order(b));

        if let Some(cursor) = cursor {
            let after: Option<Uuid> = cursor.parse().ok();
            if let Some(after) = after {
                if let Some(pos) = items.iter().position(|m| m.id == after) {
                    items.drain(..=pos);
                }
            }
        }

        let limit = limit.max(0) as usize;
        let next_cursor = if items.len() > limit {
            items.truncate(limit);
            items.last().map(|m| m.id.to_string())
        } else {
            None
        };
        // Deltas are not persisted individually, so there is no sequence
        // number to resume from.
        Ok(MessagePage {
            items,
            next_cursor,
            last_seq_no: None,
        })
    }
}

/// In-memory feedback store enforcing at most one entry per message.
#[derive(Debug, Default)]
pub struct InMemoryFeedbackStore {
    by_message: DashMap<Uuid, Feedback>,
}

impl InMemoryFeedbackStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FeedbackStore for InMemoryFeedbackStore {
    async fn create_feedback(
        &self,
        target_message_id: Uuid,
        author_id: Uuid,
        author_role: FeedbackAuthorRole,
        content: &str,
        visibility: FeedbackVisibility,
    ) -> Result<Feedback, PortError> {
        use dashmap::mapref::entry::Entry;
        match self.by_message.entry(target_message_id) {
            Entry::Occupied(_) => Err(PortError::Conflict(
                "Feedback already exists for this message.".into(),
            )),
            Entry::Vacant(entry) => {
                let feedback = Feedback {
                    id: Uuid::now_v7(),
                    target_message_id,
                    author_id,
                    author_role,
                    content: content.to_string(),
                    visibility,
                    created_at: Utc::now(),
                };
                entry.insert(feedback.clone());
                Ok(feedback)
            }
        }
    }

    async fn list_feedbacks(
        &self,
        message_id: Uuid,
        _cursor: Option<&str>,
        _limit: i64,
    ) -> Result<Page<Feedback>, PortError> {
        let items = self
            .by_message
            .get(&message_id)
            .map(|f| vec![f.clone()])
            .unwrap_or_default();
        Ok(Page {
            items,
            next_cursor: None,
        })
    }
}

/// In-memory display-name directory.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    names: DashMap<Uuid, String>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, user_id: Uuid, name: impl Into<String>) {
        self.names.insert(user_id, name.into());
    }
}

impl DisplayNameLookup for InMemoryDirectory {
    async fn get_user_display_name(&self, user_id: Uuid) -> Result<Option<String>, PortError> {
        Ok(self.names.get(&user_id).map(|n| n.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn user_message_persists_with_no_status() {
        let store = InMemoryMessageStore::new();
        let conv = Uuid::now_v7();
        let saved = store
            .create_user_message(conv, Uuid::now_v7(), "hello")
            .await
            .unwrap();
        assert_eq!(saved.role, MessageRole::NewHire);
        assert!(saved.status.is_none());
        assert_eq!(store.get(saved.id).unwrap().content, "hello");
    }

    #[tokio::test]
    async fn assistant_lifecycle_persists_status() {
        let store = InMemoryMessageStore::new();
        let conv = Uuid::now_v7();
        let draft = store.begin_assistant_message(conv).await.unwrap();
        assert_eq!(draft.status, Some(MessageStatus::Draft));

        let done = store
            .finalize_assistant_message(draft.id, "final answer")
            .await
            .unwrap();
        assert_eq!(done.status, Some(MessageStatus::Done));
        assert_eq!(done.content, "final answer");
    }

    #[tokio::test]
    async fn finalize_unknown_message_is_not_found() {
        let store = InMemoryMessageStore::new();
        let err = store
            .finalize_assistant_message(Uuid::now_v7(), "text")
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::NotFound));
    }

    #[tokio::test]
    async fn list_messages_orders_and_paginates() {
        let store = InMemoryMessageStore::new();
        let conv = Uuid::now_v7();
        for i in 0..5 {
            store
                .create_user_message(conv, Uuid::now_v7(), &format!("m{i}"))
                .await
                .unwrap();
        }

        let first = store
            .list_conversation_messages(conv, None, 3)
            .await
            .unwrap();
        assert_eq!(first.items.len(), 3);
        assert_eq!(first.items[0].content, "m0");
        let cursor = first.next_cursor.expect("expected a next cursor");

        let rest = store
            .list_conversation_messages(conv, Some(&cursor), 3)
            .await
            .unwrap();
        assert_eq!(rest.items.len(), 2);
        assert_eq!(rest.items[0].content, "m3");
        assert!(rest.next_cursor.is_none());
    }

    #[tokio::test]
    async fn second_feedback_for_same_message_conflicts() {
        let store = InMemoryFeedbackStore::new();
        let target = Uuid::now_v7();
        store
            .create_feedback(
                target,
                Uuid::now_v7(),
                FeedbackAuthorRole::Mentor,
                "first",
                FeedbackVisibility::Shared,
            )
            .await
            .unwrap();
        let err = store
            .create_feedback(
                target,
                Uuid::now_v7(),
                FeedbackAuthorRole::NewHire,
                "second",
                FeedbackVisibility::Shared,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::Conflict(_)));

        let page = store.list_feedbacks(target, None, 20).await.unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].content, "first");
    }

    #[tokio::test]
    async fn directory_lookup_misses_return_none() {
        let directory = InMemoryDirectory::new();
        let known = Uuid::now_v7();
        directory.insert(known, "Sam");
        assert_eq!(
            directory.get_user_display_name(known).await.unwrap(),
            Some("Sam".to_string())
        );
        assert_eq!(
            directory
                .get_user_display_name(Uuid::now_v7())
                .await
                .unwrap(),
            None
        );
    }
}

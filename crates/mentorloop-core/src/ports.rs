//! Port traits implemented by the infrastructure layer.
//!
//! These are the orchestrator's only view of the outside world: message
//! persistence, feedback persistence, streaming generation, and display-name
//! lookup. Uses native async fn in traits (RPITIT, Rust 2024 edition) for
//! the request/response ports; the generation port returns a boxed stream
//! so it stays object-safe.
//!
//! Implementations live in mentorloop-infra.

use std::pin::Pin;

use futures_util::Stream;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use mentorloop_types::error::{GenerationError, PortError};
use mentorloop_types::feedback::{Feedback, FeedbackAuthorRole, FeedbackVisibility};
use mentorloop_types::message::{Message, MessageDelta};
use mentorloop_types::prompt::Prompt;

/// One page of a list query.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
}

/// One page of a message listing.
///
/// `last_seq_no` is the highest delta sequence number persisted for a
/// still-partial assistant message in the page, letting a fresh session
/// resume delta tracking where the stream left off.
#[derive(Debug, Clone)]
pub struct MessagePage {
    pub items: Vec<Message>,
    pub next_cursor: Option<String>,
    pub last_seq_no: Option<u64>,
}

/// Persistence port for conversation messages.
pub trait MessageStore: Send + Sync {
    /// Persist a validated user message.
    fn create_user_message(
        &self,
        conversation_id: Uuid,
        author_id: Uuid,
        content: &str,
    ) -> impl std::future::Future<Output = Result<Message, PortError>> + Send;

    /// Create the empty assistant placeholder for a turn.
    fn begin_assistant_message(
        &self,
        conversation_id: Uuid,
    ) -> impl std::future::Future<Output = Result<Message, PortError>> + Send;

    /// Persist the authoritative final text for an assistant message.
    fn finalize_assistant_message(
        &self,
        message_id: Uuid,
        final_text: &str,
    ) -> impl std::future::Future<Output = Result<Message, PortError>> + Send;

    /// Mark an assistant message cancelled.
    fn cancel_assistant_message(
        &self,
        message_id: Uuid,
    ) -> impl std::future::Future<Output = Result<Message, PortError>> + Send;

    /// List a conversation's messages ordered by `(created_at, id)` ASC.
    fn list_conversation_messages(
        &self,
        conversation_id: Uuid,
        cursor: Option<&str>,
        limit: i64,
    ) -> impl std::future::Future<Output = Result<MessagePage, PortError>> + Send;
}

/// Persistence port for feedback entries.
pub trait FeedbackStore: Send + Sync {
    /// Create a feedback entry. Returns `Conflict` if the target message
    /// already has one (first writer wins).
    fn create_feedback(
        &self,
        target_message_id: Uuid,
        author_id: Uuid,
        author_role: FeedbackAuthorRole,
        content: &str,
        visibility: FeedbackVisibility,
    ) -> impl std::future::Future<Output = Result<Feedback, PortError>> + Send;

    /// List feedback for a message (at most one entry by invariant).
    fn list_feedbacks(
        &self,
        message_id: Uuid,
        cursor: Option<&str>,
        limit: i64,
    ) -> impl std::future::Future<Output = Result<Page<Feedback>, PortError>> + Send;
}

/// One event from the streaming generation port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationEvent {
    /// An incremental text fragment with its monotonic sequence number.
    Delta(MessageDelta),
    /// End of stream with the authoritative final text.
    Completed { text: String },
}

/// Streaming generation port.
///
/// Produces a finite sequence of events for one prompt. The stream is not
/// restartable; regenerating requires a fresh request. The cancellation
/// token aborts the underlying stream cooperatively.
pub trait GenerationProvider: Send + Sync {
    /// Selector for the model/runtime this provider targets.
    fn model(&self) -> &str;

    /// Open a generation stream for the prompt.
    ///
    /// Returns a boxed stream (not RPITIT) so the provider stays
    /// object-safe behind `dyn GenerationProvider`.
    fn stream(
        &self,
        prompt: Prompt,
        cancel: CancellationToken,
    ) -> Pin<Box<dyn Stream<Item = Result<GenerationEvent, GenerationError>> + Send + 'static>>;
}

/// Display-name lookup port, used to resolve feedback author names.
pub trait DisplayNameLookup: Send + Sync {
    fn get_user_display_name(
        &self,
        user_id: Uuid,
    ) -> impl std::future::Future<Output = Result<Option<String>, PortError>> + Send;
}

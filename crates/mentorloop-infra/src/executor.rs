//! The effect executor.
//!
//! The only component that performs actual I/O. Drains the controller's
//! effect queue one effect at a time, performs the corresponding port call,
//! and reports the outcome back through the controller's notify callbacks.
//! Every dispatched effect is acknowledged whether it succeeded or failed,
//! so a single failure never stalls the queue.

use std::time::Duration;

use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use mentorloop_core::ports::{
    DisplayNameLookup, FeedbackStore, GenerationEvent, GenerationProvider, MessageStore,
};
use mentorloop_core::turn::{Effect, TurnController};
use mentorloop_types::prompt::Prompt;

/// Serialized executor over the four ports.
pub struct TurnExecutor<M, F, G, L> {
    messages: M,
    feedbacks: F,
    generator: G,
    directory: L,
    /// A stream with no fragment for this long is treated as implicitly
    /// cancelled.
    stream_idle_timeout: Duration,
}

impl<M, F, G, L> TurnExecutor<M, F, G, L>
where
    M: MessageStore,
    F: FeedbackStore,
    G: GenerationProvider,
    L: DisplayNameLookup,
{
    pub fn new(
        messages: M,
        feedbacks: F,
        generator: G,
        directory: L,
        stream_idle_timeout: Duration,
    ) -> Self {
        Self {
            messages,
            feedbacks,
            generator,
            directory,
            stream_idle_timeout,
        }
    }

    /// Perform queued effects until the controller has none pending.
    ///
    /// Effects enqueued by notify callbacks during the loop (e.g. the
    /// finalize that follows stream completion) are picked up in the same
    /// call.
    pub async fn run_until_idle(&self, controller: &mut TurnController, cancel: &CancellationToken) {
        while let Some(effect) = controller.next_effect() {
            let id = effect.id();
            self.perform(controller, effect, cancel).await;
            controller.acknowledge_effect(id);
        }
    }

    async fn perform(
        &self,
        controller: &mut TurnController,
        effect: Effect,
        cancel: &CancellationToken,
    ) {
        match effect {
            Effect::PersistUserMessage {
                conversation_id,
                author_id,
                content,
                ..
            } => {
                match self
                    .messages
                    .create_user_message(conversation_id, author_id, &content)
                    .await
                {
                    Ok(saved) => controller.notify_user_message_persisted(saved),
                    Err(err) => controller.report_external_failure(err),
                }
            }
            Effect::BeginAssistantMessage {
                conversation_id, ..
            } => match self.messages.begin_assistant_message(conversation_id).await {
                Ok(placeholder) => controller.notify_assistant_message_created(placeholder),
                Err(err) => controller.report_external_failure(err),
            },
            Effect::StreamAssistantResponse { prompt, .. } => {
                self.stream_response(controller, prompt, cancel).await;
            }
            Effect::FinalizeAssistantMessage {
                message_id,
                final_text,
                ..
            } => {
                if let Err(err) = self
                    .messages
                    .finalize_assistant_message(message_id, &final_text)
                    .await
                {
                    controller.report_external_failure(err);
                }
            }
            Effect::CancelAssistantMessage { message_id, .. } => {
                if let Err(err) = self.messages.cancel_assistant_message(message_id).await {
                    controller.report_external_failure(err);
                }
            }
            Effect::ListMessages {
                conversation_id,
                limit,
                ..
            } => {
                match self
                    .messages
                    .list_conversation_messages(conversation_id, None, limit)
                    .await
                {
                    Ok(page) => controller.notify_messages_listed(page.items, page.last_seq_no),
                    Err(err) => controller.report_external_failure(err),
                }
            }
            Effect::ListFeedbacks {
                message_id, limit, ..
            } => match self.feedbacks.list_feedbacks(message_id, None, limit).await {
                Ok(page) => {
                    self.resolve_author_names(controller, &page.items).await;
                    controller.notify_feedbacks_listed(message_id, page.items);
                }
                Err(err) => controller.report_external_failure(err),
            },
            Effect::CreateFeedback {
                target_message_id,
                author_id,
                author_role,
                content,
                visibility,
                ..
            } => {
                match self
                    .feedbacks
                    .create_feedback(target_message_id, author_id, author_role, &content, visibility)
                    .await
                {
                    Ok(feedback) => {
                        self.resolve_author_names(controller, std::slice::from_ref(&feedback))
                            .await;
                        controller.notify_feedback_created(feedback);
                    }
                    Err(err) => controller.report_external_failure(err),
                }
            }
        }
    }

    /// Sequential pull over the generation stream.
    ///
    /// Each fragment is handed to the controller in arrival order. The
    /// stream ends in exactly one of three ways: a `Completed` event
    /// (finalize), an error or external cancellation (cancel), or
    /// exhaustion without a completion event, which indicates a provider
    /// bug and is treated as a cancellation.
    async fn stream_response(
        &self,
        controller: &mut TurnController,
        prompt: Prompt,
        cancel: &CancellationToken,
    ) {
        let mut stream = self.generator.stream(prompt, cancel.child_token());
        loop {
            let next = tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("generation cancelled externally");
                    controller.notify_assistant_stream_cancelled();
                    return;
                }
                next = tokio::time::timeout(self.stream_idle_timeout, stream.next()) => next,
            };
            match next {
                Err(_elapsed) => {
                    warn!(
                        timeout_ms = self.stream_idle_timeout.as_millis() as u64,
                        "no fragment within the idle timeout, treating as cancelled"
                    );
                    controller.notify_assistant_stream_cancelled();
                    return;
                }
                Ok(Some(Ok(GenerationEvent::Delta(delta)))) => {
                    controller.notify_assistant_delta(delta);
                }
                Ok(Some(Ok(GenerationEvent::Completed { text }))) => {
                    controller.notify_assistant_stream_completed(&text);
                    return;
                }
                Ok(Some(Err(err))) => {
                    warn!(%err, "generation stream failed");
                    controller.notify_assistant_stream_cancelled();
                    return;
                }
                Ok(None) => {
                    warn!("generation stream ended without a completion event");
                    controller.notify_assistant_stream_cancelled();
                    return;
                }
            }
        }
    }

    async fn resolve_author_names(
        &self,
        controller: &mut TurnController,
        feedbacks: &[mentorloop_types::feedback::Feedback],
    ) {
        for feedback in feedbacks {
            match self.directory.get_user_display_name(feedback.author_id).await {
                Ok(name) => controller.record_display_name(feedback.author_id, name),
                Err(err) => {
                    debug!(author_id = %feedback.author_id, %err, "display name lookup failed");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::pin::Pin;

    use chrono::Utc;
    use futures_util::Stream;
    use uuid::Uuid;

    use mentorloop_types::conversation::{Conversation, ConversationState, MentorAssignment};
    use mentorloop_types::error::GenerationError;
    use mentorloop_types::message::MessageStatus;
    use mentorloop_types::user::{User, UserRole};

    use crate::memory::{InMemoryDirectory, InMemoryFeedbackStore, InMemoryMessageStore};
    use crate::scripted::ScriptedProvider;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("mentorloop_core=debug,mentorloop_infra=debug")
            .with_test_writer()
            .try_init();
    }

    fn owner() -> User {
        User::new(Uuid::now_v7(), UserRole::NewHire, "Riley")
    }

    fn conversation_of(owner: &User) -> Conversation {
        Conversation {
            id: Uuid::now_v7(),
            owner_id: owner.id,
            title: "Onboarding".into(),
            state: ConversationState::Active,
            created_at: Utc::now(),
            last_active_at: Utc::now(),
        }
    }

    fn executor_with(
        provider: ScriptedProvider,
    ) -> TurnExecutor<InMemoryMessageStore, InMemoryFeedbackStore, ScriptedProvider, InMemoryDirectory>
    {
        TurnExecutor::new(
            InMemoryMessageStore::new(),
            InMemoryFeedbackStore::new(),
            provider,
            InMemoryDirectory::new(),
            Duration::from_secs(5),
        )
    }

    fn controller_for(user: &User, conv: &Conversation) -> TurnController {
        TurnController::new(user.clone(), conv.clone(), Vec::new(), 20)
    }

    #[tokio::test]
    async fn full_turn_persists_finalized_reply() {
        init_tracing();
        let user = owner();
        let conv = conversation_of(&user);
        let mut ctrl = controller_for(&user, &conv);
        let executor = executor_with(ScriptedProvider::completing(
            "test-model",
            &["Use ", "the ", "deploy ", "runbook."],
        ));

        ctrl.set_input("How do I deploy?");
        ctrl.send_message();
        executor
            .run_until_idle(&mut ctrl, &CancellationToken::new())
            .await;

        assert!(ctrl.last_error().is_none());
        assert!(!ctrl.is_sending());
        assert!(!ctrl.is_streaming());
        assert_eq!(ctrl.pending_effects(), 0);
        assert_eq!(ctrl.messages().len(), 2);

        let reply = &ctrl.messages()[1];
        assert_eq!(reply.status, Some(MessageStatus::Done));
        assert_eq!(reply.content, "Use the deploy runbook.");

        // The store holds the same authoritative text.
        let persisted = executor.messages.get(reply.id).unwrap();
        assert_eq!(persisted.status, Some(MessageStatus::Done));
        assert_eq!(persisted.content, "Use the deploy runbook.");
    }

    #[tokio::test]
    async fn stream_error_cancels_the_assistant_message() {
        init_tracing();
        let user = owner();
        let conv = conversation_of(&user);
        let mut ctrl = controller_for(&user, &conv);
        let executor = executor_with(ScriptedProvider::new(
            "test-model",
            vec![
                Ok(GenerationEvent::Delta(
                    mentorloop_types::message::MessageDelta {
                        text: "half an ans".into(),
                        seq_no: 1,
                    },
                )),
                Err(GenerationError::Interrupted("connection reset".into())),
            ],
        ));

        ctrl.set_input("question");
        ctrl.send_message();
        executor
            .run_until_idle(&mut ctrl, &CancellationToken::new())
            .await;

        let reply = &ctrl.messages()[1];
        assert_eq!(reply.status, Some(MessageStatus::Cancelled));
        assert_eq!(reply.content, "half an ans");
        assert_eq!(
            executor.messages.get(reply.id).unwrap().status,
            Some(MessageStatus::Cancelled)
        );
        // The queue fully drained despite the failure.
        assert_eq!(ctrl.pending_effects(), 0);
    }

    #[tokio::test]
    async fn stream_ending_without_completion_cancels() {
        init_tracing();
        let user = owner();
        let conv = conversation_of(&user);
        let mut ctrl = controller_for(&user, &conv);
        // Deltas but no Completed event: provider bug guard.
        let executor = executor_with(ScriptedProvider::new(
            "test-model",
            vec![Ok(GenerationEvent::Delta(
                mentorloop_types::message::MessageDelta {
                    text: "partial".into(),
                    seq_no: 1,
                },
            ))],
        ));

        ctrl.set_input("question");
        ctrl.send_message();
        executor
            .run_until_idle(&mut ctrl, &CancellationToken::new())
            .await;

        assert_eq!(ctrl.messages()[1].status, Some(MessageStatus::Cancelled));
    }

    #[tokio::test]
    async fn external_cancellation_aborts_the_turn() {
        init_tracing();
        let user = owner();
        let conv = conversation_of(&user);
        let mut ctrl = controller_for(&user, &conv);
        let executor = executor_with(ScriptedProvider::completing("test-model", &["never"]));

        let cancel = CancellationToken::new();
        cancel.cancel();

        ctrl.set_input("question");
        ctrl.send_message();
        executor.run_until_idle(&mut ctrl, &cancel).await;

        assert_eq!(ctrl.messages()[1].status, Some(MessageStatus::Cancelled));
    }

    struct StalledProvider;

    impl GenerationProvider for StalledProvider {
        fn model(&self) -> &str {
            "stalled"
        }

        fn stream(
            &self,
            _prompt: Prompt,
            _cancel: CancellationToken,
        ) -> Pin<Box<dyn Stream<Item = Result<GenerationEvent, GenerationError>> + Send + 'static>>
        {
            Box::pin(futures_util::stream::pending())
        }
    }

    #[tokio::test]
    async fn idle_timeout_is_an_implicit_cancellation() {
        init_tracing();
        let user = owner();
        let conv = conversation_of(&user);
        let mut ctrl = controller_for(&user, &conv);
        let executor = TurnExecutor::new(
            InMemoryMessageStore::new(),
            InMemoryFeedbackStore::new(),
            StalledProvider,
            InMemoryDirectory::new(),
            Duration::from_millis(20),
        );

        ctrl.set_input("question");
        ctrl.send_message();
        executor
            .run_until_idle(&mut ctrl, &CancellationToken::new())
            .await;

        assert_eq!(ctrl.messages()[1].status, Some(MessageStatus::Cancelled));
        assert_eq!(ctrl.pending_effects(), 0);
    }

    #[tokio::test]
    async fn persist_failure_surfaces_without_stalling() {
        init_tracing();
        let user = owner();
        let conv = conversation_of(&user);
        let mut ctrl = controller_for(&user, &conv);
        let executor = executor_with(ScriptedProvider::completing("test-model", &["unused"]));
        executor.messages.fail_next_call();

        ctrl.set_input("question");
        ctrl.send_message();
        executor
            .run_until_idle(&mut ctrl, &CancellationToken::new())
            .await;

        assert!(ctrl.last_error().unwrap().is_validation());
        assert!(!ctrl.is_sending());
        assert_eq!(ctrl.pending_effects(), 0);
        assert!(ctrl.messages().is_empty());
    }

    #[tokio::test]
    async fn feedback_round_trip_resolves_author_name() {
        init_tracing();
        let user = owner();
        let conv = conversation_of(&user);
        let mentor = User::new(Uuid::now_v7(), UserRole::Mentor, "Sam");
        let assignments = vec![MentorAssignment {
            mentor_id: mentor.id,
            newhire_id: user.id,
            revoked_at: None,
        }];

        let executor = executor_with(ScriptedProvider::completing("test-model", &["answer"]));
        executor.directory.insert(mentor.id, "Sam");

        // Owner runs the turn.
        let mut ctrl = controller_for(&user, &conv);
        let cancel = CancellationToken::new();
        ctrl.set_input("question");
        ctrl.send_message();
        executor.run_until_idle(&mut ctrl, &cancel).await;
        let reply_id = ctrl.messages()[1].id;

        // Mentor leaves feedback through their own session.
        let mut mentor_ctrl =
            TurnController::new(mentor.clone(), conv.clone(), assignments, 20);
        mentor_ctrl.notify_messages_listed(ctrl.messages().to_vec(), None);
        mentor_ctrl.request_create_feedback(reply_id, "Good, add the runbook link.");
        executor.run_until_idle(&mut mentor_ctrl, &cancel).await;

        let feedback = mentor_ctrl.feedback_for(reply_id).unwrap();
        assert_eq!(feedback.author_id, mentor.id);
        assert_eq!(mentor_ctrl.display_name(mentor.id), Some("Sam"));

        // A second feedback for the same message conflicts; the error is
        // normalized and the queue keeps draining.
        mentor_ctrl.request_create_feedback(reply_id, "duplicate");
        executor.run_until_idle(&mut mentor_ctrl, &cancel).await;
        assert!(mentor_ctrl.last_error().unwrap().is_validation());

        // Listing replaces the cached entry with the stored one.
        mentor_ctrl.request_feedback_for_message(reply_id, None);
        executor.run_until_idle(&mut mentor_ctrl, &cancel).await;
        assert_eq!(
            mentor_ctrl.feedback_for(reply_id).unwrap().content,
            "Good, add the runbook link."
        );
    }
}

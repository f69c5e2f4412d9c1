//! The turn controller: per-conversation session state and effect queue.
//!
//! One controller instance exists per conversation session, owned by a
//! single logical thread of control. Commands run the pure use-case layer
//! first; on success they enqueue effects, and the external executor feeds
//! outcomes back through the `notify_*` callbacks. Only one effect is ever
//! dispatched at a time: `next_effect` hands out the front of the queue and
//! refuses to hand out another until `acknowledge_effect` is called for it.
//! Every effect is acknowledged whether it succeeded or failed, so a single
//! failure never stalls future turns.

use std::collections::{HashMap, VecDeque};

use tracing::{debug, info, warn};
use uuid::Uuid;

use mentorloop_types::conversation::{Conversation, MentorAssignment};
use mentorloop_types::error::{PortError, UseCaseError};
use mentorloop_types::feedback::Feedback;
use mentorloop_types::message::{Message, MessageDelta, MessageStatus};
use mentorloop_types::user::User;

use crate::aggregator::DeltaAggregator;
use crate::turn::{Effect, EffectId};
use crate::usecase;

/// Defensive cap on the pending-effect queue. Under normal operation the
/// queue holds at most a handful of entries; hitting the cap indicates a
/// malfunctioning caller and further enqueues are refused.
const MAX_PENDING_EFFECTS: usize = 32;

/// Per-conversation turn controller.
pub struct TurnController {
    requester: User,
    conversation: Conversation,
    mentor_assignments: Vec<MentorAssignment>,
    /// How many prior messages to include when building a prompt.
    history_window: i64,

    messages: Vec<Message>,
    feedback_by_message: HashMap<Uuid, Feedback>,
    display_names: HashMap<Uuid, String>,

    queue: VecDeque<Effect>,
    in_flight: Option<EffectId>,

    input: String,
    last_error: Option<UseCaseError>,
    is_sending: bool,
    is_awaiting_assistant: bool,
    is_streaming: bool,
    active_assistant_message_id: Option<Uuid>,
    aggregator: DeltaAggregator,
}

impl TurnController {
    pub fn new(
        requester: User,
        conversation: Conversation,
        mentor_assignments: Vec<MentorAssignment>,
        history_window: i64,
    ) -> Self {
        Self {
            requester,
            conversation,
            mentor_assignments,
            history_window,
            messages: Vec::new(),
            feedback_by_message: HashMap::new(),
            display_names: HashMap::new(),
            queue: VecDeque::new(),
            in_flight: None,
            input: String::new(),
            last_error: None,
            is_sending: false,
            is_awaiting_assistant: false,
            is_streaming: false,
            active_assistant_message_id: None,
            aggregator: DeltaAggregator::new(),
        }
    }

    // --- Read accessors for the presentation layer ---

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn feedback_for(&self, message_id: Uuid) -> Option<&Feedback> {
        self.feedback_by_message.get(&message_id)
    }

    pub fn display_name(&self, user_id: Uuid) -> Option<&str> {
        self.display_names.get(&user_id).map(String::as_str)
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn last_error(&self) -> Option<&UseCaseError> {
        self.last_error.as_ref()
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    pub fn is_sending(&self) -> bool {
        self.is_sending
    }

    pub fn is_awaiting_assistant(&self) -> bool {
        self.is_awaiting_assistant
    }

    pub fn is_streaming(&self) -> bool {
        self.is_streaming
    }

    pub fn active_assistant_message_id(&self) -> Option<Uuid> {
        self.active_assistant_message_id
    }

    pub fn pending_effects(&self) -> usize {
        self.queue.len()
    }

    // --- Effect dispatch handshake ---

    /// Hand the executor the next effect to perform.
    ///
    /// Returns `None` while an effect is already in flight; the next effect
    /// is only dispatched after the current one is acknowledged.
    pub fn next_effect(&mut self) -> Option<Effect> {
        if self.in_flight.is_some() {
            return None;
        }
        let effect = self.queue.front().cloned()?;
        self.in_flight = Some(effect.id());
        debug!(effect_id = %effect.id(), kind = %effect.kind(), "effect dispatched");
        Some(effect)
    }

    /// Acknowledge the in-flight effect, removing it from the queue.
    ///
    /// Called for every dispatched effect regardless of outcome.
    pub fn acknowledge_effect(&mut self, id: EffectId) {
        if self.in_flight != Some(id) {
            warn!(effect_id = %id, "acknowledgment for an effect that is not in flight");
            return;
        }
        self.in_flight = None;
        if self.queue.front().map(Effect::id) == Some(id) {
            self.queue.pop_front();
        }
    }

    /// Push an effect, refusing when the queue is at capacity.
    ///
    /// A refusal only fails the operation being enqueued; callers roll back
    /// any state they set in anticipation so later operations still run.
    fn enqueue(&mut self, effect: Effect) -> bool {
        if self.queue.len() >= MAX_PENDING_EFFECTS {
            warn!(
                kind = %effect.kind(),
                pending = self.queue.len(),
                "effect queue at capacity, refusing enqueue"
            );
            self.last_error = Some(UseCaseError::validation(
                "Too many pending operations. Please retry.",
            ));
            return false;
        }
        self.queue.push_back(effect);
        true
    }

    // --- Sending a message (protocol steps 1-2) ---

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// Validate the current input and enqueue its persistence.
    pub fn send_message(&mut self) {
        if self.is_sending {
            self.last_error = Some(UseCaseError::validation(
                "A message is already being sent.",
            ));
            return;
        }
        let payload =
            match usecase::create_user_message(&self.requester, &self.conversation, &self.input) {
                Ok(payload) => payload,
                Err(err) => {
                    self.last_error = Some(err);
                    return;
                }
            };
        if !self.enqueue(Effect::PersistUserMessage {
            id: EffectId::new(),
            conversation_id: payload.conversation_id,
            author_id: payload.author_id,
            content: payload.content,
        }) {
            // Refused enqueue: the input stays editable and no send is
            // pending, so the next send_message can succeed.
            return;
        }
        self.input.clear();
        self.last_error = None;
        self.is_sending = true;
    }

    /// The user message was persisted; start the assistant half of the turn.
    pub fn notify_user_message_persisted(&mut self, saved: Message) {
        self.is_sending = false;
        let question = saved.content.clone();
        let saved_id = saved.id;
        self.upsert_message(saved);

        // History excludes the question itself.
        let history: Vec<Message> = self
            .messages
            .iter()
            .filter(|m| m.id != saved_id)
            .cloned()
            .collect();
        let prompt = match usecase::build_prompt_for_conversation(
            &self.requester,
            &self.conversation,
            &history,
            &question,
            self.history_window,
        ) {
            Ok(prompt) => prompt,
            Err(err) => {
                self.last_error = Some(err);
                return;
            }
        };
        let begin = match usecase::begin_assistant_message(&self.conversation, &self.requester) {
            Ok(begin) => begin,
            Err(err) => {
                self.last_error = Some(err);
                return;
            }
        };

        if !self.enqueue(Effect::BeginAssistantMessage {
            id: EffectId::new(),
            conversation_id: begin.conversation_id,
        }) {
            return;
        }
        if !self.enqueue(Effect::StreamAssistantResponse {
            id: EffectId::new(),
            prompt,
        }) {
            // The begin/stream pair is all or nothing.
            self.queue.pop_back();
            return;
        }
        self.is_awaiting_assistant = true;
        info!(conversation_id = %self.conversation.id, "turn started");
    }

    // --- Streaming (protocol steps 3-6) ---

    /// The assistant placeholder exists; deltas may now arrive for it.
    pub fn notify_assistant_message_created(&mut self, message: Message) {
        self.active_assistant_message_id = Some(message.id);
        self.aggregator.begin(message.id);
        self.is_awaiting_assistant = false;
        self.upsert_message(message);
    }

    /// Fold one streamed fragment into the active assistant message.
    ///
    /// Fragments arriving when no message is active (e.g. after a
    /// cancellation) are ignored; fragments with a stale sequence number
    /// are rejected and surface as the session error.
    pub fn notify_assistant_delta(&mut self, delta: MessageDelta) {
        let Some(active_id) = self.active_assistant_message_id else {
            debug!(seq_no = delta.seq_no, "delta for inactive message ignored");
            return;
        };
        let Some(message) = self.messages.iter().find(|m| m.id == active_id).cloned() else {
            warn!(message_id = %active_id, "active assistant message missing from state");
            return;
        };
        let last_seq = self.aggregator.last_seq_no(active_id);
        match usecase::append_assistant_delta(&message, &delta, last_seq) {
            Ok(updated) => {
                self.aggregator.record(active_id, delta.seq_no);
                self.is_streaming = true;
                self.upsert_message(updated);
            }
            Err(err) => {
                warn!(message_id = %active_id, seq_no = delta.seq_no, %err, "delta rejected");
                self.last_error = Some(err);
            }
        }
    }

    /// The stream ended normally; finalize with the authoritative text.
    pub fn notify_assistant_stream_completed(&mut self, final_text: &str) {
        let Some(active_id) = self.active_assistant_message_id else {
            debug!("stream completion with no active assistant message");
            return;
        };
        let Some(message) = self.messages.iter().find(|m| m.id == active_id).cloned() else {
            warn!(message_id = %active_id, "active assistant message missing from state");
            return;
        };
        match usecase::finalize_assistant_message(&message, final_text) {
            Ok(updated) => {
                let final_text = updated.content.clone();
                self.upsert_message(updated);
                self.enqueue(Effect::FinalizeAssistantMessage {
                    id: EffectId::new(),
                    message_id: active_id,
                    final_text,
                });
                self.finish_stream(active_id);
                info!(message_id = %active_id, "assistant message finalized");
            }
            Err(err) => {
                // A completion that cannot be finalized (e.g. blank final
                // text) must not leave the message stuck in Partial.
                warn!(message_id = %active_id, %err, "finalize rejected, cancelling instead");
                self.last_error = Some(err);
                self.cancel_active(active_id);
            }
        }
    }

    /// The stream failed or was aborted; transition to cancelled.
    pub fn notify_assistant_stream_cancelled(&mut self) {
        let Some(active_id) = self.active_assistant_message_id else {
            debug!("stream cancellation with no active assistant message");
            return;
        };
        self.cancel_active(active_id);
        info!(message_id = %active_id, "assistant message cancelled");
    }

    fn cancel_active(&mut self, active_id: Uuid) {
        if let Some(message) = self.messages.iter().find(|m| m.id == active_id).cloned() {
            match usecase::cancel_assistant_message(&message) {
                Ok(updated) => {
                    self.upsert_message(updated);
                    self.enqueue(Effect::CancelAssistantMessage {
                        id: EffectId::new(),
                        message_id: active_id,
                    });
                }
                Err(err) => {
                    debug!(message_id = %active_id, %err, "cancel skipped");
                }
            }
        }
        self.finish_stream(active_id);
    }

    fn finish_stream(&mut self, message_id: Uuid) {
        self.is_streaming = false;
        self.is_awaiting_assistant = false;
        self.active_assistant_message_id = None;
        self.aggregator.clear(message_id);
    }

    // --- Failure reporting (protocol step 7) ---

    /// Normalize and store an executor-side failure.
    ///
    /// The in-flight effect is still acknowledged separately; storing the
    /// error never stalls the queue. When the failure leaves no active
    /// assistant message (the begin call failed), any queued stream effect
    /// would only produce deltas with nowhere to go, so it is purged.
    pub fn report_external_failure(&mut self, err: PortError) {
        warn!(%err, "external effect failed");
        self.last_error = Some(err.into());
        self.is_sending = false;
        if self.active_assistant_message_id.is_none() {
            self.is_awaiting_assistant = false;
            let in_flight = self.in_flight;
            self.queue.retain(|e| {
                Some(e.id()) == in_flight
                    || !matches!(e, Effect::StreamAssistantResponse { .. })
            });
        }
    }

    // --- Feedback side-flow ---

    /// Validate and enqueue a feedback listing for a message.
    pub fn request_feedback_for_message(&mut self, message_id: Uuid, limit: Option<i64>) {
        let Some(target) = self.messages.iter().find(|m| m.id == message_id).cloned() else {
            self.last_error = Some(UseCaseError::not_found("The message was not found."));
            return;
        };
        match usecase::list_message_feedbacks(
            &self.requester,
            &self.conversation,
            &target,
            &self.mentor_assignments,
            limit,
        ) {
            Ok(query) => {
                self.last_error = None;
                self.enqueue(Effect::ListFeedbacks {
                    id: EffectId::new(),
                    message_id,
                    limit: query.limit,
                });
            }
            Err(err) => self.last_error = Some(err),
        }
    }

    /// Validate and enqueue creation of a feedback entry.
    pub fn request_create_feedback(&mut self, message_id: Uuid, content: &str) {
        let Some(target) = self.messages.iter().find(|m| m.id == message_id).cloned() else {
            self.last_error = Some(UseCaseError::not_found("The message was not found."));
            return;
        };
        match usecase::validate_feedback_rules(
            &self.requester,
            &self.conversation,
            &target,
            content,
            &self.mentor_assignments,
        ) {
            Ok(payload) => {
                self.last_error = None;
                self.enqueue(Effect::CreateFeedback {
                    id: EffectId::new(),
                    target_message_id: payload.target_message_id,
                    author_id: payload.author_id,
                    author_role: payload.author_role,
                    content: payload.content,
                    visibility: payload.visibility,
                });
            }
            Err(err) => self.last_error = Some(err),
        }
    }

    /// Replace (never append to) the feedback entry for a message.
    pub fn notify_feedbacks_listed(&mut self, message_id: Uuid, items: Vec<Feedback>) {
        if items.len() > 1 {
            warn!(
                message_id = %message_id,
                count = items.len(),
                "more than one feedback entry for a message, keeping the first"
            );
        }
        match items.into_iter().next() {
            Some(feedback) => {
                self.feedback_by_message.insert(message_id, feedback);
            }
            None => {
                self.feedback_by_message.remove(&message_id);
            }
        }
    }

    pub fn notify_feedback_created(&mut self, feedback: Feedback) {
        self.feedback_by_message
            .insert(feedback.target_message_id, feedback);
    }

    /// Cache a resolved display name for presentation.
    pub fn record_display_name(&mut self, user_id: Uuid, name: Option<String>) {
        if let Some(name) = name {
            self.display_names.insert(user_id, name);
        }
    }

    /// Replace a message listing wholesale (list-messages outcome).
    ///
    /// When the store reports a `last_seq_no` for a still-partial assistant
    /// message, delta tracking resumes from there instead of seq 0.
    pub fn notify_messages_listed(&mut self, mut items: Vec<Message>, last_seq_no: Option<u64>) {
        items.sort_by(|a, b| a.cmp_by_order(b));
        self.messages = items;
        if let Some(seq) = last_seq_no {
            let partial = self
                .messages
                .iter()
                .rfind(|m| m.status == Some(MessageStatus::Partial));
            if let Some(partial) = partial {
                self.active_assistant_message_id = Some(partial.id);
                self.aggregator.begin(partial.id);
                self.aggregator.record(partial.id, seq);
            }
        }
    }

    /// Validate and enqueue a listing of the conversation's messages.
    pub fn request_messages(&mut self, limit: Option<i64>) {
        match usecase::list_conversation_messages(
            &self.requester,
            &self.conversation,
            &self.mentor_assignments,
            limit,
        ) {
            Ok(query) => {
                self.last_error = None;
                self.enqueue(Effect::ListMessages {
                    id: EffectId::new(),
                    conversation_id: self.conversation.id,
                    limit: query.limit,
                });
            }
            Err(err) => self.last_error = Some(err),
        }
    }

    fn upsert_message(&mut self, message: Message) {
        if let Some(existing) = self.messages.iter_mut().find(|m| m.id == message.id) {
            *existing = message;
        } else {
            self.messages.push(message);
            self.messages.sort_by(|a, b| a.cmp_by_order(b));
        }
    }
}

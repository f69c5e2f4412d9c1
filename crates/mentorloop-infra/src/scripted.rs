//! Scripted generation provider.
//!
//! Emits a fixed sequence of events for whatever prompt it receives,
//! honoring the cancellation token between fragments. Used by tests and
//! local development; a real provider would speak to an LLM API behind the
//! same trait.

use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Mutex;

use async_stream::stream;
use futures_util::Stream;
use tokio_util::sync::CancellationToken;

use mentorloop_core::ports::{GenerationEvent, GenerationProvider};
use mentorloop_types::error::GenerationError;
use mentorloop_types::message::MessageDelta;
use mentorloop_types::prompt::Prompt;

/// Generation provider that replays a pre-loaded script.
pub struct ScriptedProvider {
    model: String,
    script: Mutex<VecDeque<Result<GenerationEvent, GenerationError>>>,
}

impl ScriptedProvider {
    pub fn new(
        model: impl Into<String>,
        script: Vec<Result<GenerationEvent, GenerationError>>,
    ) -> Self {
        Self {
            model: model.into(),
            script: Mutex::new(script.into()),
        }
    }

    /// Script that streams the given fragments in order, then completes
    /// with their concatenation.
    pub fn completing(model: impl Into<String>, fragments: &[&str]) -> Self {
        let mut script: Vec<Result<GenerationEvent, GenerationError>> = fragments
            .iter()
            .enumerate()
            .map(|(i, text)| {
                Ok(GenerationEvent::Delta(MessageDelta {
                    text: (*text).to_string(),
                    seq_no: (i + 1) as u64,
                }))
            })
            .collect();
        script.push(Ok(GenerationEvent::Completed {
            text: fragments.concat(),
        }));
        Self::new(model, script)
    }
}

impl GenerationProvider for ScriptedProvider {
    fn model(&self) -> &str {
        &self.model
    }

    fn stream(
        &self,
        _prompt: Prompt,
        cancel: CancellationToken,
    ) -> Pin<Box<dyn Stream<Item = Result<GenerationEvent, GenerationError>> + Send + 'static>>
    {
        let events: Vec<Result<GenerationEvent, GenerationError>> = self
            .script
            .lock()
            .map(|mut script| script.drain(..).collect())
            .unwrap_or_default();

        Box::pin(stream! {
            for event in events {
                if cancel.is_cancelled() {
                    yield Err(GenerationError::Cancelled);
                    return;
                }
                yield event;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    fn empty_prompt() -> Prompt {
        Prompt::new(Vec::new())
    }

    #[tokio::test]
    async fn completing_script_ends_with_full_text() {
        let provider = ScriptedProvider::completing("test-model", &["Hel", "lo"]);
        let events: Vec<_> = provider
            .stream(empty_prompt(), CancellationToken::new())
            .collect()
            .await;
        assert_eq!(events.len(), 3);
        match events.last().unwrap() {
            Ok(GenerationEvent::Completed { text }) => assert_eq!(text, "Hello"),
            other => panic!("unexpected final event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn cancelled_token_short_circuits_the_script() {
        let provider = ScriptedProvider::completing("test-model", &["a", "b", "c"]);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let events: Vec<_> = provider.stream(empty_prompt(), cancel).collect().await;
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Err(GenerationError::Cancelled)));
    }

    #[tokio::test]
    async fn script_is_consumed_once() {
        let provider = ScriptedProvider::completing("test-model", &["x"]);
        let first: Vec<_> = provider
            .stream(empty_prompt(), CancellationToken::new())
            .collect()
            .await;
        assert_eq!(first.len(), 2);

        let second: Vec<_> = provider
            .stream(empty_prompt(), CancellationToken::new())
            .collect()
            .await;
        assert!(second.is_empty());
    }
}

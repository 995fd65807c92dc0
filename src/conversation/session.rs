//! Model dialogue context for one conversation

use crate::db::{Speaker, Turn};
use crate::llm::{LlmError, LlmMessage, LlmRequest, LlmService};

/// The dialogue history sent with every model call.
///
/// Owned by whoever runs the conversation and dropped when it ends; a failed
/// call leaves the history untouched so roles keep alternating.
#[derive(Debug, Clone, Default)]
pub struct ChatSession {
    history: Vec<LlmMessage>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild context from a persisted log.
    ///
    /// Only complete user/bot pairs are kept; `skip` names a turn (usually the
    /// pending question) that must not be replayed. `frame` turns a stored
    /// question back into the prompt that was originally sent for it.
    pub fn resume(turns: &[Turn], skip: Option<i64>, frame: impl Fn(&str) -> String) -> Self {
        let mut history = Vec::new();
        let mut question: Option<&Turn> = None;

        for turn in turns.iter().filter(|t| Some(t.id) != skip) {
            match turn.speaker {
                Speaker::User => question = Some(turn),
                Speaker::Bot => {
                    if let Some(q) = question.take() {
                        history.push(LlmMessage::user(frame(&q.text)));
                        history.push(LlmMessage::model(turn.text.clone()));
                    }
                }
            }
        }

        Self { history }
    }

    pub fn history(&self) -> &[LlmMessage] {
        &self.history
    }

    /// Send `prompt` with the accumulated context and record the exchange.
    pub async fn send(&mut self, llm: &dyn LlmService, prompt: &str) -> Result<String, LlmError> {
        let mut messages = self.history.clone();
        messages.push(LlmMessage::user(prompt));

        let request = LlmRequest {
            messages,
            ..LlmRequest::default()
        };
        let response = llm.complete(&request).await?;

        self.history.push(LlmMessage::user(prompt));
        self.history.push(LlmMessage::model(response.text.clone()));
        Ok(response.text)
    }
}

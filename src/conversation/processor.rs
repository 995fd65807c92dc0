//! Voice assistant turn processing
//!
//! Questions are captured into the log first, then answered. The persisted
//! [`ReplyStatus`] says whether an answer is still owed, so a question captured
//! just before a crash is answered on the next `process_pending` call.

use super::{ChatSession, ConversationError, SessionStatus};
use crate::db::{Database, ReplyStatus, Turn};
use crate::llm::LlmService;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Prepended to every voice assistant question.
pub const PERSONA_INSTRUCTION: &str =
    "In this chat, respond as if you're explaining things to a five-year-old child.";

/// Returned instead of a reply when the question is blank.
pub const EMPTY_QUESTION_REPLY: &str = "Please ask something.";

/// Prompt sent to the model for a voice assistant question
fn persona_prompt(question: &str) -> String {
    format!("{PERSONA_INSTRUCTION} {question}")
}

/// Result of asking a question
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Blank question; nothing was recorded.
    Prompt,
    Answered(Turn),
}

impl Reply {
    pub fn text(&self) -> &str {
        match self {
            Reply::Prompt => EMPTY_QUESTION_REPLY,
            Reply::Answered(turn) => &turn.text,
        }
    }
}

/// Point-in-time view of the conversation
#[derive(Debug, Clone, Serialize)]
pub struct ConversationSnapshot {
    pub turns: Vec<Turn>,
    pub status: SessionStatus,
    pub reply: ReplyStatus,
}

struct SessionInner {
    status: SessionStatus,
    /// In-memory mirror of the persisted log
    turns: Vec<Turn>,
    /// Dropped on reset
    chat: Option<ChatSession>,
}

/// Runs the voice assistant conversation.
///
/// Every operation holds the session lock for its whole duration, model call
/// included, so interactions are handled one at a time.
pub struct TurnProcessor {
    db: Database,
    llm: Arc<dyn LlmService>,
    inner: Mutex<SessionInner>,
}

impl TurnProcessor {
    /// Load the persisted log and resume an active session.
    pub fn new(db: Database, llm: Arc<dyn LlmService>) -> Result<Self, ConversationError> {
        db.repair_reply_status()?;
        let turns = db.load_turns()?;
        let reply = db.reply_status()?;

        let pending_id = match &reply {
            ReplyStatus::AwaitingReply { turn_id, .. } => Some(*turn_id),
            ReplyStatus::Idle => None,
        };
        let chat = ChatSession::resume(&turns, pending_id, persona_prompt);

        tracing::info!(
            turns = turns.len(),
            awaiting_reply = reply.is_awaiting(),
            "Conversation log loaded"
        );

        Ok(Self {
            db,
            llm,
            inner: Mutex::new(SessionInner {
                status: SessionStatus::Active,
                turns,
                chat: Some(chat),
            }),
        })
    }

    pub async fn snapshot(&self) -> Result<ConversationSnapshot, ConversationError> {
        let inner = self.inner.lock().await;
        Ok(ConversationSnapshot {
            turns: inner.turns.clone(),
            status: inner.status,
            reply: self.db.reply_status()?,
        })
    }

    /// Record a user question and mark it as awaiting a reply.
    ///
    /// Returns `None` for blank text. A question captured while another is
    /// still pending supersedes it; the older turn stays in the log unanswered.
    pub async fn capture(&self, text: &str) -> Result<Option<Turn>, ConversationError> {
        let mut inner = self.inner.lock().await;
        Self::ensure_active(&inner)?;
        self.capture_locked(&mut inner, text)
    }

    /// Answer the pending question, if there is one.
    pub async fn process_pending(&self) -> Result<Option<Turn>, ConversationError> {
        let mut inner = self.inner.lock().await;
        Self::ensure_active(&inner)?;
        self.process_locked(&mut inner).await
    }

    /// Capture and answer in one interaction.
    pub async fn ask(&self, text: &str) -> Result<Reply, ConversationError> {
        let mut inner = self.inner.lock().await;
        Self::ensure_active(&inner)?;

        if self.capture_locked(&mut inner, text)?.is_none() {
            return Ok(Reply::Prompt);
        }
        match self.process_locked(&mut inner).await? {
            Some(turn) => Ok(Reply::Answered(turn)),
            None => Ok(Reply::Prompt),
        }
    }

    /// Clear the log, drop the dialogue context and end the session.
    ///
    /// The session stays ended until the process restarts.
    pub async fn reset(&self) -> Result<(), ConversationError> {
        let mut inner = self.inner.lock().await;
        self.db.reset_log()?;

        let cleared = inner.turns.len();
        inner.turns.clear();
        inner.chat = None;
        inner.status = SessionStatus::Ended;

        tracing::info!(cleared_turns = cleared, "Conversation reset; session ended");
        Ok(())
    }

    fn ensure_active(inner: &SessionInner) -> Result<(), ConversationError> {
        match inner.status {
            SessionStatus::Active => Ok(()),
            SessionStatus::Ended => Err(ConversationError::SessionEnded),
        }
    }

    fn capture_locked(
        &self,
        inner: &mut SessionInner,
        text: &str,
    ) -> Result<Option<Turn>, ConversationError> {
        let question = text.trim();
        if question.is_empty() {
            return Ok(None);
        }

        if let ReplyStatus::AwaitingReply { turn_id, .. } = self.db.reply_status()? {
            tracing::warn!(
                superseded_turn = turn_id,
                "New question captured before the previous one was answered"
            );
        }

        let turn = self.db.record_question(question)?;
        tracing::info!(turn_id = turn.id, "Question captured");
        inner.turns.push(turn.clone());
        Ok(Some(turn))
    }

    async fn process_locked(
        &self,
        inner: &mut SessionInner,
    ) -> Result<Option<Turn>, ConversationError> {
        let ReplyStatus::AwaitingReply { turn_id, question } = self.db.reply_status()? else {
            return Ok(None);
        };

        let prompt = persona_prompt(&question);
        let chat = inner.chat.get_or_insert_with(ChatSession::new);
        let answer = chat.send(self.llm.as_ref(), &prompt).await?;

        let turn = self.db.record_reply(turn_id, &answer)?;
        tracing::info!(question_id = turn_id, turn_id = turn.id, "Reply recorded");
        inner.turns.push(turn.clone());
        Ok(Some(turn))
    }
}

//! Voice assistant conversation: persisted turn log, reply processing, reset

mod processor;
mod session;

pub use processor::{ConversationSnapshot, Reply, TurnProcessor};
pub use session::ChatSession;

use crate::db::DbError;
use crate::llm::LlmError;
use serde::Serialize;
use thiserror::Error;

/// Lifetime state of the conversation within this process.
///
/// `Ended` is terminal; only a restart returns to `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Ended,
}

#[derive(Error, Debug)]
pub enum ConversationError {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error("Conversation has ended. Restart the assistant to start a new conversation.")]
    SessionEnded,
}

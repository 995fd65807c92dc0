//! Database schema and types

use serde::{Deserialize, Serialize};
use std::fmt;

/// SQL schema for initialization
pub const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS chat (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    speaker TEXT,
    message TEXT
);

CREATE TABLE IF NOT EXISTS chat_state (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    pending_turn_id INTEGER
);

INSERT OR IGNORE INTO chat_state (id, pending_turn_id) VALUES (1, NULL);
";

/// Who said a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Speaker {
    User,
    Bot,
}

impl Speaker {
    /// Label stored in the `speaker` column
    pub fn as_str(self) -> &'static str {
        match self {
            Speaker::User => "You",
            Speaker::Bot => "Bot",
        }
    }

    /// Anything that isn't the user label is treated as the bot.
    pub fn from_label(label: &str) -> Self {
        match label {
            "You" | "user" | "User" => Speaker::User,
            _ => Speaker::Bot,
        }
    }
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded utterance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub id: i64,
    pub speaker: Speaker,
    pub text: String,
}

/// Whether a captured question is still waiting for its reply.
///
/// Persisted in `chat_state` so the answer can be produced after a restart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReplyStatus {
    #[default]
    Idle,
    AwaitingReply {
        turn_id: i64,
        question: String,
    },
}

impl ReplyStatus {
    pub fn is_awaiting(&self) -> bool {
        matches!(self, ReplyStatus::AwaitingReply { .. })
    }
}

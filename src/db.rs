//! Database module for the learning server
//!
//! Persists the voice assistant's conversation log and its reply status.

mod schema;

pub use schema::*;

use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type DbResult<T> = Result<T, DbError>;

/// Thread-safe database handle
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // A panic mid-statement leaves nothing half-applied: every write is its own
        // statement or transaction.
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn run_migrations(&self) -> DbResult<()> {
        let conn = self.conn();
        conn.execute_batch(schema::SCHEMA)?;
        Ok(())
    }

    // ==================== Log Operations ====================

    /// Append a turn without touching the reply status. Committed before returning.
    ///
    /// The server appends through `record_question` and `record_reply`, which
    /// share `insert_turn` with this.
    #[cfg(test)]
    pub fn append_turn(&self, speaker: Speaker, text: &str) -> DbResult<Turn> {
        let conn = self.conn();
        Ok(insert_turn(&conn, speaker, text)?)
    }

    /// Load every turn in insertion order
    pub fn load_turns(&self) -> DbResult<Vec<Turn>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT id, speaker, message FROM chat ORDER BY id ASC")?;

        let rows = stmt.query_map([], parse_turn_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    /// Delete every turn and clear the reply status
    pub fn reset_log(&self) -> DbResult<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM chat", [])?;
        tx.execute("UPDATE chat_state SET pending_turn_id = NULL WHERE id = 1", [])?;
        tx.commit()?;
        Ok(())
    }

    // ==================== Reply Status ====================

    /// Record a user question and mark it as awaiting a reply, atomically.
    pub fn record_question(&self, text: &str) -> DbResult<Turn> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let turn = insert_turn(&tx, Speaker::User, text)?;
        tx.execute(
            "UPDATE chat_state SET pending_turn_id = ?1 WHERE id = 1",
            params![turn.id],
        )?;
        tx.commit()?;
        Ok(turn)
    }

    /// Record the reply to `question_id` and return to idle, atomically.
    ///
    /// The pending pointer is only cleared if it still names `question_id`.
    pub fn record_reply(&self, question_id: i64, text: &str) -> DbResult<Turn> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let turn = insert_turn(&tx, Speaker::Bot, text)?;
        tx.execute(
            "UPDATE chat_state SET pending_turn_id = NULL WHERE id = 1 AND pending_turn_id = ?1",
            params![question_id],
        )?;
        tx.commit()?;
        Ok(turn)
    }

    /// Current reply status
    pub fn reply_status(&self) -> DbResult<ReplyStatus> {
        let conn = self.conn();
        let pending: Option<(i64, Option<String>)> = conn
            .query_row(
                "SELECT c.id, c.message FROM chat_state s JOIN chat c ON c.id = s.pending_turn_id
                 WHERE s.id = 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        Ok(match pending {
            Some((turn_id, question)) => ReplyStatus::AwaitingReply {
                turn_id,
                question: question.unwrap_or_default(),
            },
            None => ReplyStatus::Idle,
        })
    }

    /// Clear a pending pointer that no longer names a user turn.
    ///
    /// Run once at startup. Returns true if anything was repaired.
    pub fn repair_reply_status(&self) -> DbResult<bool> {
        let conn = self.conn();
        let repaired = conn.execute(
            "UPDATE chat_state SET pending_turn_id = NULL
             WHERE id = 1 AND pending_turn_id IS NOT NULL
               AND pending_turn_id NOT IN (SELECT id FROM chat WHERE speaker = ?1)",
            params![Speaker::User.as_str()],
        )?;
        if repaired > 0 {
            tracing::warn!("Cleared dangling pending reply pointer");
        }
        Ok(repaired > 0)
    }
}

fn insert_turn(conn: &Connection, speaker: Speaker, text: &str) -> rusqlite::Result<Turn> {
    conn.execute(
        "INSERT INTO chat (speaker, message) VALUES (?1, ?2)",
        params![speaker.as_str(), text],
    )?;
    Ok(Turn {
        id: conn.last_insert_rowid(),
        speaker,
        text: text.to_string(),
    })
}

/// Parse a turn row from the database
fn parse_turn_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Turn> {
    let speaker: Option<String> = row.get(1)?;
    let text: Option<String> = row.get(2)?;
    Ok(Turn {
        id: row.get(0)?,
        speaker: Speaker::from_label(speaker.as_deref().unwrap_or_default()),
        text: text.unwrap_or_default(),
    })
}

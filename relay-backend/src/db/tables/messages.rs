//! Message log operations

use chrono::Utc;
use rusqlite::Result as SqliteResult;
use std::str::FromStr;

use crate::models::{Direction, MessageRecord, Platform};
use super::super::Database;

impl Database {
    /// Append one message to the log with a server-assigned timestamp
    pub fn insert_message(
        &self,
        platform: Platform,
        chat_id: &str,
        sender_id: &str,
        text: &str,
        direction: Direction,
    ) -> SqliteResult<MessageRecord> {
        let conn = self.lock();
        let timestamp = Utc::now().timestamp_millis();

        conn.execute(
            "INSERT INTO messages (platform, chat_id, sender_id, text, direction, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                platform.as_ref(),
                chat_id,
                sender_id,
                text,
                direction.as_ref(),
                timestamp
            ],
        )?;

        Ok(MessageRecord {
            id: conn.last_insert_rowid(),
            platform,
            chat_id: chat_id.to_string(),
            sender_id: sender_id.to_string(),
            text: text.to_string(),
            direction,
            timestamp,
        })
    }

    /// The most recent `limit` messages, oldest first
    pub fn list_recent_messages(&self, limit: usize) -> SqliteResult<Vec<MessageRecord>> {
        let conn = self.lock();

        let mut stmt = conn.prepare(
            "SELECT id, platform, chat_id, sender_id, text, direction, timestamp
             FROM messages ORDER BY id DESC LIMIT ?1",
        )?;

        let mut messages: Vec<MessageRecord> = stmt
            .query_map([limit as i64], |row| {
                let platform: String = row.get(1)?;
                let direction: String = row.get(5)?;
                Ok((
                    row.get::<_, i64>(0)?,
                    platform,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    direction,
                    row.get::<_, i64>(6)?,
                ))
            })?
            .filter_map(|r| r.ok())
            .filter_map(|(id, platform, chat_id, sender_id, text, direction, timestamp)| {
                // Rows written by other tools with unknown enums are skipped
                let platform = Platform::from_str(&platform).ok()?;
                let direction = Direction::from_str(&direction).ok()?;
                Some(MessageRecord {
                    id,
                    platform,
                    chat_id,
                    sender_id,
                    text,
                    direction,
                    timestamp,
                })
            })
            .collect();

        messages.reverse();
        Ok(messages)
    }

    pub fn count_messages(&self) -> SqliteResult<i64> {
        let conn = self.lock();
        conn.query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))
    }
}

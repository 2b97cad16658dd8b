//! SQLite database - schema definitions and connection management
//!
//! This file contains:
//! - Database struct definition
//! - Connection management (new, init)
//! - Schema creation
//!
//! Table operations live in the tables/ subdirectory.

use rusqlite::{Connection, Result as SqliteResult};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Main database wrapper; one connection shared behind a Mutex
pub struct Database {
    pub(crate) conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) the database file and initialize schema.
    /// `:memory:` opens a private in-memory database.
    pub fn new(database_url: &str) -> SqliteResult<Self> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = Path::new(database_url).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).ok();
            }
        }

        let conn = Connection::open(database_url)?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.init()?;
        Ok(db)
    }

    /// Lock the connection. A poisoned lock is recovered since every
    /// statement is independent and leaves no partial state behind.
    pub(crate) fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn init(&self) -> SqliteResult<()> {
        let conn = self.lock();

        // Connected Messenger page (single slot)
        conn.execute(
            "CREATE TABLE IF NOT EXISTS pages (
                slot INTEGER PRIMARY KEY CHECK (slot = 1),
                page_id TEXT UNIQUE NOT NULL,
                page_name TEXT NOT NULL DEFAULT '',
                page_access_token TEXT NOT NULL,
                subscribed INTEGER NOT NULL DEFAULT 0,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        // Connected WhatsApp phone number (single slot)
        conn.execute(
            "CREATE TABLE IF NOT EXISTS whatsapp (
                slot INTEGER PRIMARY KEY CHECK (slot = 1),
                phone_number_id TEXT UNIQUE NOT NULL,
                token TEXT NOT NULL,
                display_phone_number TEXT,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        // Message log (append-only)
        conn.execute(
            "CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                platform TEXT NOT NULL,
                chat_id TEXT NOT NULL,
                sender_id TEXT NOT NULL,
                text TEXT NOT NULL,
                direction TEXT NOT NULL,
                timestamp INTEGER NOT NULL
            )",
            [],
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_creates_parent_directory_and_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("relay.sqlite");

        let db = Database::new(path.to_str().unwrap()).unwrap();
        assert!(path.exists());

        let conn = db.lock();
        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN ('pages', 'whatsapp', 'messages')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 3);
    }

    #[test]
    fn test_reopen_keeps_existing_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relay.sqlite");
        let path = path.to_str().unwrap();

        {
            let db = Database::new(path).unwrap();
            db.upsert_whatsapp_credential("P1", "tok", None).unwrap();
        }

        let db = Database::new(path).unwrap();
        let wa = db.get_whatsapp_credential().unwrap().unwrap();
        assert_eq!(wa.phone_number_id, "P1");
    }
}

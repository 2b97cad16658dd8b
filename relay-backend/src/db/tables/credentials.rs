//! Page and WhatsApp credential operations
//!
//! Both tables hold a single slot: writing a credential replaces whatever was
//! there before, so lookups never need to pick between rows.

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, Result as SqliteResult};

use crate::models::{PageCredential, WhatsappCredential};
use super::super::Database;

const SLOT: i64 = 1;

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

impl Database {
    // ============================================
    // Messenger page
    // ============================================

    /// Store the connected page, replacing any previous one
    pub fn upsert_page_credential(
        &self,
        page_id: &str,
        page_name: &str,
        access_token: &str,
        subscribed: bool,
    ) -> SqliteResult<PageCredential> {
        let conn = self.lock();
        let now = Utc::now();

        conn.execute(
            "INSERT OR REPLACE INTO pages (slot, page_id, page_name, page_access_token, subscribed, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![SLOT, page_id, page_name, access_token, subscribed as i64, now.to_rfc3339()],
        )?;

        Ok(PageCredential {
            page_id: page_id.to_string(),
            page_name: page_name.to_string(),
            access_token: access_token.to_string(),
            subscribed,
            updated_at: now,
        })
    }

    /// Record whether the page is subscribed to webhook fields.
    /// Returns false if the page is not the connected one.
    pub fn set_page_subscribed(&self, page_id: &str, subscribed: bool) -> SqliteResult<bool> {
        let conn = self.lock();
        let rows_affected = conn.execute(
            "UPDATE pages SET subscribed = ?1, updated_at = ?2 WHERE page_id = ?3",
            rusqlite::params![subscribed as i64, Utc::now().to_rfc3339(), page_id],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get the connected page, if any
    pub fn get_page_credential(&self) -> SqliteResult<Option<PageCredential>> {
        let conn = self.lock();

        conn.query_row(
            "SELECT page_id, page_name, page_access_token, subscribed, updated_at FROM pages WHERE slot = ?1",
            [SLOT],
            |row| {
                let subscribed: i64 = row.get(3)?;
                let updated_at: String = row.get(4)?;
                Ok(PageCredential {
                    page_id: row.get(0)?,
                    page_name: row.get(1)?,
                    access_token: row.get(2)?,
                    subscribed: subscribed != 0,
                    updated_at: parse_timestamp(&updated_at),
                })
            },
        )
        .optional()
    }

    // ============================================
    // WhatsApp phone number
    // ============================================

    /// Store the WhatsApp phone number credential, replacing any previous one
    pub fn upsert_whatsapp_credential(
        &self,
        phone_number_id: &str,
        access_token: &str,
        display_phone_number: Option<&str>,
    ) -> SqliteResult<WhatsappCredential> {
        let conn = self.lock();
        let now = Utc::now();

        conn.execute(
            "INSERT OR REPLACE INTO whatsapp (slot, phone_number_id, token, display_phone_number, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![SLOT, phone_number_id, access_token, display_phone_number, now.to_rfc3339()],
        )?;

        Ok(WhatsappCredential {
            phone_number_id: phone_number_id.to_string(),
            access_token: access_token.to_string(),
            display_phone_number: display_phone_number.map(str::to_string),
            updated_at: now,
        })
    }

    /// Get the connected WhatsApp credential, if any
    pub fn get_whatsapp_credential(&self) -> SqliteResult<Option<WhatsappCredential>> {
        let conn = self.lock();

        conn.query_row(
            "SELECT phone_number_id, token, display_phone_number, updated_at FROM whatsapp WHERE slot = ?1",
            [SLOT],
            |row| {
                let updated_at: String = row.get(3)?;
                Ok(WhatsappCredential {
                    phone_number_id: row.get(0)?,
                    access_token: row.get(1)?,
                    display_phone_number: row.get(2)?,
                    updated_at: parse_timestamp(&updated_at),
                })
            },
        )
        .optional()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Database {
        Database::new(":memory:").unwrap()
    }

    fn count(db: &Database, table: &str) -> i64 {
        db.lock()
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_empty_store_has_no_credentials() {
        let db = test_db();
        assert!(db.get_page_credential().unwrap().is_none());
        assert!(db.get_whatsapp_credential().unwrap().is_none());
    }

    #[test]
    fn test_page_upsert_same_key_keeps_latest_token() {
        let db = test_db();
        db.upsert_page_credential("PAGE1", "My Page", "token-a", true).unwrap();
        db.upsert_page_credential("PAGE1", "My Page", "token-b", true).unwrap();

        assert_eq!(count(&db, "pages"), 1);
        let page = db.get_page_credential().unwrap().unwrap();
        assert_eq!(page.page_id, "PAGE1");
        assert_eq!(page.access_token, "token-b");
        assert!(page.subscribed);
    }

    #[test]
    fn test_page_upsert_new_key_replaces_slot() {
        let db = test_db();
        db.upsert_page_credential("PAGE1", "First", "token-a", false).unwrap();
        db.upsert_page_credential("PAGE2", "Second", "token-b", false).unwrap();

        assert_eq!(count(&db, "pages"), 1);
        let page = db.get_page_credential().unwrap().unwrap();
        assert_eq!(page.page_id, "PAGE2");
        assert_eq!(page.page_name, "Second");
    }

    #[test]
    fn test_set_page_subscribed() {
        let db = test_db();
        db.upsert_page_credential("PAGE1", "My Page", "tok", false).unwrap();

        assert!(db.set_page_subscribed("PAGE1", true).unwrap());
        assert!(db.get_page_credential().unwrap().unwrap().subscribed);
        assert!(!db.set_page_subscribed("OTHER", true).unwrap());
    }

    #[test]
    fn test_whatsapp_upsert_same_key_keeps_latest_token() {
        let db = test_db();
        db.upsert_whatsapp_credential("P1", "token-a", Some("+1 555 0100")).unwrap();
        let wa = db.upsert_whatsapp_credential("P1", "token-b", None).unwrap();

        assert_eq!(count(&db, "whatsapp"), 1);
        assert_eq!(wa.phone_number_id, "P1");
        assert_eq!(wa.access_token, "token-b");
        assert_eq!(wa.display_phone_number, None);
        assert!(wa.is_usable());
    }

    #[test]
    fn test_whatsapp_new_key_replaces_slot() {
        let db = test_db();
        db.upsert_whatsapp_credential("P1", "token-a", None).unwrap();
        db.upsert_whatsapp_credential("P2", "token-b", Some("+1 555 0199")).unwrap();

        assert_eq!(count(&db, "whatsapp"), 1);
        let wa = db.get_whatsapp_credential().unwrap().unwrap();
        assert_eq!(wa.phone_number_id, "P2");
        assert_eq!(wa.display_phone_number.as_deref(), Some("+1 555 0199"));
    }

    #[test]
    fn test_concurrent_upserts_return_their_own_credential() {
        let db = test_db();

        std::thread::scope(|scope| {
            for i in 0..8 {
                let db = &db;
                scope.spawn(move || {
                    for round in 0..20 {
                        let page_id = format!("PAGE{}", i);
                        let token = format!("token-{}-{}", i, round);
                        let page = db.upsert_page_credential(&page_id, "Page", &token, false).unwrap();
                        assert_eq!(page.page_id, page_id);
                        assert_eq!(page.access_token, token);

                        let wa = db.upsert_whatsapp_credential(&page_id, &token, None).unwrap();
                        assert_eq!(wa.phone_number_id, page_id);
                        assert_eq!(wa.access_token, token);
                    }
                });
            }
        });

        assert_eq!(count(&db, "pages"), 1);
        assert_eq!(count(&db, "whatsapp"), 1);
    }
}

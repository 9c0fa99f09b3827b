use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use crate::models::{PendingEdit, Urgency, User};

const SCHEMA_VERSION: i32 = 2;

/// Fixed storage keys for the persisted session pair.
pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";

const PENDING_EDITS_TABLE: &str = r#"
    -- Local edits waiting for the backend to catch up, per user
    CREATE TABLE IF NOT EXISTS pending_edits (
        owner TEXT NOT NULL,
        ticket_id TEXT NOT NULL,
        subject TEXT,
        description TEXT,
        urgency TEXT,
        withdrawn INTEGER NOT NULL DEFAULT 0,
        deleted INTEGER NOT NULL DEFAULT 0,
        recorded_at TEXT NOT NULL,
        PRIMARY KEY (owner, ticket_id)
    );
"#;

/// Client-side local storage.
///
/// Holds the string key/value entries the session lives in and the
/// pending-sync records for user edits the backend has not confirmed.
/// Pending records belong to the user who made them; every accessor takes
/// that user's id.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).context("Failed to open database")?;
        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        let version: i32 = self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .unwrap_or(0);

        if version < 1 {
            self.conn.execute_batch(
                r#"
                -- String entries, one per key
                CREATE TABLE IF NOT EXISTS storage (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );
                "#,
            )?;
            self.conn.execute_batch(PENDING_EDITS_TABLE)?;
        } else if version < 2 {
            self.migrate_pending_owner()?;
        }

        if version < SCHEMA_VERSION {
            self.conn
                .execute(&format!("PRAGMA user_version = {}", SCHEMA_VERSION), [])?;
        }

        Ok(())
    }

    /// Version 1 kept pending edits without an owner. They can only have
    /// come from the user whose session is stored; without one they are
    /// unattributable and dropped.
    fn migrate_pending_owner(&self) -> Result<()> {
        let owner = self
            .get_item(USER_KEY)?
            .and_then(|json| serde_json::from_str::<User>(&json).ok())
            .map(|user| user.id);

        let tx = self.conn.unchecked_transaction()?;
        tx.execute_batch("ALTER TABLE pending_edits RENAME TO pending_edits_v1;")?;
        tx.execute_batch(PENDING_EDITS_TABLE)?;
        if let Some(owner) = &owner {
            tx.execute(
                r#"
                INSERT INTO pending_edits (owner, ticket_id, subject, description, urgency, withdrawn, deleted, recorded_at)
                SELECT ?1, ticket_id, subject, description, urgency, withdrawn, deleted, recorded_at
                FROM pending_edits_v1
                "#,
                [owner],
            )?;
        }
        tx.execute_batch("DROP TABLE pending_edits_v1;")?;
        tx.commit().context("Failed to migrate pending edits")?;

        tracing::info!(attributed = owner.is_some(), "pending edits migrated to per-user storage");
        Ok(())
    }

    // Storage entries
    pub fn get_item(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM storage WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    pub fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO storage (key, value) VALUES (?1, ?2) ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn remove_item(&self, key: &str) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM storage WHERE key = ?1", [key])?;
        Ok(rows > 0)
    }

    /// Read both session entries. Either may be missing.
    pub fn load_session(&self) -> Result<(Option<String>, Option<String>)> {
        Ok((self.get_item(TOKEN_KEY)?, self.get_item(USER_KEY)?))
    }

    /// Write the token and serialized user in one transaction.
    pub fn save_session(&self, token: &str, user_json: &str) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        for (key, value) in [(TOKEN_KEY, token), (USER_KEY, user_json)] {
            tx.execute(
                "INSERT INTO storage (key, value) VALUES (?1, ?2) ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )?;
        }
        tx.commit().context("Failed to persist session")?;
        Ok(())
    }

    pub fn clear_session(&self) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM storage WHERE key IN (?1, ?2)",
            params![TOKEN_KEY, USER_KEY],
        )?;
        tx.commit().context("Failed to clear session")?;
        Ok(())
    }

    // Pending edits
    /// Record an edit, merging it with whatever `owner` already has pending
    /// for the ticket.
    pub fn upsert_pending_edit(&self, owner: &str, edit: PendingEdit) -> Result<PendingEdit> {
        let merged = match self.get_pending_edit(owner, &edit.ticket_id)? {
            Some(mut existing) => {
                existing.merge(edit);
                existing
            }
            None => edit,
        };

        self.conn.execute(
            r#"
            INSERT INTO pending_edits (owner, ticket_id, subject, description, urgency, withdrawn, deleted, recorded_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(owner, ticket_id) DO UPDATE SET
                subject = excluded.subject,
                description = excluded.description,
                urgency = excluded.urgency,
                withdrawn = excluded.withdrawn,
                deleted = excluded.deleted,
                recorded_at = excluded.recorded_at
            "#,
            params![
                owner,
                merged.ticket_id,
                merged.subject,
                merged.description,
                merged.urgency.map(|u| u.as_str()),
                merged.withdrawn,
                merged.deleted,
                merged.recorded_at.to_rfc3339(),
            ],
        )?;
        Ok(merged)
    }

    pub fn get_pending_edit(&self, owner: &str, ticket_id: &str) -> Result<Option<PendingEdit>> {
        let mut stmt = self.conn.prepare(
            "SELECT ticket_id, subject, description, urgency, withdrawn, deleted, recorded_at FROM pending_edits WHERE owner = ?1 AND ticket_id = ?2",
        )?;
        let edit = stmt.query_row([owner, ticket_id], row_to_edit).optional()?;
        Ok(edit)
    }

    pub fn list_pending_edits(&self, owner: &str) -> Result<Vec<PendingEdit>> {
        let mut stmt = self.conn.prepare(
            "SELECT ticket_id, subject, description, urgency, withdrawn, deleted, recorded_at FROM pending_edits WHERE owner = ?1 ORDER BY recorded_at",
        )?;
        let edits = stmt
            .query_map([owner], row_to_edit)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(edits)
    }

    pub fn remove_pending_edit(&self, owner: &str, ticket_id: &str) -> Result<bool> {
        let rows = self.conn.execute(
            "DELETE FROM pending_edits WHERE owner = ?1 AND ticket_id = ?2",
            [owner, ticket_id],
        )?;
        Ok(rows > 0)
    }

    /// Replace the withdrawn flag on a record, used when reconciliation
    /// finds the backend has moved the ticket on.
    pub fn clear_withdrawn(&self, owner: &str, ticket_id: &str) -> Result<bool> {
        let rows = self.conn.execute(
            "UPDATE pending_edits SET withdrawn = 0 WHERE owner = ?1 AND ticket_id = ?2",
            [owner, ticket_id],
        )?;
        Ok(rows > 0)
    }
}

fn row_to_edit(row: &rusqlite::Row<'_>) -> rusqlite::Result<PendingEdit> {
    Ok(PendingEdit {
        ticket_id: row.get(0)?,
        subject: row.get(1)?,
        description: row.get(2)?,
        urgency: row
            .get::<_, Option<String>>(3)?
            .and_then(|u| u.parse::<Urgency>().ok()),
        withdrawn: row.get(4)?,
        deleted: row.get(5)?,
        recorded_at: parse_datetime(row.get::<_, String>(6)?),
    })
}

fn parse_datetime(s: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

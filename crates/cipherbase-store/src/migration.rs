//! Database schema migrations for SQLite.
//!
//! We use a simple versioned migration system. Each migration is a SQL string
//! that transforms the schema from version N to N+1.

use rusqlite::Connection;
use tracing::info;

use crate::error::{Result, StoreError};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema.
///
/// This function is idempotent - it can be called multiple times safely.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    if current > CURRENT_VERSION {
        return Err(StoreError::Migration(format!(
            "schema version {current} is newer than supported version {CURRENT_VERSION}"
        )));
    }

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, now_millis()],
            )?;
        }

        tx.commit()?;
        info!(from = current, to = CURRENT_VERSION, "ledger schema migrated");
    }

    Ok(())
}

/// Apply a specific migration version.
fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(StoreError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- One row per database; never updated or deleted
        CREATE TABLE databases (
            id INTEGER PRIMARY KEY,           -- sequential, starts at 1
            owner BLOB NOT NULL,              -- 20 bytes
            name TEXT NOT NULL,
            access_handle BLOB NOT NULL,      -- 32 bytes
            created_at INTEGER NOT NULL       -- Unix seconds
        );

        -- Append-only record handles
        CREATE TABLE records (
            database_id INTEGER NOT NULL REFERENCES databases(id),
            idx INTEGER NOT NULL,             -- 0-based, contiguous
            handle BLOB NOT NULL,             -- 32 bytes
            PRIMARY KEY (database_id, idx)
        );

        -- Authorization sets; position preserves admission order
        CREATE TABLE members (
            database_id INTEGER NOT NULL REFERENCES databases(id),
            position INTEGER NOT NULL,
            identity BLOB NOT NULL,           -- 20 bytes
            PRIMARY KEY (database_id, position),
            UNIQUE (database_id, identity)
        );

        -- Event journal, one row per committed mutation
        CREATE TABLE events (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            database_id INTEGER NOT NULL,
            event BLOB NOT NULL               -- CBOR-encoded VaultEvent
        );

        CREATE INDEX idx_databases_owner ON databases(owner, id);
        "#,
    )?;

    Ok(())
}

/// Get current time in milliseconds.
fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

//! SQLite implementation of the LedgerStore trait.
//!
//! This is the primary storage backend for Cipherbase. It uses rusqlite
//! with bundled SQLite, wrapped in async via tokio::spawn_blocking. Each
//! commit runs in one SQLite transaction together with its journal row.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use cipherbase_acl::AclError;
use cipherbase_core::{CiphertextHandle, DatabaseId, Identity, JournalEntry, VaultEvent};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{DatabaseSummary, LedgerStore, Mutation};

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        info!(path = %path.display(), "opened sqlite ledger");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|e| StoreError::Poisoned(format!("sqlite connection: {e}")))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Task(format!("spawn_blocking failed: {e}")))?
    }
}

fn sql_id(id: DatabaseId) -> i64 {
    id.get() as i64
}

fn identity_from_blob(bytes: &[u8]) -> Result<Identity> {
    Identity::try_from(bytes).map_err(|e| StoreError::InvalidData(format!("identity: {e}")))
}

fn handle_from_blob(bytes: &[u8]) -> Result<CiphertextHandle> {
    CiphertextHandle::try_from(bytes).map_err(|e| StoreError::InvalidData(format!("handle: {e}")))
}

fn encode_event(event: &VaultEvent) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::into_writer(event, &mut buf)
        .map_err(|e| StoreError::Serialization(e.to_string()))?;
    Ok(buf)
}

fn decode_event(bytes: &[u8]) -> Result<VaultEvent> {
    ciborium::from_reader(bytes).map_err(|e| StoreError::Serialization(e.to_string()))
}

/// Record count of `id`, or `None` if the database does not exist.
fn record_count_in(conn: &Connection, id: DatabaseId) -> Result<Option<u64>> {
    let count: Option<i64> = conn
        .query_row(
            "SELECT (SELECT COUNT(*) FROM records WHERE database_id = ?1)
             FROM databases WHERE id = ?1",
            params![sql_id(id)],
            |row| row.get(0),
        )
        .optional()?;
    Ok(count.map(|c| c as u64))
}

fn database_exists(conn: &Connection, id: DatabaseId) -> Result<bool> {
    Ok(conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM databases WHERE id = ?1)",
        params![sql_id(id)],
        |row| row.get(0),
    )?)
}

fn member_exists(conn: &Connection, id: DatabaseId, identity: &Identity) -> Result<bool> {
    Ok(conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM members WHERE database_id = ?1 AND identity = ?2)",
        params![sql_id(id), identity.as_bytes().as_slice()],
        |row| row.get(0),
    )?)
}

/// Apply a mutation inside an open transaction.
fn apply(conn: &Connection, mutation: &Mutation) -> Result<()> {
    match mutation {
        Mutation::CreateDatabase {
            id,
            owner,
            name,
            access_handle,
            created_at,
        } => {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM databases", [], |row| row.get(0))?;
            let expected = DatabaseId::new(count as u64 + 1);
            if *id != expected {
                return Err(StoreError::conflict(
                    *id,
                    format!("next database id is {}", expected.get()),
                ));
            }
            if owner.is_zero() {
                return Err(AclError::ZeroIdentity.into());
            }

            conn.execute(
                "INSERT INTO databases (id, owner, name, access_handle, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    sql_id(*id),
                    owner.as_bytes().as_slice(),
                    name,
                    access_handle.as_bytes().as_slice(),
                    created_at,
                ],
            )?;
            conn.execute(
                "INSERT INTO members (database_id, position, identity) VALUES (?1, 0, ?2)",
                params![sql_id(*id), owner.as_bytes().as_slice()],
            )?;
        }
        Mutation::AppendRecord { id, index, handle } => {
            let next = record_count_in(conn, *id)?.ok_or(StoreError::NotFound(*id))?;
            if *index != next {
                return Err(StoreError::conflict(
                    *id,
                    format!("next record index is {next}, got {index}"),
                ));
            }

            conn.execute(
                "INSERT INTO records (database_id, idx, handle) VALUES (?1, ?2, ?3)",
                params![sql_id(*id), *index as i64, handle.as_bytes().as_slice()],
            )?;
        }
        Mutation::AddMember { id, identity } => {
            if !database_exists(conn, *id)? {
                return Err(StoreError::NotFound(*id));
            }
            if identity.is_zero() {
                return Err(AclError::ZeroIdentity.into());
            }
            if member_exists(conn, *id, identity)? {
                return Err(StoreError::conflict(
                    *id,
                    format!("{identity} is already a member"),
                ));
            }

            let position: i64 = conn.query_row(
                "SELECT COUNT(*) FROM members WHERE database_id = ?1",
                params![sql_id(*id)],
                |row| row.get(0),
            )?;
            conn.execute(
                "INSERT INTO members (database_id, position, identity) VALUES (?1, ?2, ?3)",
                params![sql_id(*id), position, identity.as_bytes().as_slice()],
            )?;
        }
    }
    Ok(())
}

#[async_trait]
impl LedgerStore for SqliteStore {
    async fn commit(&self, mutation: &Mutation) -> Result<JournalEntry> {
        let mutation = mutation.clone();

        self.blocking(move |conn| {
            let tx = conn.transaction()?;
            apply(&tx, &mutation)?;

            let event = mutation.event();
            tx.execute(
                "INSERT INTO events (database_id, event) VALUES (?1, ?2)",
                params![sql_id(mutation.database()), encode_event(&event)?],
            )?;
            let seq = tx.last_insert_rowid() as u64;
            tx.commit()?;

            debug!(seq, database = %mutation.database(), "sqlite store commit");
            Ok(JournalEntry { seq, event })
        })
        .await
    }

    async fn get_database(&self, id: DatabaseId) -> Result<Option<DatabaseSummary>> {
        self.blocking(move |conn| {
            let tx = conn.transaction()?;
            let row = tx
                .query_row(
                    "SELECT owner, name, access_handle, created_at,
                            (SELECT COUNT(*) FROM records WHERE database_id = ?1)
                     FROM databases WHERE id = ?1",
                    params![sql_id(id)],
                    |row| {
                        Ok((
                            row.get::<_, Vec<u8>>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, Vec<u8>>(2)?,
                            row.get::<_, i64>(3)?,
                            row.get::<_, i64>(4)?,
                        ))
                    },
                )
                .optional()?;

            let Some((owner, name, access_handle, created_at, record_count)) = row else {
                return Ok(None);
            };

            let member_blobs = tx
                .prepare("SELECT identity FROM members WHERE database_id = ?1 ORDER BY position")?
                .query_map(params![sql_id(id)], |row| row.get::<_, Vec<u8>>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            Ok(Some(DatabaseSummary {
                id,
                owner: identity_from_blob(&owner)?,
                name,
                access_handle: handle_from_blob(&access_handle)?,
                created_at,
                record_count: record_count as u64,
                members: member_blobs
                    .iter()
                    .map(|b| identity_from_blob(b))
                    .collect::<Result<_>>()?,
            }))
        })
        .await
    }

    async fn get_records(&self, id: DatabaseId) -> Result<Option<Vec<CiphertextHandle>>> {
        self.blocking(move |conn| {
            let tx = conn.transaction()?;
            if !database_exists(&tx, id)? {
                return Ok(None);
            }

            let blobs = tx
                .prepare("SELECT handle FROM records WHERE database_id = ?1 ORDER BY idx")?
                .query_map(params![sql_id(id)], |row| row.get::<_, Vec<u8>>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            blobs
                .iter()
                .map(|b| handle_from_blob(b))
                .collect::<Result<Vec<_>>>()
                .map(Some)
        })
        .await
    }

    async fn record_count(&self, id: DatabaseId) -> Result<Option<u64>> {
        self.blocking(move |conn| record_count_in(conn, id)).await
    }

    async fn get_record(&self, id: DatabaseId, index: u64) -> Result<Option<CiphertextHandle>> {
        let Ok(index) = i64::try_from(index) else {
            return Ok(None);
        };

        self.blocking(move |conn| {
            let blob: Option<Vec<u8>> = conn
                .query_row(
                    "SELECT handle FROM records WHERE database_id = ?1 AND idx = ?2",
                    params![sql_id(id), index],
                    |row| row.get(0),
                )
                .optional()?;
            blob.map(|b| handle_from_blob(&b)).transpose()
        })
        .await
    }

    async fn is_member(&self, id: DatabaseId, identity: &Identity) -> Result<bool> {
        let identity = *identity;
        self.blocking(move |conn| member_exists(conn, id, &identity))
            .await
    }

    async fn list_by_owner(&self, owner: &Identity) -> Result<Vec<DatabaseId>> {
        let owner = *owner;
        self.blocking(move |conn| {
            let ids = conn
                .prepare("SELECT id FROM databases WHERE owner = ?1 ORDER BY id")?
                .query_map(params![owner.as_bytes().as_slice()], |row| {
                    row.get::<_, i64>(0)
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(ids.into_iter().map(|id| DatabaseId::new(id as u64)).collect())
        })
        .await
    }

    async fn database_count(&self) -> Result<u64> {
        self.blocking(|conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM databases", [], |row| row.get(0))?;
            Ok(count as u64)
        })
        .await
    }

    async fn events_since(&self, after_seq: u64, limit: usize) -> Result<Vec<JournalEntry>> {
        let after = i64::try_from(after_seq).unwrap_or(i64::MAX);
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        self.blocking(move |conn| {
            let rows = conn
                .prepare("SELECT seq, event FROM events WHERE seq > ?1 ORDER BY seq LIMIT ?2")?
                .query_map(params![after, limit], |row| {
                    Ok((row.get::<_, i64>(0)?, row.get::<_, Vec<u8>>(1)?))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            rows.into_iter()
                .map(|(seq, bytes)| {
                    Ok(JournalEntry {
                        seq: seq as u64,
                        event: decode_event(&bytes)?,
                    })
                })
                .collect()
        })
        .await
    }
}

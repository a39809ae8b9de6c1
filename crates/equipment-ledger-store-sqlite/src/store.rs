// equipment-ledger-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Batch Store
// Description: Durable BatchStore backed by SQLite.
// Purpose: Persist batches and records with atomic, serialized ingestion.
// Dependencies: equipment-ledger-core, rusqlite, serde, thiserror
// ============================================================================

//! ## Overview
//! This module implements a durable [`BatchStore`] using `SQLite`. Every
//! write runs inside a `BEGIN IMMEDIATE` transaction, which acquires the
//! database write lock before the first statement; concurrent writers wait
//! up to the busy timeout. Reads run inside their own deferred transaction
//! and therefore see one committed snapshot. Deleting a batch cascades to its
//! records through the foreign key.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use equipment_ledger_core::BatchId;
use equipment_ledger_core::BatchMeta;
use equipment_ledger_core::BatchStore;
use equipment_ledger_core::BatchTransaction;
use equipment_ledger_core::NewBatch;
use equipment_ledger_core::OwnerRef;
use equipment_ledger_core::Record;
use equipment_ledger_core::RecordFields;
use equipment_ledger_core::StoreError;
use equipment_ledger_core::StoredBatch;
use equipment_ledger_core::TransactionWork;
use equipment_ledger_core::unix_millis_not_before;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::TransactionBehavior;
use rusqlite::params;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode; readers do not block the writer.
    #[default]
    Wal,
    /// Delete journal mode.
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode.
    #[default]
    Full,
    /// Normal synchronous mode.
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` batch store.
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl SqliteStoreConfig {
    /// Returns a configuration with default pragmas for `path`.
    #[must_use]
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Stored rows violate store invariants.
    #[error("sqlite store corruption: {0}")]
    Corrupt(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid store input.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) => Self::Store(message),
            SqliteStoreError::Corrupt(message) => Self::Corrupt(message),
            SqliteStoreError::VersionMismatch(message) => Self::VersionMismatch(message),
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
        }
    }
}

/// Maps an engine error into a store error.
#[allow(clippy::needless_pass_by_value, reason = "Used directly as a map_err adapter.")]
fn db_err(err: rusqlite::Error) -> SqliteStoreError {
    SqliteStoreError::Db(err.to_string())
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed batch store.
#[derive(Clone)]
pub struct SqliteBatchStore {
    /// Shared `SQLite` connection guarded by a mutex.
    connection: Arc<Mutex<Connection>>,
}

impl SqliteBatchStore {
    /// Opens an `SQLite`-backed batch store, creating the schema if needed.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened or
    /// initialized, or when it carries an unsupported schema version.
    pub fn new(config: &SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(config)?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Locks the connection.
    fn lock(&self) -> Result<MutexGuard<'_, Connection>, SqliteStoreError> {
        self.connection.lock().map_err(|_| SqliteStoreError::Db("mutex poisoned".to_string()))
    }

    /// Runs `work` inside an immediate transaction.
    fn write_with(&self, work: &mut TransactionWork<'_>) -> Result<(), StoreError> {
        let mut guard = self.lock()?;
        let tx = guard.transaction_with_behavior(TransactionBehavior::Immediate).map_err(db_err)?;
        work(&mut SqliteBatchTransaction {
            conn: &tx,
        })?;
        tx.commit().map_err(db_err)?;
        drop(guard);
        Ok(())
    }

    /// Lists batch metadata newest-first.
    fn list_metas(&self) -> Result<Vec<BatchMeta>, SqliteStoreError> {
        let mut guard = self.lock()?;
        let tx = guard.transaction().map_err(db_err)?;
        let metas = {
            let mut stmt = tx
                .prepare(
                    "SELECT id, filename, owner, created_at_ms FROM batches ORDER BY created_at_ms \
                     DESC, id DESC",
                )
                .map_err(db_err)?;
            let rows = stmt.query_map(params![], meta_from_row).map_err(db_err)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(db_err)?
        };
        tx.commit().map_err(db_err)?;
        drop(guard);
        Ok(metas)
    }

    /// Loads a batch and its records from one snapshot.
    fn load(&self, batch_id: BatchId) -> Result<Option<StoredBatch>, SqliteStoreError> {
        let mut guard = self.lock()?;
        let tx = guard.transaction().map_err(db_err)?;
        let meta = tx
            .query_row(
                "SELECT id, filename, owner, created_at_ms FROM batches WHERE id = ?1",
                params![batch_id.get()],
                meta_from_row,
            )
            .optional()
            .map_err(db_err)?;
        let batch = match meta {
            None => None,
            Some(meta) => Some(StoredBatch {
                records: query_records(&tx, batch_id)?,
                meta,
            }),
        };
        tx.commit().map_err(db_err)?;
        drop(guard);
        Ok(batch)
    }
}

impl BatchStore for SqliteBatchStore {
    fn write_transaction(&self, work: &mut TransactionWork<'_>) -> Result<(), StoreError> {
        self.write_with(work)
    }

    fn list_batches(&self) -> Result<Vec<BatchMeta>, StoreError> {
        self.list_metas().map_err(StoreError::from)
    }

    fn load_batch(&self, batch_id: BatchId) -> Result<Option<StoredBatch>, StoreError> {
        self.load(batch_id).map_err(StoreError::from)
    }
}

// ============================================================================
// SECTION: Transaction
// ============================================================================

/// Batch operations bound to an open `SQLite` transaction.
struct SqliteBatchTransaction<'a> {
    /// Connection view of the open transaction.
    conn: &'a Connection,
}

impl BatchTransaction for SqliteBatchTransaction<'_> {
    fn create_batch(&mut self, batch: &NewBatch) -> Result<BatchMeta, StoreError> {
        let latest: Option<i64> = self
            .conn
            .query_row("SELECT MAX(created_at_ms) FROM batches", params![], |row| row.get(0))
            .map_err(db_err)?;
        let created_at_ms = unix_millis_not_before(latest);
        self.conn
            .execute(
                "INSERT INTO batches (filename, owner, created_at_ms) VALUES (?1, ?2, ?3)",
                params![batch.filename, batch.owner.as_ref().map(OwnerRef::as_str), created_at_ms],
            )
            .map_err(db_err)?;
        Ok(BatchMeta {
            id: BatchId::new(self.conn.last_insert_rowid()),
            filename: batch.filename.clone(),
            owner: batch.owner.clone(),
            created_at_ms,
        })
    }

    fn bulk_insert_records(
        &mut self,
        batch_id: BatchId,
        records: &[RecordFields],
    ) -> Result<(), StoreError> {
        let start: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM records WHERE batch_id = ?1",
                params![batch_id.get()],
                |row| row.get(0),
            )
            .map_err(db_err)?;
        let mut stmt = self
            .conn
            .prepare_cached(
                "INSERT INTO records (batch_id, position, name, category, flowrate, pressure, \
                 temperature) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )
            .map_err(db_err)?;
        for (fields, position) in records.iter().zip(start..) {
            stmt.execute(params![
                batch_id.get(),
                position,
                fields.name,
                fields.category,
                fields.flowrate,
                fields.pressure,
                fields.temperature
            ])
            .map_err(db_err)?;
        }
        Ok(())
    }

    fn count_batches(&mut self) -> Result<u64, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM batches", params![], |row| row.get(0))
            .map_err(db_err)?;
        Ok(u64::try_from(count)
            .map_err(|_| SqliteStoreError::Corrupt("negative batch count".to_string()))?)
    }

    fn oldest_batches(&mut self, limit: u64) -> Result<Vec<BatchId>, StoreError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM batches ORDER BY created_at_ms ASC, id ASC LIMIT ?1")
            .map_err(db_err)?;
        let rows = stmt.query_map(params![limit], |row| row.get::<_, i64>(0)).map_err(db_err)?;
        let ids = rows.collect::<Result<Vec<_>, _>>().map_err(db_err)?;
        Ok(ids.into_iter().map(BatchId::new).collect())
    }

    fn delete_batch(&mut self, batch_id: BatchId) -> Result<bool, StoreError> {
        let changed = self
            .conn
            .execute("DELETE FROM batches WHERE id = ?1", params![batch_id.get()])
            .map_err(db_err)?;
        Ok(changed > 0)
    }

    fn records_of(&mut self, batch_id: BatchId) -> Result<Vec<Record>, StoreError> {
        Ok(query_records(self.conn, batch_id)?)
    }
}

// ============================================================================
// SECTION: Row Mapping
// ============================================================================

/// Maps a `batches` row onto batch metadata.
fn meta_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<BatchMeta> {
    let owner: Option<String> = row.get(2)?;
    Ok(BatchMeta {
        id: BatchId::new(row.get(0)?),
        filename: row.get(1)?,
        owner: owner.map(OwnerRef::new),
        created_at_ms: row.get(3)?,
    })
}

/// Raw `records` row before position validation.
type RawRecord = (i64, Option<String>, Option<String>, Option<f64>, Option<f64>, Option<f64>);

/// Loads the records of a batch ordered by position.
fn query_records(conn: &Connection, batch_id: BatchId) -> Result<Vec<Record>, SqliteStoreError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT position, name, category, flowrate, pressure, temperature FROM records WHERE \
             batch_id = ?1 ORDER BY position ASC",
        )
        .map_err(db_err)?;
    let rows = stmt
        .query_map(params![batch_id.get()], |row| -> rusqlite::Result<RawRecord> {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?, row.get(5)?))
        })
        .map_err(db_err)?;
    let mut records = Vec::new();
    for row in rows {
        let (position, name, category, flowrate, pressure, temperature) = row.map_err(db_err)?;
        let position = u64::try_from(position).map_err(|_| {
            SqliteStoreError::Corrupt(format!("negative record position in batch {batch_id}"))
        })?;
        records.push(Record {
            batch_id,
            position,
            fields: RecordFields {
                name,
                category,
                flowrate,
                pressure,
                temperature,
            },
        });
    }
    Ok(records)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io("store path missing parent directory".to_string()));
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection with the configured pragmas.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags).map_err(db_err)?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies `SQLite` pragmas. Foreign keys are per-connection and must be on
/// for record cascades.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection
        .busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms))
        .map_err(db_err)?;
    connection.execute_batch("PRAGMA foreign_keys = ON;").map_err(db_err)?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(db_err)?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(db_err)?;
    Ok(())
}

/// Initializes the `SQLite` schema or validates the existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction_with_behavior(TransactionBehavior::Immediate).map_err(db_err)?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(db_err)?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(db_err)?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(db_err)?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS batches (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    filename TEXT NOT NULL,
                    owner TEXT,
                    created_at_ms INTEGER NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_batches_created
                    ON batches (created_at_ms, id);
                CREATE TABLE IF NOT EXISTS records (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    batch_id INTEGER NOT NULL,
                    position INTEGER NOT NULL,
                    name TEXT,
                    category TEXT,
                    flowrate REAL,
                    pressure REAL,
                    temperature REAL,
                    FOREIGN KEY (batch_id) REFERENCES batches(id) ON DELETE CASCADE,
                    UNIQUE (batch_id, position)
                );",
            )
            .map_err(db_err)?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "unsupported schema version: {value}"
            )));
        }
    }
    tx.commit().map_err(db_err)?;
    Ok(())
}

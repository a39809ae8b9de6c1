// equipment-ledger-store-sqlite/tests/sqlite_store.rs
// ============================================================================
// Module: SQLite Store Tests
// Description: Validate SQLite BatchStore behavior.
// Purpose: Ensure durable persistence, atomic ingestion, and bounded history.
// Dependencies: equipment-ledger-store-sqlite, equipment-ledger-core, rusqlite, tempfile
// ============================================================================

//! ## Overview
//! Conformance tests for the SQLite-backed batch store: rollback on failure,
//! cascading deletes, schema version checks, persistence across reopen, and
//! the retention bound under concurrent writers.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::thread;

use equipment_ledger_core::BatchId;
use equipment_ledger_core::BatchMeta;
use equipment_ledger_core::BatchStore;
use equipment_ledger_core::BatchTransaction;
use equipment_ledger_core::IngestOutcome;
use equipment_ledger_core::IngestPipeline;
use equipment_ledger_core::IngestRequest;
use equipment_ledger_core::NewBatch;
use equipment_ledger_core::OwnerRef;
use equipment_ledger_core::ParsedTable;
use equipment_ledger_core::PipelineConfig;
use equipment_ledger_core::PipelineError;
use equipment_ledger_core::REQUIRED_COLUMNS;
use equipment_ledger_core::Record;
use equipment_ledger_core::RecordFields;
use equipment_ledger_core::RequestContext;
use equipment_ledger_core::RetentionPolicy;
use equipment_ledger_core::SharedBatchStore;
use equipment_ledger_core::StoreError;
use equipment_ledger_core::StoredBatch;
use equipment_ledger_core::TransactionWork;
use equipment_ledger_core::unix_millis;
use equipment_ledger_store_sqlite::SqliteBatchStore;
use equipment_ledger_store_sqlite::SqliteStoreConfig;
use equipment_ledger_store_sqlite::SqliteStoreError;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn store_for(path: &Path) -> SqliteBatchStore {
    let config = SqliteStoreConfig {
        busy_timeout_ms: 10_000,
        ..SqliteStoreConfig::at(path)
    };
    SqliteBatchStore::new(&config).expect("store init")
}

fn pipeline_for(store: &SqliteBatchStore) -> IngestPipeline {
    IngestPipeline::new(SharedBatchStore::from_store(store.clone()), PipelineConfig::default())
}

fn upload(tag: &str) -> IngestRequest {
    IngestRequest {
        filename: format!("{tag}.csv"),
        table: ParsedTable::from_text_rows(&REQUIRED_COLUMNS, &[
            &[tag, "Pump", "10", "2", "80"],
            &["spare", "Valve", "20", "3", "60"],
        ]),
        confirmed: false,
    }
}

fn fields(name: &str, flowrate: Option<f64>) -> RecordFields {
    RecordFields {
        name: Some(name.to_string()),
        category: Some("Pump".to_string()),
        flowrate,
        pressure: Some(1.5),
        temperature: Some(20.0),
    }
}

fn snapshot(store: &SqliteBatchStore) -> Vec<StoredBatch> {
    store
        .list_batches()
        .unwrap()
        .into_iter()
        .map(|meta| store.load_batch(meta.id).unwrap().unwrap())
        .collect()
}

/// Wraps a store so record inserts fail inside the write transaction.
struct InsertFailingStore {
    inner: SqliteBatchStore,
}

struct InsertFailingTransaction<'a> {
    inner: &'a mut dyn BatchTransaction,
}

impl BatchTransaction for InsertFailingTransaction<'_> {
    fn create_batch(&mut self, batch: &NewBatch) -> Result<BatchMeta, StoreError> {
        self.inner.create_batch(batch)
    }

    fn bulk_insert_records(&mut self, _: BatchId, _: &[RecordFields]) -> Result<(), StoreError> {
        Err(StoreError::Io("disk full".to_string()))
    }

    fn count_batches(&mut self) -> Result<u64, StoreError> {
        self.inner.count_batches()
    }

    fn oldest_batches(&mut self, limit: u64) -> Result<Vec<BatchId>, StoreError> {
        self.inner.oldest_batches(limit)
    }

    fn delete_batch(&mut self, batch_id: BatchId) -> Result<bool, StoreError> {
        self.inner.delete_batch(batch_id)
    }

    fn records_of(&mut self, batch_id: BatchId) -> Result<Vec<Record>, StoreError> {
        self.inner.records_of(batch_id)
    }
}

impl BatchStore for InsertFailingStore {
    fn write_transaction(&self, work: &mut TransactionWork<'_>) -> Result<(), StoreError> {
        self.inner.write_transaction(&mut |tx| {
            work(&mut InsertFailingTransaction {
                inner: tx,
            })
        })
    }

    fn list_batches(&self) -> Result<Vec<BatchMeta>, StoreError> {
        self.inner.list_batches()
    }

    fn load_batch(&self, batch_id: BatchId) -> Result<Option<StoredBatch>, StoreError> {
        self.inner.load_batch(batch_id)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn sqlite_store_roundtrip_preserves_nulls_and_order() {
    let temp = TempDir::new().unwrap();
    let store = store_for(&temp.path().join("ledger.sqlite"));
    let mut created = None;
    store
        .write_transaction(&mut |tx| {
            let meta = tx.create_batch(&NewBatch {
                filename: "plant.csv".to_string(),
                owner: Some(OwnerRef::new("operator")),
            })?;
            tx.bulk_insert_records(meta.id, &[fields("a", Some(1.0)), fields("b", None)])?;
            tx.bulk_insert_records(meta.id, &[fields("c", Some(3.0))])?;
            created = Some(meta);
            Ok(())
        })
        .unwrap();
    let meta = created.unwrap();

    let loaded = store.load_batch(meta.id).unwrap().unwrap();
    assert_eq!(loaded.meta, meta);
    let names: Vec<_> =
        loaded.records.iter().map(|record| record.fields.name.clone().unwrap()).collect();
    assert_eq!(names, vec!["a", "b", "c"]);
    let positions: Vec<u64> = loaded.records.iter().map(|record| record.position).collect();
    assert_eq!(positions, vec![0, 1, 2]);
    assert_eq!(loaded.records[1].fields.flowrate, None);
}

#[test]
fn sqlite_store_failed_transaction_rolls_back() {
    let temp = TempDir::new().unwrap();
    let store = store_for(&temp.path().join("ledger.sqlite"));
    let result = store.write_transaction(&mut |tx| {
        let meta = tx.create_batch(&NewBatch {
            filename: "half.csv".to_string(),
            owner: None,
        })?;
        tx.bulk_insert_records(meta.id, &[fields("a", Some(1.0))])?;
        Err(StoreError::Store("injected failure".to_string()))
    });
    assert!(result.is_err());
    assert!(store.list_batches().unwrap().is_empty());
}

#[test]
fn sqlite_store_delete_cascades_records() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("ledger.sqlite");
    let store = store_for(&path);
    let pipeline = pipeline_for(&store);
    let IngestOutcome::Persisted(result) =
        pipeline.ingest(&RequestContext::anonymous(), upload("gone")).unwrap()
    else {
        panic!("complete upload must persist");
    };
    pipeline.delete_batch(result.batch_id()).unwrap();

    let conn = rusqlite::Connection::open(&path).unwrap();
    let orphans: i64 = conn
        .query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))
        .unwrap();
    assert_eq!(orphans, 0);
}

#[test]
fn sqlite_store_persists_across_reopen() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("nested").join("ledger.sqlite");
    let batch_id = {
        let store = store_for(&path);
        let IngestOutcome::Persisted(result) =
            pipeline_for(&store).ingest(&RequestContext::anonymous(), upload("kept")).unwrap()
        else {
            panic!("complete upload must persist");
        };
        result.batch_id()
    };
    let reopened = store_for(&path);
    let summary = pipeline_for(&reopened).summary(batch_id).unwrap();
    assert_eq!(summary.total_count, 2);
    assert_eq!(summary.valid_count, 2);
}

#[test]
fn sqlite_store_rejects_unknown_schema_version() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("ledger.sqlite");
    drop(store_for(&path));
    let conn = rusqlite::Connection::open(&path).unwrap();
    conn.execute("UPDATE store_meta SET version = 99", []).unwrap();
    drop(conn);

    let result = SqliteBatchStore::new(&SqliteStoreConfig::at(&path));
    assert!(matches!(result, Err(SqliteStoreError::VersionMismatch(_))));
}

#[test]
fn sqlite_store_rejects_directory_path() {
    let temp = TempDir::new().unwrap();
    let result = SqliteBatchStore::new(&SqliteStoreConfig::at(temp.path()));
    assert!(matches!(result, Err(SqliteStoreError::Invalid(_))));
}

#[test]
fn sqlite_store_retention_keeps_most_recent_batches() {
    let temp = TempDir::new().unwrap();
    let store = store_for(&temp.path().join("ledger.sqlite"));
    let pipeline = pipeline_for(&store);
    let mut ids = Vec::new();
    for index in 0..7 {
        let IngestOutcome::Persisted(result) =
            pipeline.ingest(&RequestContext::anonymous(), upload(&format!("u{index}"))).unwrap()
        else {
            panic!("complete upload must persist");
        };
        ids.push(result.batch_id());
    }
    let listed: Vec<_> = store.list_batches().unwrap().into_iter().map(|meta| meta.id).collect();
    let mut expected = ids[2..].to_vec();
    expected.reverse();
    assert_eq!(listed, expected);
}

#[test]
fn sqlite_store_concurrent_writers_never_exceed_bound() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("ledger.sqlite");
    drop(store_for(&path));

    let done = Arc::new(AtomicBool::new(false));
    let reader = {
        let done = Arc::clone(&done);
        let store = store_for(&path);
        thread::spawn(move || {
            let mut max_seen = 0;
            while !done.load(Ordering::SeqCst) {
                max_seen = max_seen.max(store.list_batches().unwrap().len());
            }
            max_seen
        })
    };

    let writers: Vec<_> = (0..4)
        .map(|writer| {
            let store = store_for(&path);
            thread::spawn(move || {
                let pipeline = pipeline_for(&store);
                for index in 0..5 {
                    let tag = format!("w{writer}-{index}");
                    pipeline.ingest(&RequestContext::anonymous(), upload(&tag)).unwrap();
                }
            })
        })
        .collect();
    for writer in writers {
        writer.join().unwrap();
    }
    done.store(true, Ordering::SeqCst);
    let max_seen = reader.join().unwrap();

    assert!(max_seen <= 5, "reader observed {max_seen} batches");
    let store = store_for(&path);
    let batches = store.list_batches().unwrap();
    assert_eq!(batches.len(), 5);
    for batch in batches {
        assert_eq!(store.load_batch(batch.id).unwrap().unwrap().records.len(), 2);
    }
}

#[test]
fn sqlite_store_failed_insert_restores_evicted_batches() {
    let temp = TempDir::new().unwrap();
    let store = store_for(&temp.path().join("ledger.sqlite"));
    let pipeline = pipeline_for(&store);
    for index in 0..5 {
        pipeline.ingest(&RequestContext::anonymous(), upload(&format!("u{index}"))).unwrap();
    }
    let before = snapshot(&store);
    assert_eq!(before.len(), 5);

    let failing = IngestPipeline::new(
        SharedBatchStore::from_store(InsertFailingStore {
            inner: store.clone(),
        }),
        PipelineConfig::default(),
    );
    let err = failing.ingest(&RequestContext::anonymous(), upload("late")).unwrap_err();
    assert!(matches!(err, PipelineError::Persistence(_)));
    assert_eq!(snapshot(&store), before);
}

#[test]
fn sqlite_store_backward_clock_step_keeps_creation_order() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("ledger.sqlite");
    let store = store_for(&path);
    let pipeline = IngestPipeline::new(SharedBatchStore::from_store(store.clone()), PipelineConfig {
        retention: RetentionPolicy::new(2),
        ..PipelineConfig::default()
    });
    let ctx = RequestContext::anonymous();
    pipeline.ingest(&ctx, upload("first")).unwrap();

    let future = unix_millis() + 3_600_000;
    let conn = rusqlite::Connection::open(&path).unwrap();
    conn.execute("UPDATE batches SET created_at_ms = ?1", [future]).unwrap();
    drop(conn);

    pipeline.ingest(&ctx, upload("second")).unwrap();
    pipeline.ingest(&ctx, upload("third")).unwrap();
    let listed = store.list_batches().unwrap();
    let names: Vec<&str> = listed.iter().map(|meta| meta.filename.as_str()).collect();
    assert_eq!(names, vec!["third.csv", "second.csv"]);
    assert!(listed.iter().all(|meta| meta.created_at_ms >= future));
}

// equipment-ledger-server/tests/common/mod.rs
// ============================================================================
// Module: Server Test Helpers
// Description: Recording audit sink, failing store, and handler fixtures.
// Purpose: Share fixtures across server integration tests.
// ============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]
#![allow(clippy::unwrap_used, reason = "Test-only helpers.")]

use std::sync::Arc;
use std::sync::Mutex;

use equipment_ledger_core::BatchId;
use equipment_ledger_core::BatchMeta;
use equipment_ledger_core::BatchStore;
use equipment_ledger_core::InMemoryBatchStore;
use equipment_ledger_core::IngestPipeline;
use equipment_ledger_core::PipelineConfig;
use equipment_ledger_core::SharedBatchStore;
use equipment_ledger_core::StoreError;
use equipment_ledger_core::StoredBatch;
use equipment_ledger_core::TextReportRenderer;
use equipment_ledger_core::TransactionWork;
use equipment_ledger_server::ApiHandler;
use equipment_ledger_server::AuditSink;
use equipment_ledger_server::IngestAuditEvent;
use equipment_ledger_server::RequestAuditEvent;
use equipment_ledger_server::UploadFile;

/// Header line shared by fixture uploads.
pub const HEADER: &str = "Equipment Name,Type,Flowrate,Pressure,Temperature";

/// Audit sink that keeps events in memory.
#[derive(Default)]
pub struct RecordingSink {
    /// Request events in emission order.
    pub requests: Mutex<Vec<RequestAuditEvent>>,
    /// Ingestion events in emission order.
    pub ingests: Mutex<Vec<IngestAuditEvent>>,
}

impl RecordingSink {
    /// Returns the most recent request event.
    pub fn last_request(&self) -> RequestAuditEvent {
        self.requests.lock().unwrap().last().cloned().unwrap()
    }

    /// Returns the number of ingestion events.
    pub fn ingest_count(&self) -> usize {
        self.ingests.lock().unwrap().len()
    }
}

impl AuditSink for RecordingSink {
    fn record(&self, event: &RequestAuditEvent) {
        self.requests.lock().unwrap().push(event.clone());
    }

    fn record_ingest(&self, event: &IngestAuditEvent) {
        self.ingests.lock().unwrap().push(event.clone());
    }
}

/// Store whose every operation fails.
pub struct FailingStore;

impl BatchStore for FailingStore {
    fn write_transaction(&self, _work: &mut TransactionWork<'_>) -> Result<(), StoreError> {
        Err(StoreError::Io("disk unavailable".to_string()))
    }

    fn list_batches(&self) -> Result<Vec<BatchMeta>, StoreError> {
        Err(StoreError::Io("disk unavailable".to_string()))
    }

    fn load_batch(&self, _batch_id: BatchId) -> Result<Option<StoredBatch>, StoreError> {
        Err(StoreError::Io("disk unavailable".to_string()))
    }
}

/// Builds a handler over `store` with default pipeline settings.
pub fn handler_over(store: SharedBatchStore, sink: &Arc<RecordingSink>) -> ApiHandler {
    let pipeline = IngestPipeline::new(store, PipelineConfig::default());
    let audit: Arc<dyn AuditSink> = Arc::clone(sink) as Arc<dyn AuditSink>;
    ApiHandler::new(pipeline, Arc::new(TextReportRenderer::default()), audit)
}

/// Builds an in-memory handler and its recording sink.
pub fn memory_handler() -> (ApiHandler, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::default());
    let handler = handler_over(SharedBatchStore::from_store(InMemoryBatchStore::new()), &sink);
    (handler, sink)
}

/// Builds a CSV upload from data rows.
pub fn csv_upload(filename: &str, rows: &[&str]) -> UploadFile {
    let mut body = String::from(HEADER);
    body.push('\n');
    for row in rows {
        body.push_str(row);
        body.push('\n');
    }
    UploadFile {
        filename: filename.to_string(),
        bytes: body.into_bytes(),
    }
}

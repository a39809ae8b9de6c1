// equipment-ledger-server/src/audit.rs
// ============================================================================
// Module: Equipment Ledger Audit Logging
// Description: Structured audit events for API requests and ingestions.
// Purpose: Emit JSON-lines audit records without a logging framework.
// Dependencies: equipment-ledger-core, serde, serde_json
// ============================================================================

//! ## Overview
//! Every API request produces one [`RequestAuditEvent`]. Uploads that reach
//! the confirmation gate or the store additionally produce an
//! [`IngestAuditEvent`] describing the batch, its missing-value count, and
//! any batches evicted by retention. Sinks write one JSON object per line.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use equipment_ledger_core::BatchId;
use equipment_ledger_core::OwnerRef;
use equipment_ledger_core::RequestContext;
use equipment_ledger_core::unix_millis;
use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Coarse request outcome recorded in audit events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestOutcome {
    /// Request succeeded.
    Ok,
    /// Upload was withheld pending confirmation of missing values.
    ConfirmationRequired,
    /// Request was rejected as invalid.
    ClientError,
    /// Referenced batch does not exist.
    NotFound,
    /// Server-side failure.
    InternalError,
}

/// API request audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct RequestAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: i64,
    /// Request identifier when provided.
    pub request_id: Option<String>,
    /// Endpoint label.
    pub endpoint: &'static str,
    /// Batch addressed or created by the request.
    pub batch_id: Option<BatchId>,
    /// Request outcome.
    pub outcome: RequestOutcome,
    /// HTTP status code returned.
    pub status: u16,
    /// Normalized error kind label.
    pub error_kind: Option<&'static str>,
    /// Owner supplied with the request.
    pub owner: Option<OwnerRef>,
}

/// Inputs for [`RequestAuditEvent::new`].
#[derive(Debug, Clone, Copy)]
pub struct RequestAuditParams {
    /// Endpoint label.
    pub endpoint: &'static str,
    /// Batch addressed or created by the request.
    pub batch_id: Option<BatchId>,
    /// Request outcome.
    pub outcome: RequestOutcome,
    /// HTTP status code returned.
    pub status: u16,
    /// Normalized error kind label.
    pub error_kind: Option<&'static str>,
}

impl RequestAuditEvent {
    /// Creates a request audit event stamped with the current time.
    #[must_use]
    pub fn new(ctx: &RequestContext, params: RequestAuditParams) -> Self {
        Self {
            event: "equipment_request",
            timestamp_ms: unix_millis(),
            request_id: ctx.request_id.clone(),
            endpoint: params.endpoint,
            batch_id: params.batch_id,
            outcome: params.outcome,
            status: params.status,
            error_kind: params.error_kind,
            owner: ctx.owner.clone(),
        }
    }
}

/// Ingestion audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct IngestAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: i64,
    /// Request identifier when provided.
    pub request_id: Option<String>,
    /// Uploaded filename.
    pub filename: String,
    /// Batch identifier when the upload was persisted.
    pub batch_id: Option<BatchId>,
    /// Number of data rows in the upload.
    pub row_count: u64,
    /// Number of absent required cells.
    pub missing_count: u64,
    /// Whether the caller confirmed missing values.
    pub confirmed: bool,
    /// Batches removed by retention in the same transaction.
    pub evicted: Vec<BatchId>,
    /// Owner supplied with the request.
    pub owner: Option<OwnerRef>,
}

/// Inputs for [`IngestAuditEvent::new`].
#[derive(Debug, Clone)]
pub struct IngestAuditParams {
    /// Uploaded filename.
    pub filename: String,
    /// Batch identifier when persisted.
    pub batch_id: Option<BatchId>,
    /// Number of data rows.
    pub row_count: u64,
    /// Number of absent required cells.
    pub missing_count: u64,
    /// Whether the caller confirmed missing values.
    pub confirmed: bool,
    /// Evicted batch identifiers.
    pub evicted: Vec<BatchId>,
}

impl IngestAuditEvent {
    /// Creates an ingestion audit event stamped with the current time.
    #[must_use]
    pub fn new(ctx: &RequestContext, params: IngestAuditParams) -> Self {
        Self {
            event: "equipment_ingest",
            timestamp_ms: unix_millis(),
            request_id: ctx.request_id.clone(),
            filename: params.filename,
            batch_id: params.batch_id,
            row_count: params.row_count,
            missing_count: params.missing_count,
            confirmed: params.confirmed,
            evicted: params.evicted,
            owner: ctx.owner.clone(),
        }
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Audit sink for API events.
pub trait AuditSink: Send + Sync {
    /// Record a request audit event.
    fn record(&self, event: &RequestAuditEvent);

    /// Record an ingestion audit event.
    fn record_ingest(&self, _event: &IngestAuditEvent) {}
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl AuditSink for StderrAuditSink {
    fn record(&self, event: &RequestAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(io::stderr(), "{payload}");
        }
    }

    fn record_ingest(&self, event: &IngestAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Appends one serialized line.
    fn append_line(&self, payload: &str) {
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

impl AuditSink for FileAuditSink {
    fn record(&self, event: &RequestAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            self.append_line(&payload);
        }
    }

    fn record_ingest(&self, event: &IngestAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            self.append_line(&payload);
        }
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _event: &RequestAuditEvent) {}

    fn record_ingest(&self, _event: &IngestAuditEvent) {}
}

// ============================================================================
// SECTION: Tests
// ============================================================================

// equipment-ledger-server/src/api.rs
// ============================================================================
// Module: Equipment Ledger API Handler
// Description: Transport-independent request handling for the ledger API.
// Purpose: Map pipeline outcomes to statuses, bodies, and audit events.
// Dependencies: equipment-ledger-core, axum (status codes), serde, serde_json
// ============================================================================

//! ## Overview
//! [`ApiHandler`] turns decoded requests into [`ApiResponse`] values. It owns
//! status mapping and audit emission so the HTTP transport and the CLI share
//! one behavior. Handler methods are synchronous and may block on the store;
//! async callers run them on a blocking thread.
//!
//! Client-side failures (missing file, wrong extension, schema, invalid cell,
//! parse) map to `400`; unknown batches map to `404`; store and renderer
//! failures map to `500` with a generic message.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use axum::http::StatusCode;
use equipment_ledger_core::BatchId;
use equipment_ledger_core::BatchMeta;
use equipment_ledger_core::IngestOutcome;
use equipment_ledger_core::IngestPipeline;
use equipment_ledger_core::PipelineError;
use equipment_ledger_core::RenderedReport;
use equipment_ledger_core::ReportRenderer;
use equipment_ledger_core::RequestContext;
use equipment_ledger_core::Summary;
use serde::Serialize;
use serde_json::Value;

use crate::audit::AuditSink;
use crate::audit::IngestAuditEvent;
use crate::audit::IngestAuditParams;
use crate::audit::RequestAuditEvent;
use crate::audit::RequestAuditParams;
use crate::audit::RequestOutcome;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Message returned for persisted uploads.
const UPLOAD_MESSAGE: &str = "file processed successfully";
/// Message returned when no file part was supplied.
const NO_FILE_MESSAGE: &str = "no file provided";
/// Message returned for unknown batches.
const NOT_FOUND_MESSAGE: &str = "batch not found";
/// Message returned for server-side failures.
const INTERNAL_MESSAGE: &str = "internal server error";

// ============================================================================
// SECTION: Types
// ============================================================================

/// Uploaded file decoded by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    /// Client-supplied filename.
    pub filename: String,
    /// Raw file bytes.
    pub bytes: Vec<u8>,
}

/// Transport-independent API response.
#[derive(Debug, Clone)]
pub enum ApiResponse {
    /// JSON body with a status code.
    Json {
        /// Response status.
        status: StatusCode,
        /// JSON payload.
        body: Value,
    },
    /// Rendered document served as an attachment.
    Document {
        /// Rendered report.
        report: RenderedReport,
    },
    /// Status without a body.
    Empty {
        /// Response status.
        status: StatusCode,
    },
}

impl ApiResponse {
    /// Returns the response status code.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Json {
                status, ..
            }
            | Self::Empty {
                status,
            } => *status,
            Self::Document {
                ..
            } => StatusCode::OK,
        }
    }

    /// Returns the JSON body, if any.
    #[must_use]
    pub const fn json(&self) -> Option<&Value> {
        match self {
            Self::Json {
                body, ..
            } => Some(body),
            Self::Document {
                ..
            }
            | Self::Empty {
                ..
            } => None,
        }
    }
}

/// Body returned for persisted uploads.
#[derive(Serialize)]
struct UploadBody<'a> {
    /// Confirmation message.
    message: &'static str,
    /// Identifier of the new batch.
    batch_id: BatchId,
    /// Metadata of the new batch.
    batch: &'a BatchMeta,
    /// Summary recomputed from the stored records.
    summary: &'a Summary,
    /// Absent required cells accepted with confirmation.
    missing_count: u64,
    /// Batches evicted by retention.
    evicted_batches: &'a [BatchId],
}

/// Body returned when missing values need confirmation.
#[derive(Serialize)]
struct ConfirmationBody {
    /// Human-readable reason.
    error: String,
    /// Always true; lets clients branch without parsing the message.
    requires_confirmation: bool,
    /// Absent required cells in the upload.
    missing_count: u64,
    /// Data rows in the upload.
    row_count: u64,
}

/// Body returned for schema failures.
#[derive(Serialize)]
struct SchemaErrorBody<'a> {
    /// Human-readable reason.
    error: String,
    /// Full required column list.
    required_columns: &'a [String],
    /// Required columns absent from the upload.
    missing_columns: &'a [String],
}

/// Body returned for other failures.
#[derive(Serialize)]
struct ErrorBody<'a> {
    /// Human-readable reason.
    error: &'a str,
}

/// Handler result before audit emission.
struct Reply {
    /// Audit outcome.
    outcome: RequestOutcome,
    /// Batch addressed by the request.
    batch_id: Option<BatchId>,
    /// Error category label.
    error_kind: Option<&'static str>,
    /// Response to return.
    response: ApiResponse,
}

impl Reply {
    /// Attaches the addressed batch.
    fn with_batch(mut self, batch_id: BatchId) -> Self {
        self.batch_id = Some(batch_id);
        self
    }
}

// ============================================================================
// SECTION: Handler
// ============================================================================

/// Transport-independent API handler.
#[derive(Clone)]
pub struct ApiHandler {
    /// Ingestion pipeline.
    pipeline: IngestPipeline,
    /// Renderer for printable reports.
    renderer: Arc<dyn ReportRenderer + Send + Sync>,
    /// Audit sink for request and ingestion events.
    audit: Arc<dyn AuditSink>,
}

impl ApiHandler {
    /// Creates a handler over a pipeline, renderer, and audit sink.
    #[must_use]
    pub fn new(
        pipeline: IngestPipeline,
        renderer: Arc<dyn ReportRenderer + Send + Sync>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            pipeline,
            renderer,
            audit,
        }
    }

    /// Returns the underlying pipeline.
    #[must_use]
    pub const fn pipeline(&self) -> &IngestPipeline {
        &self.pipeline
    }

    /// Handles an upload. `confirmed` acknowledges missing values.
    #[must_use]
    pub fn upload(
        &self,
        ctx: &RequestContext,
        file: Option<UploadFile>,
        confirmed: bool,
    ) -> ApiResponse {
        let reply = match file {
            None => error_reply(
                RequestOutcome::ClientError,
                StatusCode::BAD_REQUEST,
                Some("no_file"),
                NO_FILE_MESSAGE,
            ),
            Some(file) => self.ingest_file(ctx, &file, confirmed),
        };
        self.finish(ctx, "upload", reply)
    }

    /// Records an upload the transport could not decode.
    #[must_use]
    pub fn rejected_upload(
        &self,
        ctx: &RequestContext,
        status: StatusCode,
        message: &str,
    ) -> ApiResponse {
        let reply = error_reply(RequestOutcome::ClientError, status, Some("transport"), message);
        self.finish(ctx, "upload", reply)
    }

    /// Lists batch metadata newest-first.
    #[must_use]
    pub fn history(&self, ctx: &RequestContext) -> ApiResponse {
        let reply = match self.pipeline.list_batches() {
            Ok(batches) => json_reply(RequestOutcome::Ok, StatusCode::OK, &batches),
            Err(err) => error_for(&err),
        };
        self.finish(ctx, "history", reply)
    }

    /// Returns `{batch, rows, summary}` for a batch.
    #[must_use]
    pub fn data(&self, ctx: &RequestContext, raw_id: &str) -> ApiResponse {
        let reply = with_batch_id(raw_id, |batch_id| match self.pipeline.batch_data(batch_id) {
            Ok(view) => json_reply(RequestOutcome::Ok, StatusCode::OK, &view),
            Err(err) => error_for(&err),
        });
        self.finish(ctx, "data", reply)
    }

    /// Returns the summary of a batch.
    #[must_use]
    pub fn summary(&self, ctx: &RequestContext, raw_id: &str) -> ApiResponse {
        let reply = with_batch_id(raw_id, |batch_id| match self.pipeline.summary(batch_id) {
            Ok(summary) => json_reply(RequestOutcome::Ok, StatusCode::OK, &summary),
            Err(err) => error_for(&err),
        });
        self.finish(ctx, "summary", reply)
    }

    /// Renders the printable report of a batch.
    #[must_use]
    pub fn report(&self, ctx: &RequestContext, raw_id: &str) -> ApiResponse {
        let reply = with_batch_id(raw_id, |batch_id| {
            match self.pipeline.report(batch_id, self.renderer.as_ref()) {
                Ok(report) => Reply {
                    outcome: RequestOutcome::Ok,
                    batch_id: None,
                    error_kind: None,
                    response: ApiResponse::Document {
                        report,
                    },
                },
                Err(err) => error_for(&err),
            }
        });
        self.finish(ctx, "report", reply)
    }

    /// Deletes a batch and its records.
    #[must_use]
    pub fn delete(&self, ctx: &RequestContext, raw_id: &str) -> ApiResponse {
        let reply = with_batch_id(raw_id, |batch_id| match self.pipeline.delete_batch(batch_id) {
            Ok(()) => Reply {
                outcome: RequestOutcome::Ok,
                batch_id: None,
                error_kind: None,
                response: ApiResponse::Empty {
                    status: StatusCode::NO_CONTENT,
                },
            },
            Err(err) => error_for(&err),
        });
        self.finish(ctx, "delete", reply)
    }

    /// Runs an upload through the pipeline and records the ingestion.
    fn ingest_file(&self, ctx: &RequestContext, file: &UploadFile, confirmed: bool) -> Reply {
        match self.pipeline.ingest_csv(ctx, &file.filename, &file.bytes, confirmed) {
            Ok(IngestOutcome::Persisted(result)) => {
                let batch_id = result.batch_id();
                self.audit.record_ingest(&IngestAuditEvent::new(ctx, IngestAuditParams {
                    filename: file.filename.clone(),
                    batch_id: Some(batch_id),
                    row_count: result.summary.total_count,
                    missing_count: result.missing_count,
                    confirmed,
                    evicted: result.evicted_batches.clone(),
                }));
                let body = UploadBody {
                    message: UPLOAD_MESSAGE,
                    batch_id,
                    batch: &result.batch,
                    summary: &result.summary,
                    missing_count: result.missing_count,
                    evicted_batches: &result.evicted_batches,
                };
                json_reply(RequestOutcome::Ok, StatusCode::CREATED, &body).with_batch(batch_id)
            }
            Ok(IngestOutcome::ConfirmationRequired(pending)) => {
                self.audit.record_ingest(&IngestAuditEvent::new(ctx, IngestAuditParams {
                    filename: file.filename.clone(),
                    batch_id: None,
                    row_count: pending.row_count,
                    missing_count: pending.missing_count,
                    confirmed: false,
                    evicted: Vec::new(),
                }));
                let body = ConfirmationBody {
                    error: format!(
                        "upload has {} missing values; resubmit with confirm=true to store it",
                        pending.missing_count
                    ),
                    requires_confirmation: true,
                    missing_count: pending.missing_count,
                    row_count: pending.row_count,
                };
                json_reply(RequestOutcome::ConfirmationRequired, StatusCode::BAD_REQUEST, &body)
            }
            Err(err) => error_for(&err),
        }
    }

    /// Records the request audit event and returns the response.
    fn finish(&self, ctx: &RequestContext, endpoint: &'static str, reply: Reply) -> ApiResponse {
        self.audit.record(&RequestAuditEvent::new(ctx, RequestAuditParams {
            endpoint,
            batch_id: reply.batch_id,
            outcome: reply.outcome,
            status: reply.response.status().as_u16(),
            error_kind: reply.error_kind,
        }));
        reply.response
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Parses a batch identifier from a path segment.
///
/// Identifiers are positive integers; anything else names no batch.
#[must_use]
pub fn parse_batch_id(raw: &str) -> Option<BatchId> {
    raw.trim().parse::<i64>().ok().filter(|id| *id > 0).map(BatchId::new)
}

/// Resolves a raw identifier and runs `work`, or replies not found.
fn with_batch_id(raw_id: &str, work: impl FnOnce(BatchId) -> Reply) -> Reply {
    match parse_batch_id(raw_id) {
        Some(batch_id) => work(batch_id).with_batch(batch_id),
        None => error_reply(
            RequestOutcome::NotFound,
            StatusCode::NOT_FOUND,
            Some("not_found"),
            NOT_FOUND_MESSAGE,
        ),
    }
}

/// Serializes a JSON reply, degrading to an internal error on failure.
fn json_reply(outcome: RequestOutcome, status: StatusCode, body: &impl Serialize) -> Reply {
    match serde_json::to_value(body) {
        Ok(body) => Reply {
            outcome,
            batch_id: None,
            error_kind: None,
            response: ApiResponse::Json {
                status,
                body,
            },
        },
        Err(_) => error_reply(
            RequestOutcome::InternalError,
            StatusCode::INTERNAL_SERVER_ERROR,
            Some("serialization"),
            INTERNAL_MESSAGE,
        ),
    }
}

/// Builds an `{error}` reply.
fn error_reply(
    outcome: RequestOutcome,
    status: StatusCode,
    error_kind: Option<&'static str>,
    message: &str,
) -> Reply {
    let body = serde_json::to_value(ErrorBody {
        error: message,
    })
    .unwrap_or(Value::Null);
    Reply {
        outcome,
        batch_id: None,
        error_kind,
        response: ApiResponse::Json {
            status,
            body,
        },
    }
}

/// Maps a pipeline error to its reply.
fn error_for(err: &PipelineError) -> Reply {
    let kind = Some(err.kind());
    match err {
        PipelineError::Schema(schema) => {
            let mut reply = json_reply(
                RequestOutcome::ClientError,
                StatusCode::BAD_REQUEST,
                &SchemaErrorBody {
                    error: schema.to_string(),
                    required_columns: &schema.required,
                    missing_columns: &schema.missing,
                },
            );
            reply.error_kind = kind;
            reply
        }
        PipelineError::NotFound(_) => {
            error_reply(RequestOutcome::NotFound, StatusCode::NOT_FOUND, kind, NOT_FOUND_MESSAGE)
        }
        err if err.is_client_error() => {
            error_reply(RequestOutcome::ClientError, StatusCode::BAD_REQUEST, kind, &err.to_string())
        }
        _ => error_reply(
            RequestOutcome::InternalError,
            StatusCode::INTERNAL_SERVER_ERROR,
            kind,
            INTERNAL_MESSAGE,
        ),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

// equipment-ledger-core/src/runtime/pipeline.rs
// ============================================================================
// Module: Ingestion Pipeline
// Description: Ingest, browse, summary, report, and delete operations.
// Purpose: Wire the pipeline stages against a batch store.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Ingestion runs the stages in a fixed order: schema validation, cell
//! normalization, the confirmation gate, then one write transaction covering
//! retention eviction, batch creation, record insertion, and the summary read
//! back from the stored records. Nothing is persisted unless every step of
//! that transaction succeeds.
//!
//! Read operations never mutate the store and always recompute the summary
//! from the records they load.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::batch::BatchMeta;
use crate::core::batch::NewBatch;
use crate::core::identifiers::BatchId;
use crate::core::ingest::ConfirmationRequired;
use crate::core::ingest::IngestOutcome;
use crate::core::ingest::IngestRequest;
use crate::core::ingest::IngestResult;
use crate::core::ingest::RequestContext;
use crate::core::report::BatchView;
use crate::core::summary::Summary;
use crate::interfaces::BatchStore;
use crate::interfaces::RenderError;
use crate::interfaces::RenderedReport;
use crate::interfaces::ReportRenderer;
use crate::interfaces::StoreError;
use crate::runtime::aggregate::summarize;
use crate::runtime::assemble::ReportFormat;
use crate::runtime::assemble::assemble_view;
use crate::runtime::missing::CellError;
use crate::runtime::missing::GateDecision;
use crate::runtime::missing::confirmation_gate;
use crate::runtime::missing::normalize_table;
use crate::runtime::parse::ParseError;
use crate::runtime::parse::is_csv_filename;
use crate::runtime::parse::parse_csv_table;
use crate::runtime::retention::RetentionPolicy;
use crate::runtime::retention::enforce_retention;
use crate::runtime::schema::SchemaError;
use crate::runtime::schema::validate_schema;
use crate::runtime::store::SharedBatchStore;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Pipeline operation errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Upload filename does not carry a CSV extension.
    #[error("file must be a CSV")]
    UnsupportedFile(String),
    /// Upload could not be parsed as CSV.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// Required columns are absent.
    #[error(transparent)]
    Schema(#[from] SchemaError),
    /// A numeric cell is not a finite number.
    #[error(transparent)]
    InvalidCell(#[from] CellError),
    /// Batch identifier is unknown.
    #[error("batch {0} not found")]
    NotFound(BatchId),
    /// Store failed; no partial state was committed.
    #[error("persistence failure: {0}")]
    Persistence(#[from] StoreError),
    /// Report renderer failed.
    #[error(transparent)]
    Render(#[from] RenderError),
}

impl PipelineError {
    /// Returns true when the caller can fix the request and resubmit.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedFile(_) | Self::Parse(_) | Self::Schema(_) | Self::InvalidCell(_)
        )
    }

    /// Returns a stable label for the error category.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::UnsupportedFile(_) => "unsupported_file",
            Self::Parse(_) => "parse",
            Self::Schema(_) => "schema",
            Self::InvalidCell(_) => "invalid_cell",
            Self::NotFound(_) => "not_found",
            Self::Persistence(_) => "persistence",
            Self::Render(_) => "render",
        }
    }
}

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Pipeline tuning shared by every operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Retention window applied on ingestion.
    pub retention: RetentionPolicy,
    /// Display formatting for row views.
    pub report_format: ReportFormat,
}

// ============================================================================
// SECTION: Pipeline
// ============================================================================

/// Ingestion pipeline bound to a batch store.
#[derive(Clone)]
pub struct IngestPipeline {
    /// Backing batch store.
    store: SharedBatchStore,
    /// Pipeline configuration.
    config: PipelineConfig,
}

impl IngestPipeline {
    /// Creates a pipeline over `store`.
    #[must_use]
    pub const fn new(store: SharedBatchStore, config: PipelineConfig) -> Self {
        Self {
            store,
            config,
        }
    }

    /// Returns the pipeline configuration.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Checks the filename, parses CSV bytes, and ingests the table.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] for unsupported files, parse failures, and
    /// every error [`IngestPipeline::ingest`] can return.
    pub fn ingest_csv(
        &self,
        ctx: &RequestContext,
        filename: &str,
        bytes: &[u8],
        confirmed: bool,
    ) -> Result<IngestOutcome, PipelineError> {
        if !is_csv_filename(filename) {
            return Err(PipelineError::UnsupportedFile(filename.to_string()));
        }
        let table = parse_csv_table(bytes)?;
        self.ingest(ctx, IngestRequest {
            filename: filename.to_string(),
            table,
            confirmed,
        })
    }

    /// Validates and, when allowed, persists a parsed upload.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Schema`] or [`PipelineError::InvalidCell`]
    /// for rejected uploads and [`PipelineError::Persistence`] when the write
    /// transaction fails and is rolled back.
    pub fn ingest(
        &self,
        ctx: &RequestContext,
        request: IngestRequest,
    ) -> Result<IngestOutcome, PipelineError> {
        validate_schema(&request.table)?;
        let upload = normalize_table(&request.table)?;
        if let GateDecision::RequireConfirmation {
            missing_count,
        } = confirmation_gate(upload.missing_count, request.confirmed)
        {
            return Ok(IngestOutcome::ConfirmationRequired(ConfirmationRequired {
                missing_count,
                row_count: upload.records.len() as u64,
            }));
        }

        let new_batch = NewBatch {
            filename: request.filename,
            owner: ctx.owner.clone(),
        };
        let retention = self.config.retention;
        let mut committed: Option<(BatchMeta, Summary, Vec<BatchId>)> = None;
        self.store.write_transaction(&mut |tx| {
            let evicted = enforce_retention(tx, retention)?;
            let meta = tx.create_batch(&new_batch)?;
            tx.bulk_insert_records(meta.id, &upload.records)?;
            let summary = summarize(&tx.records_of(meta.id)?);
            committed = Some((meta, summary, evicted));
            Ok(())
        })?;
        let (batch, summary, evicted_batches) = committed.ok_or_else(|| {
            StoreError::Store("write transaction committed without a batch".to_string())
        })?;
        Ok(IngestOutcome::Persisted(IngestResult {
            batch,
            summary,
            missing_count: upload.missing_count,
            evicted_batches,
        }))
    }

    /// Returns batch metadata ordered newest-first.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Persistence`] when the store read fails.
    pub fn list_batches(&self) -> Result<Vec<BatchMeta>, PipelineError> {
        Ok(self.store.list_batches()?)
    }

    /// Returns batch metadata, row views, and the summary.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::NotFound`] for unknown batches.
    pub fn batch_data(&self, batch_id: BatchId) -> Result<BatchView, PipelineError> {
        let batch = self.store.load_batch(batch_id)?.ok_or(PipelineError::NotFound(batch_id))?;
        Ok(assemble_view(batch, &self.config.report_format))
    }

    /// Returns the summary of a batch, recomputed from its stored records.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::NotFound`] for unknown batches.
    pub fn summary(&self, batch_id: BatchId) -> Result<Summary, PipelineError> {
        let batch = self.store.load_batch(batch_id)?.ok_or(PipelineError::NotFound(batch_id))?;
        Ok(summarize(&batch.records))
    }

    /// Renders the report for a batch.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::NotFound`] for unknown batches and
    /// [`PipelineError::Render`] when the renderer fails.
    pub fn report(
        &self,
        batch_id: BatchId,
        renderer: &dyn ReportRenderer,
    ) -> Result<RenderedReport, PipelineError> {
        let view = self.batch_data(batch_id)?;
        Ok(renderer.render(&view)?)
    }

    /// Deletes a batch and its records.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::NotFound`] for unknown batches.
    pub fn delete_batch(&self, batch_id: BatchId) -> Result<(), PipelineError> {
        let mut deleted = false;
        self.store.write_transaction(&mut |tx| {
            deleted = tx.delete_batch(batch_id)?;
            Ok(())
        })?;
        if deleted { Ok(()) } else { Err(PipelineError::NotFound(batch_id)) }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

// equipment-ledger-core/src/interfaces/mod.rs
// ============================================================================
// Module: Equipment Ledger Interfaces
// Description: Backend-agnostic interfaces for batch storage and report rendering.
// Purpose: Define the contract surfaces used by the ingestion pipeline.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Interfaces define how the pipeline integrates with persistence and the
//! rendering layer without embedding backend-specific details. Stores must
//! apply a write transaction atomically: either every operation issued
//! through [`BatchTransaction`] becomes visible, or none does.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::BatchView;
use crate::core::batch::BatchMeta;
use crate::core::batch::NewBatch;
use crate::core::batch::StoredBatch;
use crate::core::identifiers::BatchId;
use crate::core::record::Record;
use crate::core::record::RecordFields;

// ============================================================================
// SECTION: Batch Store
// ============================================================================

/// Batch store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store I/O error.
    #[error("batch store io error: {0}")]
    Io(String),
    /// Store data is corrupted or fails integrity checks.
    #[error("batch store corruption: {0}")]
    Corrupt(String),
    /// Store data version is incompatible.
    #[error("batch store version mismatch: {0}")]
    VersionMismatch(String),
    /// Store data is invalid.
    #[error("batch store invalid data: {0}")]
    Invalid(String),
    /// Store reported an error.
    #[error("batch store error: {0}")]
    Store(String),
}

/// Operations available inside one atomic write transaction.
pub trait BatchTransaction {
    /// Creates a batch and returns its stored metadata.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the insert fails.
    fn create_batch(&mut self, batch: &NewBatch) -> Result<BatchMeta, StoreError>;

    /// Appends records to a batch in the given order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when any insert fails.
    fn bulk_insert_records(
        &mut self,
        batch_id: BatchId,
        records: &[RecordFields],
    ) -> Result<(), StoreError>;

    /// Returns the number of stored batches.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the count cannot be read.
    fn count_batches(&mut self) -> Result<u64, StoreError>;

    /// Returns up to `limit` batch ids ordered by creation time ascending.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    fn oldest_batches(&mut self, limit: u64) -> Result<Vec<BatchId>, StoreError>;

    /// Deletes a batch and all its records. Returns false when unknown.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the delete fails.
    fn delete_batch(&mut self, batch_id: BatchId) -> Result<bool, StoreError>;

    /// Returns the records of a batch in storage order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    fn records_of(&mut self, batch_id: BatchId) -> Result<Vec<Record>, StoreError>;
}

/// Unit of work executed inside [`BatchStore::write_transaction`].
pub type TransactionWork<'a> =
    dyn FnMut(&mut dyn BatchTransaction) -> Result<(), StoreError> + 'a;

/// Durable record of batches and their records.
pub trait BatchStore {
    /// Runs `work` inside a single write transaction that serializes against
    /// other writers. The transaction commits only when `work` returns `Ok`;
    /// any error rolls back every operation it issued.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when `work` fails or the commit fails.
    fn write_transaction(&self, work: &mut TransactionWork<'_>) -> Result<(), StoreError>;

    /// Lists batch metadata ordered newest-first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    fn list_batches(&self) -> Result<Vec<BatchMeta>, StoreError>;

    /// Loads a batch and its records from one committed snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    fn load_batch(&self, batch_id: BatchId) -> Result<Option<StoredBatch>, StoreError>;
}

// ============================================================================
// SECTION: Report Renderer
// ============================================================================

/// Rendering errors surfaced by report renderers.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Renderer failed to format the document.
    #[error("report render error: {0}")]
    Format(String),
}

/// Rendered report document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedReport {
    /// MIME type of the document.
    pub content_type: String,
    /// Suggested download filename.
    pub filename: String,
    /// Document bytes.
    pub bytes: Vec<u8>,
}

/// Rendering layer for printable reports. Implementations own layout and
/// typography; they must not alter which rows, flags, or numbers appear.
pub trait ReportRenderer {
    /// Renders a batch view into a document.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] when rendering fails.
    fn render(&self, view: &BatchView) -> Result<RenderedReport, RenderError>;
}

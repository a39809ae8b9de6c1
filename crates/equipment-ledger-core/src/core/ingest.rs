// equipment-ledger-core/src/core/ingest.rs
// ============================================================================
// Module: Ingestion Requests and Outcomes
// Description: Request context, ingest request, and the ingest outcome union.
// Purpose: Give callers an exhaustive, typed view of every ingestion result.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Ingestion has two non-error outcomes: the upload was persisted, or it was
//! held back because it contains missing cells and the caller did not
//! confirm. The second is an expected branch of a two-phase protocol, so it
//! is an [`IngestOutcome`] variant rather than an error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::batch::BatchMeta;
use crate::core::identifiers::BatchId;
use crate::core::identifiers::OwnerRef;
use crate::core::summary::Summary;
use crate::core::table::ParsedTable;

// ============================================================================
// SECTION: Request Types
// ============================================================================

/// Per-request caller context passed explicitly into every pipeline call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    /// Authenticated owner supplied by the outer layer, if any.
    pub owner: Option<OwnerRef>,
    /// Caller-supplied correlation identifier.
    pub request_id: Option<String>,
}

impl RequestContext {
    /// Returns a context with no owner and no request id.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Returns a copy of the context with an owner attached.
    #[must_use]
    pub fn with_owner(mut self, owner: OwnerRef) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Returns a copy of the context with a request id attached.
    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
}

/// Parsed upload submitted for ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestRequest {
    /// Original upload filename.
    pub filename: String,
    /// Parsed table contents.
    pub table: ParsedTable,
    /// Caller confirmed that missing values may be persisted.
    pub confirmed: bool,
}

// ============================================================================
// SECTION: Outcome Types
// ============================================================================

/// Result of a persisted ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestResult {
    /// Newly created batch.
    pub batch: BatchMeta,
    /// Summary computed from the stored records.
    pub summary: Summary,
    /// Number of absent cells across the required fields.
    pub missing_count: u64,
    /// Batches evicted by retention to make room, oldest first.
    pub evicted_batches: Vec<BatchId>,
}

impl IngestResult {
    /// Returns the new batch identifier.
    #[must_use]
    pub const fn batch_id(&self) -> BatchId {
        self.batch.id
    }
}

/// Upload held back pending caller confirmation; nothing was persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationRequired {
    /// Number of absent cells across the required fields.
    pub missing_count: u64,
    /// Number of data rows in the upload.
    pub row_count: u64,
}

/// Ingestion outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IngestOutcome {
    /// The upload was stored as a new batch.
    Persisted(IngestResult),
    /// The upload contains missing values and must be resubmitted with
    /// confirmation.
    ConfirmationRequired(ConfirmationRequired),
}

impl IngestOutcome {
    /// Returns the missing-cell count for either outcome.
    #[must_use]
    pub const fn missing_count(&self) -> u64 {
        match self {
            Self::Persisted(result) => result.missing_count,
            Self::ConfirmationRequired(pending) => pending.missing_count,
        }
    }
}

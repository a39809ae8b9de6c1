// equipment-ledger-core/src/core/batch.rs
// ============================================================================
// Module: Batches
// Description: Batch metadata and stored batch snapshots.
// Purpose: Describe one ingested upload and its owned records.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A batch is created atomically with its records during ingestion and is
//! destroyed only by retention eviction or explicit deletion, both of which
//! cascade to its records. Batches are immutable after creation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::BatchId;
use crate::core::identifiers::OwnerRef;
use crate::core::record::Record;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Metadata for a batch that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBatch {
    /// Original upload filename.
    pub filename: String,
    /// Owning user, when the caller supplied one.
    pub owner: Option<OwnerRef>,
}

/// Stored batch metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchMeta {
    /// Store-assigned identifier.
    pub id: BatchId,
    /// Original upload filename.
    pub filename: String,
    /// Owning user, when known.
    pub owner: Option<OwnerRef>,
    /// Creation time in unix epoch milliseconds.
    pub created_at_ms: i64,
}

/// Batch metadata together with its records in storage order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredBatch {
    /// Batch metadata.
    pub meta: BatchMeta,
    /// Records in storage order.
    pub records: Vec<Record>,
}

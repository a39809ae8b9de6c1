// equipment-ledger-core/src/core/report.rs
// ============================================================================
// Module: Report Data
// Description: Display-ready row views and the batch view consumed by renderers.
// Purpose: Fix the content contract between the pipeline and rendering layers.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Row views carry display-formatted values and a `flagged` marker for
//! invalid records. Renderers consume [`BatchView`] verbatim and own layout.

use serde::Deserialize;
use serde::Serialize;

use crate::core::batch::BatchMeta;
use crate::core::summary::Summary;

/// Display-formatted view of one stored record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowView {
    /// Zero-based storage position within the batch.
    pub position: u64,
    /// Equipment name or the missing placeholder.
    pub name: String,
    /// Category or the missing placeholder.
    pub category: String,
    /// Rounded flowrate or the missing placeholder.
    pub flowrate: String,
    /// Rounded pressure or the missing placeholder.
    pub pressure: String,
    /// Rounded temperature or the missing placeholder.
    pub temperature: String,
    /// True when the record fails the validity predicate.
    pub flagged: bool,
}

/// Batch metadata, row views in storage order, and the summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchView {
    /// Batch metadata.
    pub batch: BatchMeta,
    /// Row views in storage order.
    pub rows: Vec<RowView>,
    /// Summary computed from the same records.
    pub summary: Summary,
}

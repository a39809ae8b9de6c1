// equipment-ledger-core/src/core/summary.rs
// ============================================================================
// Module: Batch Summary
// Description: Derived, non-persisted statistics for one batch.
// Purpose: Define the summary shape shared by upload, browse, and report paths.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`Summary`] is never stored. It is recomputed from the live record set
//! of a batch on every request so that every caller sees the same numbers.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

/// Arithmetic means over valid records; zero when no record is valid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldAverages {
    /// Mean flowrate.
    pub flowrate: f64,
    /// Mean pressure.
    pub pressure: f64,
    /// Mean temperature.
    pub temperature: f64,
}

/// Summary statistics for one batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Number of records in the batch.
    pub total_count: u64,
    /// Number of records satisfying the validity predicate.
    pub valid_count: u64,
    /// Per-field means over valid records.
    pub averages: FieldAverages,
    /// Record count per distinct category among valid records. Consumers
    /// must treat this as an unordered mapping.
    pub type_distribution: BTreeMap<String, u64>,
}

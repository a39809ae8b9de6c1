// equipment-ledger-core/src/core/record.rs
// ============================================================================
// Module: Equipment Records
// Description: Stored equipment measurement rows and the validity predicate.
// Purpose: Define the immutable row shape and when a row counts as valid.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Each field of a record is independently nullable and reflects the source
//! cell at ingestion time; fields are never back-filled. A record is valid
//! iff all five fields are present and neither text field equals the
//! case-insensitive literal [`NAN_SENTINEL`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::BatchId;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Text value left behind by upstream parsers for not-a-number cells.
pub const NAN_SENTINEL: &str = "nan";

// ============================================================================
// SECTION: Record Fields
// ============================================================================

/// Measurement fields of one equipment row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordFields {
    /// Equipment name.
    pub name: Option<String>,
    /// Free-text equipment category ("Type" column).
    pub category: Option<String>,
    /// Flowrate measurement.
    pub flowrate: Option<f64>,
    /// Pressure measurement.
    pub pressure: Option<f64>,
    /// Temperature measurement.
    pub temperature: Option<f64>,
}

impl RecordFields {
    /// Returns true when every field is present and no text field is the
    /// `nan` sentinel.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        let text_ok = |value: &Option<String>| value.as_deref().is_some_and(|text| !is_sentinel(text));
        text_ok(&self.name)
            && text_ok(&self.category)
            && self.flowrate.is_some()
            && self.pressure.is_some()
            && self.temperature.is_some()
    }

    /// Returns the number of absent fields.
    #[must_use]
    pub fn absent_count(&self) -> u64 {
        let flags = [
            self.name.is_none(),
            self.category.is_none(),
            self.flowrate.is_none(),
            self.pressure.is_none(),
            self.temperature.is_none(),
        ];
        flags.iter().map(|absent| u64::from(*absent)).sum()
    }
}

/// Returns true when the text equals the `nan` sentinel, ignoring case.
#[must_use]
pub fn is_sentinel(text: &str) -> bool {
    text.eq_ignore_ascii_case(NAN_SENTINEL)
}

// ============================================================================
// SECTION: Record
// ============================================================================

/// Stored equipment row owned by exactly one batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Owning batch.
    pub batch_id: BatchId,
    /// Zero-based storage position within the batch.
    pub position: u64,
    /// Measurement fields.
    #[serde(flatten)]
    pub fields: RecordFields,
}

impl Record {
    /// Returns true when the record satisfies the validity predicate.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.fields.is_valid()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

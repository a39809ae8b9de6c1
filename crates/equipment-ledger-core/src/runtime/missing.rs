// equipment-ledger-core/src/runtime/missing.rs
// ============================================================================
// Module: Missing-Value Policy
// Description: Cell normalization, missing-cell counting, and the confirmation gate.
// Purpose: Turn raw table cells into record fields and decide whether to persist.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Every required cell is normalized before anything else looks at it:
//! - an absent cell, or text that trims to empty, becomes an absent field
//! - numeric cells that read as `NaN` are also treated as absent
//! - numeric cells that do not parse, or parse to an infinity, are rejected
//! - text cells are trimmed and kept verbatim, including the `nan` sentinel
//!
//! The missing count is the number of absent fields across all rows. The
//! confirmation gate then decides whether a table with missing values may be
//! persisted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::record::RecordFields;
use crate::core::table::ParsedTable;
use crate::core::table::RequiredColumn;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Numeric cell that could not be read as a finite number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid numeric value in row {row}, column {column}: {value}")]
pub struct CellError {
    /// One-based data row number.
    pub row: usize,
    /// Column header.
    pub column: String,
    /// Offending cell text.
    pub value: String,
}

/// Normalized record fields plus the missing-cell count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedUpload {
    /// Record fields in table order.
    pub records: Vec<RecordFields>,
    /// Absent cells across all rows and required fields.
    pub missing_count: u64,
}

/// Confirmation gate decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Ingestion may persist the upload.
    Proceed,
    /// Ingestion must stop and ask the caller to confirm.
    RequireConfirmation {
        /// Absent cells that triggered the gate.
        missing_count: u64,
    },
}

// ============================================================================
// SECTION: Normalization
// ============================================================================

/// Maps every row of a schema-checked table onto [`RecordFields`].
///
/// Columns that are not present in the table yield absent fields; callers
/// run schema validation first so that only short rows produce them.
///
/// # Errors
///
/// Returns [`CellError`] for the first numeric cell that is neither blank
/// nor a finite number.
pub fn normalize_table(table: &ParsedTable) -> Result<NormalizedUpload, CellError> {
    let indices = RequiredColumn::ALL.map(|column| table.column_index(column.header()));
    let mut upload = NormalizedUpload {
        records: Vec::with_capacity(table.row_count()),
        missing_count: 0,
    };
    for row in 0..table.row_count() {
        let cell = |column: RequiredColumn| {
            let index = indices[column_slot(column)]?;
            table.cell(row, index).map(str::trim).filter(|text| !text.is_empty())
        };
        let fields = RecordFields {
            name: cell(RequiredColumn::EquipmentName).map(str::to_string),
            category: cell(RequiredColumn::Type).map(str::to_string),
            flowrate: parse_measurement(row, RequiredColumn::Flowrate, cell(RequiredColumn::Flowrate))?,
            pressure: parse_measurement(row, RequiredColumn::Pressure, cell(RequiredColumn::Pressure))?,
            temperature: parse_measurement(
                row,
                RequiredColumn::Temperature,
                cell(RequiredColumn::Temperature),
            )?,
        };
        upload.missing_count += fields.absent_count();
        upload.records.push(fields);
    }
    Ok(upload)
}

/// Returns the slot of `column` within [`RequiredColumn::ALL`].
const fn column_slot(column: RequiredColumn) -> usize {
    match column {
        RequiredColumn::EquipmentName => 0,
        RequiredColumn::Type => 1,
        RequiredColumn::Flowrate => 2,
        RequiredColumn::Pressure => 3,
        RequiredColumn::Temperature => 4,
    }
}

/// Parses a trimmed, non-empty numeric cell.
fn parse_measurement(
    row: usize,
    column: RequiredColumn,
    text: Option<&str>,
) -> Result<Option<f64>, CellError> {
    let Some(text) = text else {
        return Ok(None);
    };
    let invalid = || CellError {
        row: row + 1,
        column: column.header().to_string(),
        value: text.to_string(),
    };
    let value: f64 = text.parse().map_err(|_| invalid())?;
    if value.is_nan() {
        return Ok(None);
    }
    if value.is_infinite() {
        return Err(invalid());
    }
    Ok(Some(value))
}

// ============================================================================
// SECTION: Confirmation Gate
// ============================================================================

/// Decides whether an upload with `missing_count` absent cells may proceed.
#[must_use]
pub const fn confirmation_gate(missing_count: u64, confirmed: bool) -> GateDecision {
    if missing_count > 0 && !confirmed {
        GateDecision::RequireConfirmation {
            missing_count,
        }
    } else {
        GateDecision::Proceed
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

// equipment-ledger-core/src/runtime/schema.rs
// ============================================================================
// Module: Schema Validation
// Description: Required-column check for parsed equipment tables.
// Purpose: Reject uploads that cannot be mapped onto the record shape.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Schema validation is a hard stop: a table missing any required column is
//! rejected before any other stage runs. Headers are compared exactly; the
//! parser is responsible for trimming them.

use thiserror::Error;

use crate::core::table::ParsedTable;
use crate::core::table::REQUIRED_COLUMNS;

/// Required columns absent from an upload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("CSV must contain columns: {}", required.join(", "))]
pub struct SchemaError {
    /// Required columns that were not found, in contract order.
    pub missing: Vec<String>,
    /// Full required column list, in contract order.
    pub required: Vec<String>,
}

/// Verifies that every required column is present in `table`.
///
/// # Errors
///
/// Returns [`SchemaError`] listing the absent columns and the full contract.
pub fn validate_schema(table: &ParsedTable) -> Result<(), SchemaError> {
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|column| table.column_index(column).is_none())
        .map(|column| (*column).to_string())
        .collect();
    if missing.is_empty() {
        return Ok(());
    }
    Err(SchemaError {
        missing,
        required: REQUIRED_COLUMNS.iter().map(|column| (*column).to_string()).collect(),
    })
}

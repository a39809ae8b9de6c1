// equipment-ledger-core/src/core/table.rs
// ============================================================================
// Module: Parsed Tables
// Description: Header-addressed table of raw cells delivered by file parsing.
// Purpose: Define the input shape consumed by schema validation and ingestion.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`ParsedTable`] is a header row plus data rows of optional raw cells. A
//! cell is `None` when the source had no value at all (for example a short
//! row); empty or whitespace-only text is kept verbatim here and normalized
//! later by the missing-value policy.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Required Columns
// ============================================================================

/// Required column headers, in contract order.
pub const REQUIRED_COLUMNS: [&str; 5] =
    ["Equipment Name", "Type", "Flowrate", "Pressure", "Temperature"];

/// Required columns of an equipment upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequiredColumn {
    /// Equipment name (text).
    EquipmentName,
    /// Equipment type / category (text).
    Type,
    /// Flowrate measurement (numeric).
    Flowrate,
    /// Pressure measurement (numeric).
    Pressure,
    /// Temperature measurement (numeric).
    Temperature,
}

impl RequiredColumn {
    /// All required columns in contract order.
    pub const ALL: [Self; 5] =
        [Self::EquipmentName, Self::Type, Self::Flowrate, Self::Pressure, Self::Temperature];

    /// Returns the header text for the column.
    #[must_use]
    pub const fn header(self) -> &'static str {
        match self {
            Self::EquipmentName => REQUIRED_COLUMNS[0],
            Self::Type => REQUIRED_COLUMNS[1],
            Self::Flowrate => REQUIRED_COLUMNS[2],
            Self::Pressure => REQUIRED_COLUMNS[3],
            Self::Temperature => REQUIRED_COLUMNS[4],
        }
    }

    /// Returns true when the column carries numeric measurements.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Flowrate | Self::Pressure | Self::Temperature)
    }
}

// ============================================================================
// SECTION: Parsed Table
// ============================================================================

/// Parsed tabular upload: header names plus rows of raw cells.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedTable {
    /// Column headers in source order.
    headers: Vec<String>,
    /// Data rows; each cell aligns with `headers` by position.
    rows: Vec<Vec<Option<String>>>,
}

impl ParsedTable {
    /// Creates a table from headers and rows of optional cells.
    #[must_use]
    pub const fn new(headers: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        Self {
            headers,
            rows,
        }
    }

    /// Creates a table from string slices, treating every cell as present.
    #[must_use]
    pub fn from_text_rows(headers: &[&str], rows: &[&[&str]]) -> Self {
        Self {
            headers: headers.iter().map(|header| (*header).to_string()).collect(),
            rows: rows
                .iter()
                .map(|row| row.iter().map(|cell| Some((*cell).to_string())).collect())
                .collect(),
        }
    }

    /// Returns the column headers.
    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Returns the data rows.
    #[must_use]
    pub fn rows(&self) -> &[Vec<Option<String>>] {
        &self.rows
    }

    /// Returns the number of data rows.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns the position of the named column, if present.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    /// Returns the raw cell at `row`/`column`, or `None` when absent.
    #[must_use]
    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows.get(row).and_then(|cells| cells.get(column)).and_then(|cell| cell.as_deref())
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

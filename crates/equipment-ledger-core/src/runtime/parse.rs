// equipment-ledger-core/src/runtime/parse.rs
// ============================================================================
// Module: CSV Parsing
// Description: Thin CSV reader producing parsed tables.
// Purpose: Deliver the header-addressed table shape consumed by validation.
// Dependencies: csv, thiserror
// ============================================================================

//! ## Overview
//! Parsing is deliberately shallow: it reads the header row and every data
//! row, trims headers, strips a leading UTF-8 byte-order mark, and tolerates
//! ragged rows. Cell contents are not interpreted here.

use csv::ErrorKind;
use csv::ReaderBuilder;
use csv::StringRecord;
use thiserror::Error;

use crate::core::table::ParsedTable;

/// UTF-8 byte-order mark.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// CSV parsing errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Upload is not valid UTF-8 text.
    #[error("CSV is not valid UTF-8 (line {line})")]
    Encoding {
        /// One-based line number where decoding failed.
        line: u64,
    },
    /// Upload is not well-formed CSV.
    #[error("malformed CSV: {0}")]
    Malformed(String),
}

impl From<csv::Error> for ParseError {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map_or(0, csv::Position::line);
        match err.kind() {
            ErrorKind::Utf8 {
                ..
            } => Self::Encoding {
                line,
            },
            _ => Self::Malformed(err.to_string()),
        }
    }
}

/// Returns true when `filename` carries a `.csv` extension, ignoring case.
#[must_use]
pub fn is_csv_filename(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .is_some_and(|(stem, extension)| !stem.is_empty() && extension.eq_ignore_ascii_case("csv"))
}

/// Parses CSV bytes into a [`ParsedTable`].
///
/// # Errors
///
/// Returns [`ParseError`] when the bytes are not UTF-8 or not valid CSV.
pub fn parse_csv_table(bytes: &[u8]) -> Result<ParsedTable, ParseError> {
    let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let mut reader = ReaderBuilder::new().has_headers(true).flexible(true).from_reader(body);
    let headers: Vec<String> =
        reader.headers()?.iter().map(|header| header.trim().to_string()).collect();
    let mut rows = Vec::new();
    let mut record = StringRecord::new();
    while reader.read_record(&mut record)? {
        rows.push(record.iter().map(|cell| Some(cell.to_string())).collect());
    }
    Ok(ParsedTable::new(headers, rows))
}

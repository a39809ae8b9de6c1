// equipment-ledger-core/src/runtime/assemble.rs
// ============================================================================
// Module: Report Data Assembler
// Description: Display-formatted row views and batch views.
// Purpose: Decide report content and per-row validity flags.
// Dependencies: crate::core, crate::runtime::aggregate
// ============================================================================

//! ## Overview
//! The assembler emits one [`RowView`] per stored record in storage order.
//! Numeric fields are rounded to a fixed number of decimal places, absent
//! fields become the configured placeholder, and invalid records are
//! flagged. The summary comes from [`summarize`] over the same records.

use serde::Deserialize;
use serde::Serialize;

use crate::core::batch::StoredBatch;
use crate::core::record::Record;
use crate::core::report::BatchView;
use crate::core::report::RowView;
use crate::runtime::aggregate::summarize;

/// Default decimal places for numeric cells.
pub const DEFAULT_DECIMAL_PLACES: usize = 2;
/// Default placeholder for absent cells.
pub const DEFAULT_MISSING_PLACEHOLDER: &str = "N/A";

/// Display formatting applied to row views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportFormat {
    /// Decimal places for numeric fields.
    pub decimal_places: usize,
    /// Text shown for absent fields.
    pub missing_placeholder: String,
}

impl Default for ReportFormat {
    fn default() -> Self {
        Self {
            decimal_places: DEFAULT_DECIMAL_PLACES,
            missing_placeholder: DEFAULT_MISSING_PLACEHOLDER.to_string(),
        }
    }
}

impl ReportFormat {
    /// Formats an optional text field.
    fn text(&self, value: Option<&str>) -> String {
        value.map_or_else(|| self.missing_placeholder.clone(), str::to_string)
    }

    /// Formats an optional numeric field.
    fn number(&self, value: Option<f64>) -> String {
        value.map_or_else(
            || self.missing_placeholder.clone(),
            |number| format!("{number:.precision$}", precision = self.decimal_places),
        )
    }
}

/// Builds row views for `records`, preserving their order.
#[must_use]
pub fn assemble_rows(records: &[Record], format: &ReportFormat) -> Vec<RowView> {
    records
        .iter()
        .map(|record| {
            let fields = &record.fields;
            RowView {
                position: record.position,
                name: format.text(fields.name.as_deref()),
                category: format.text(fields.category.as_deref()),
                flowrate: format.number(fields.flowrate),
                pressure: format.number(fields.pressure),
                temperature: format.number(fields.temperature),
                flagged: !record.is_valid(),
            }
        })
        .collect()
}

/// Builds the full batch view: metadata, row views, and summary.
#[must_use]
pub fn assemble_view(batch: StoredBatch, format: &ReportFormat) -> BatchView {
    let rows = assemble_rows(&batch.records, format);
    let summary = summarize(&batch.records);
    BatchView {
        batch: batch.meta,
        rows,
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::ReportFormat;
    use super::assemble_rows;
    use crate::core::identifiers::BatchId;
    use crate::core::record::Record;
    use crate::core::record::RecordFields;

    fn record(position: u64, fields: RecordFields) -> Record {
        Record {
            batch_id: BatchId::new(7),
            position,
            fields,
        }
    }

    #[test]
    fn rows_keep_order_and_flag_invalid_records() {
        let complete = RecordFields {
            name: Some("Pump-1".to_string()),
            category: Some("Pump".to_string()),
            flowrate: Some(10.456),
            pressure: Some(2.0),
            temperature: Some(80.125),
        };
        let partial = RecordFields {
            name: Some("Valve-1".to_string()),
            category: Some("Valve".to_string()),
            flowrate: None,
            ..complete.clone()
        };
        let rows = assemble_rows(&[record(0, complete), record(1, partial)], &ReportFormat::default());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].position, 0);
        assert_eq!(rows[0].flowrate, "10.46");
        assert_eq!(rows[0].pressure, "2.00");
        assert!(!rows[0].flagged);
        assert_eq!(rows[1].flowrate, "N/A");
        assert!(rows[1].flagged);
    }

    #[test]
    fn custom_format_changes_precision_and_placeholder() {
        let format = ReportFormat {
            decimal_places: 0,
            missing_placeholder: "-".to_string(),
        };
        let rows = assemble_rows(
            &[record(0, RecordFields {
                flowrate: Some(9.6),
                ..RecordFields::default()
            })],
            &format,
        );
        assert_eq!(rows[0].flowrate, "10");
        assert_eq!(rows[0].name, "-");
        assert!(rows[0].flagged);
    }
}

// equipment-ledger-core/src/runtime/render.rs
// ============================================================================
// Module: Plain-Text Report Renderer
// Description: Fixed-width text rendering of a batch view.
// Purpose: Provide a dependency-free renderer for downloads and the CLI.
// Dependencies: crate::interfaces
// ============================================================================

//! ## Overview
//! [`TextReportRenderer`] lays out a [`BatchView`] as an aligned text table
//! followed by the summary. Flagged rows are marked with `*` in the first
//! column. Row content and numbers are taken verbatim from the view.

use std::fmt::Write as _;

use crate::core::report::BatchView;
use crate::core::report::RowView;
use crate::interfaces::RenderError;
use crate::interfaces::RenderedReport;
use crate::interfaces::ReportRenderer;

/// Column titles in display order.
const COLUMN_TITLES: [&str; 5] = ["Equipment Name", "Type", "Flowrate", "Pressure", "Temperature"];

/// Plain-text report renderer.
#[derive(Debug, Clone, Copy)]
pub struct TextReportRenderer {
    /// Decimal places used for summary averages.
    decimal_places: usize,
}

impl TextReportRenderer {
    /// Creates a renderer printing averages with `decimal_places` digits.
    #[must_use]
    pub const fn new(decimal_places: usize) -> Self {
        Self {
            decimal_places,
        }
    }
}

impl Default for TextReportRenderer {
    fn default() -> Self {
        Self::new(crate::runtime::assemble::DEFAULT_DECIMAL_PLACES)
    }
}

/// Returns the display cells of a row in column order.
fn cells(row: &RowView) -> [&str; 5] {
    [
        row.name.as_str(),
        row.category.as_str(),
        row.flowrate.as_str(),
        row.pressure.as_str(),
        row.temperature.as_str(),
    ]
}

impl ReportRenderer for TextReportRenderer {
    fn render(&self, view: &BatchView) -> Result<RenderedReport, RenderError> {
        let mut widths = COLUMN_TITLES.map(str::len);
        for row in &view.rows {
            for (width, cell) in widths.iter_mut().zip(cells(row)) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let mut out = String::new();
        let fmt_err = |err: std::fmt::Error| RenderError::Format(err.to_string());
        writeln!(out, "Equipment Report: {}", view.batch.filename).map_err(fmt_err)?;
        writeln!(out, "Batch: {}", view.batch.id).map_err(fmt_err)?;
        writeln!(out, "Uploaded (unix ms): {}", view.batch.created_at_ms).map_err(fmt_err)?;
        if let Some(owner) = &view.batch.owner {
            writeln!(out, "Owner: {owner}").map_err(fmt_err)?;
        }
        writeln!(out).map_err(fmt_err)?;

        write!(out, "  ").map_err(fmt_err)?;
        write_cells(&mut out, &COLUMN_TITLES, &widths).map_err(fmt_err)?;
        for row in &view.rows {
            write!(out, "{} ", if row.flagged { '*' } else { ' ' }).map_err(fmt_err)?;
            write_cells(&mut out, &cells(row), &widths).map_err(fmt_err)?;
        }

        let summary = &view.summary;
        let places = self.decimal_places;
        writeln!(out).map_err(fmt_err)?;
        writeln!(out, "Total records: {}", summary.total_count).map_err(fmt_err)?;
        writeln!(out, "Valid records: {}", summary.valid_count).map_err(fmt_err)?;
        writeln!(out, "Average flowrate: {:.places$}", summary.averages.flowrate).map_err(fmt_err)?;
        writeln!(out, "Average pressure: {:.places$}", summary.averages.pressure).map_err(fmt_err)?;
        writeln!(out, "Average temperature: {:.places$}", summary.averages.temperature)
            .map_err(fmt_err)?;
        if !summary.type_distribution.is_empty() {
            writeln!(out, "Type distribution:").map_err(fmt_err)?;
            for (category, count) in &summary.type_distribution {
                writeln!(out, "  {category}: {count}").map_err(fmt_err)?;
            }
        }
        if view.rows.iter().any(|row| row.flagged) {
            writeln!(out).map_err(fmt_err)?;
            writeln!(out, "* record has missing or invalid values").map_err(fmt_err)?;
        }

        Ok(RenderedReport {
            content_type: "text/plain; charset=utf-8".to_string(),
            filename: format!("report_{}.txt", view.batch.id),
            bytes: out.into_bytes(),
        })
    }
}

/// Writes one padded table line.
fn write_cells(out: &mut String, cells: &[&str; 5], widths: &[usize; 5]) -> std::fmt::Result {
    for (index, (cell, width)) in cells.iter().zip(widths).enumerate() {
        let width = *width;
        if index > 0 {
            out.push_str("  ");
        }
        write!(out, "{cell:<width$}")?;
    }
    let trimmed = out.trim_end_matches(' ').len();
    out.truncate(trimmed);
    out.push('\n');
    Ok(())
}

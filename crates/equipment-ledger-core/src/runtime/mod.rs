// equipment-ledger-core/src/runtime/mod.rs
// ============================================================================
// Module: Equipment Ledger Runtime
// Description: Pipeline stages and the ingestion pipeline built from them.
// Purpose: Expose the validation, retention, aggregation, and report runtime.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Each stage is a small module with pure functions over core types. The
//! [`IngestPipeline`] wires them together against a [`crate::BatchStore`].

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod aggregate;
pub mod assemble;
pub mod missing;
pub mod parse;
pub mod pipeline;
pub mod render;
pub mod retention;
pub mod schema;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use aggregate::summarize;
pub use assemble::ReportFormat;
pub use assemble::assemble_rows;
pub use assemble::assemble_view;
pub use missing::CellError;
pub use missing::GateDecision;
pub use missing::NormalizedUpload;
pub use missing::confirmation_gate;
pub use missing::normalize_table;
pub use parse::ParseError;
pub use parse::is_csv_filename;
pub use parse::parse_csv_table;
pub use pipeline::IngestPipeline;
pub use pipeline::PipelineConfig;
pub use pipeline::PipelineError;
pub use render::TextReportRenderer;
pub use retention::RetentionPolicy;
pub use retention::enforce_retention;
pub use schema::SchemaError;
pub use schema::validate_schema;
pub use store::InMemoryBatchStore;
pub use store::SharedBatchStore;

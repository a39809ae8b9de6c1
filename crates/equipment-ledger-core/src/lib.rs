// equipment-ledger-core/src/lib.rs
// ============================================================================
// Module: Equipment Ledger Core Library
// Description: Public API surface for the Equipment Ledger core.
// Purpose: Expose core types, interfaces, and pipeline runtime.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Equipment Ledger core ingests tabular equipment measurements, validates
//! them against a fixed column contract, gates uploads with missing values
//! behind explicit confirmation, bounds retained history, and derives
//! summaries and report rows from stored records on every request. It is
//! storage-agnostic and integrates through the [`BatchStore`] interface.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::BatchStore;
pub use interfaces::BatchTransaction;
pub use interfaces::RenderError;
pub use interfaces::RenderedReport;
pub use interfaces::ReportRenderer;
pub use interfaces::StoreError;
pub use interfaces::TransactionWork;
pub use runtime::CellError;
pub use runtime::GateDecision;
pub use runtime::InMemoryBatchStore;
pub use runtime::IngestPipeline;
pub use runtime::NormalizedUpload;
pub use runtime::ParseError;
pub use runtime::PipelineConfig;
pub use runtime::PipelineError;
pub use runtime::ReportFormat;
pub use runtime::RetentionPolicy;
pub use runtime::SchemaError;
pub use runtime::SharedBatchStore;
pub use runtime::TextReportRenderer;

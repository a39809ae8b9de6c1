// equipment-ledger-core/src/core/mod.rs
// ============================================================================
// Module: Equipment Ledger Core Types
// Description: Canonical batch, record, table, and summary structures.
// Purpose: Provide stable, serializable types shared by every pipeline stage.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Core types define parsed tables, stored batches and records, derived
//! summaries, and the request/response values of each pipeline operation.
//! These types are the canonical source of truth for any derived API surface
//! (HTTP or CLI).

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod batch;
pub mod identifiers;
pub mod ingest;
pub mod record;
pub mod report;
pub mod summary;
pub mod table;
pub mod time;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use batch::BatchMeta;
pub use batch::NewBatch;
pub use batch::StoredBatch;
pub use identifiers::BatchId;
pub use identifiers::OwnerRef;
pub use ingest::ConfirmationRequired;
pub use ingest::IngestOutcome;
pub use ingest::IngestRequest;
pub use ingest::IngestResult;
pub use ingest::RequestContext;
pub use record::NAN_SENTINEL;
pub use record::Record;
pub use record::RecordFields;
pub use report::BatchView;
pub use report::RowView;
pub use summary::FieldAverages;
pub use summary::Summary;
pub use table::ParsedTable;
pub use table::REQUIRED_COLUMNS;
pub use table::RequiredColumn;
pub use time::unix_millis;
pub use time::unix_millis_not_before;

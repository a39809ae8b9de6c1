// equipment-ledger-server/src/lib.rs
// ============================================================================
// Module: Equipment Ledger Server Library
// Description: HTTP transport and audit logging for Equipment Ledger.
// Purpose: Bind the ingestion pipeline to an HTTP API.
// Dependencies: equipment-ledger-core, equipment-ledger-config, axum, tokio
// ============================================================================

//! ## Overview
//! The server crate exposes the ingestion pipeline over HTTP. Requests are
//! decoded by the axum transport in [`server`] and dispatched to the
//! transport-independent [`api::ApiHandler`], which owns status mapping and
//! audit emission. The CLI reuses the same handler for offline commands.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod api;
pub mod audit;
pub mod server;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use api::ApiHandler;
pub use api::ApiResponse;
pub use api::UploadFile;
pub use api::parse_batch_id;
pub use audit::AuditSink;
pub use audit::FileAuditSink;
pub use audit::IngestAuditEvent;
pub use audit::IngestAuditParams;
pub use audit::NoopAuditSink;
pub use audit::RequestAuditEvent;
pub use audit::RequestAuditParams;
pub use audit::RequestOutcome;
pub use audit::StderrAuditSink;
pub use server::LedgerServer;
pub use server::LedgerServerError;
pub use server::OWNER_HEADER;
pub use server::REQUEST_ID_HEADER;
pub use server::build_audit_sink;
pub use server::build_handler;
pub use server::build_pipeline;
pub use server::into_http;

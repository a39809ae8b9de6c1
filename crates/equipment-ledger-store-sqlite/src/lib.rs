// equipment-ledger-store-sqlite/src/lib.rs
// ============================================================================
// Module: SQLite Batch Store
// Description: Durable BatchStore backend using SQLite.
// Purpose: Provide persistent batch and record storage for Equipment Ledger.
// Dependencies: equipment-ledger-core, rusqlite
// ============================================================================

//! ## Overview
//! This crate provides a SQLite-backed [`equipment_ledger_core::BatchStore`].
//! Batches and records live in two tables linked by a cascading foreign key.
//! Write transactions take the database write lock up front so that the
//! retention check, eviction, and insert sequence cannot interleave with
//! another writer, including writers in other processes.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::SqliteBatchStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;

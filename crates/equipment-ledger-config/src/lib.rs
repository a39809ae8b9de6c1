// equipment-ledger-config/src/lib.rs
// ============================================================================
// Module: Equipment Ledger Config Library
// Description: Canonical config model and validation.
// Purpose: Single source of truth for equipment-ledger.toml semantics.
// Dependencies: equipment-ledger-core, serde, toml
// ============================================================================

//! ## Overview
//! `equipment-ledger-config` defines the configuration model for the
//! Equipment Ledger server and CLI. Every section has defaults, and
//! validation fails closed on any out-of-range or inconsistent value.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;

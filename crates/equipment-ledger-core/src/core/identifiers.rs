// equipment-ledger-core/src/core/identifiers.rs
// ============================================================================
// Module: Equipment Ledger Identifiers
// Description: Opaque identifiers for batches and batch owners.
// Purpose: Provide strongly typed, serializable IDs with stable string forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Batch identifiers are store-assigned integers that are never reused, so an
//! evicted batch id keeps resolving to "not found". Owner references are
//! opaque strings supplied per request by the caller; the pipeline never
//! derives them from ambient state.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

/// Batch identifier assigned by the batch store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchId(i64);

impl BatchId {
    /// Creates a new batch identifier.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw identifier value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<i64> for BatchId {
    fn from(value: i64) -> Self {
        Self::new(value)
    }
}

/// Reference to the user that owns a batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerRef(String);

impl OwnerRef {
    /// Creates a new owner reference.
    #[must_use]
    pub fn new(owner: impl Into<String>) -> Self {
        Self(owner.into())
    }

    /// Returns the reference as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for OwnerRef {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for OwnerRef {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

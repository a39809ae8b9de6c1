// equipment-ledger-core/src/runtime/retention.rs
// ============================================================================
// Module: Retention Manager
// Description: Bounded batch history enforced at ingestion time.
// Purpose: Evict the oldest batches so a new batch fits within the window.
// Dependencies: crate::interfaces
// ============================================================================

//! ## Overview
//! Retention runs inside the ingestion write transaction, before the new
//! batch is created. When the store already holds `max_batches` or more, the
//! oldest batches are deleted until `max_batches - 1` remain. The bound is
//! never enforced on reads.

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::BatchId;
use crate::interfaces::BatchTransaction;
use crate::interfaces::StoreError;

/// Default number of retained batches.
pub const DEFAULT_MAX_BATCHES: u64 = 5;

/// Retention window configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    /// Maximum number of batches held after an ingestion commits.
    max_batches: u64,
}

impl RetentionPolicy {
    /// Creates a policy; a zero bound is raised to one.
    #[must_use]
    pub const fn new(max_batches: u64) -> Self {
        Self {
            max_batches: if max_batches == 0 { 1 } else { max_batches },
        }
    }

    /// Returns the retention bound.
    #[must_use]
    pub const fn max_batches(self) -> u64 {
        self.max_batches
    }

    /// Returns how many batches must be evicted before inserting one more
    /// into a store holding `current` batches.
    #[must_use]
    pub const fn evictions_for(self, current: u64) -> u64 {
        if current < self.max_batches { 0 } else { current - (self.max_batches - 1) }
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BATCHES)
    }
}

/// Evicts the oldest batches so one more batch fits the window.
///
/// Must be called inside the same transaction that creates the new batch.
///
/// # Errors
///
/// Returns [`StoreError`] when counting, listing, or deleting fails.
pub fn enforce_retention(
    tx: &mut dyn BatchTransaction,
    policy: RetentionPolicy,
) -> Result<Vec<BatchId>, StoreError> {
    let current = tx.count_batches()?;
    let evict = policy.evictions_for(current);
    if evict == 0 {
        return Ok(Vec::new());
    }
    let victims = tx.oldest_batches(evict)?;
    for batch_id in &victims {
        if !tx.delete_batch(*batch_id)? {
            return Err(StoreError::Corrupt(format!(
                "retention victim {batch_id} vanished during eviction"
            )));
        }
    }
    Ok(victims)
}

// equipment-ledger-core/src/core/time.rs
// ============================================================================
// Module: Equipment Ledger Time
// Description: Wall-clock helpers for batch creation timestamps.
// Purpose: Provide one clamped conversion from system time to epoch millis.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Batch creation times are stored as unix epoch milliseconds. Ordering ties
//! within the same millisecond are broken by batch id in every store. New
//! batches never get a timestamp earlier than the latest stored batch, so a
//! wall clock stepping backwards cannot reorder retention.

use std::time::SystemTime;
use std::time::UNIX_EPOCH;

/// Returns the current unix epoch in milliseconds.
#[must_use]
pub fn unix_millis() -> i64 {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    i64::try_from(now.as_millis()).unwrap_or(i64::MAX)
}

/// Returns the current unix epoch in milliseconds, raised to `latest` when
/// the wall clock reads earlier than the newest stored batch.
#[must_use]
pub fn unix_millis_not_before(latest: Option<i64>) -> i64 {
    let now = unix_millis();
    latest.map_or(now, |latest| now.max(latest))
}

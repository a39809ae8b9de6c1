// equipment-ledger-core/src/runtime/aggregate.rs
// ============================================================================
// Module: Aggregation Engine
// Description: Summary statistics derived from stored records.
// Purpose: Produce the one summary every caller sees for a batch.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! [`summarize`] is a pure function of the record sequence. Means are
//! updated incrementally in storage order, so repeated calls over the same
//! records give bit-identical values and finite inputs never overflow to an
//! infinite mean. Means and the category distribution cover valid records
//! only; with no valid record every mean is zero.

use std::collections::BTreeMap;

use crate::core::record::Record;
use crate::core::summary::FieldAverages;
use crate::core::summary::Summary;

/// Computes the summary of a batch from its records in storage order.
#[must_use]
pub fn summarize(records: &[Record]) -> Summary {
    let mut valid_count: u64 = 0;
    let mut means = FieldAverages::default();
    let mut type_distribution: BTreeMap<String, u64> = BTreeMap::new();

    for record in records {
        let fields = &record.fields;
        let (Some(category), Some(flowrate), Some(pressure), Some(temperature)) =
            (fields.category.as_ref(), fields.flowrate, fields.pressure, fields.temperature)
        else {
            continue;
        };
        if !fields.is_valid() {
            continue;
        }
        valid_count += 1;
        means.flowrate = running_mean(means.flowrate, flowrate, valid_count);
        means.pressure = running_mean(means.pressure, pressure, valid_count);
        means.temperature = running_mean(means.temperature, temperature, valid_count);
        *type_distribution.entry(category.clone()).or_insert(0) += 1;
    }

    Summary {
        total_count: records.len() as u64,
        valid_count,
        averages: means,
        type_distribution,
    }
}

/// Folds the `count`-th value into the mean of the previous `count - 1`.
///
/// The update is a convex combination of the previous mean and `value`, so
/// it stays within the range of the inputs.
#[allow(clippy::cast_precision_loss, reason = "Record counts stay far below 2^52.")]
fn running_mean(mean: f64, value: f64, count: u64) -> f64 {
    let divisor = count as f64;
    mean + (value / divisor - mean / divisor)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp, reason = "Exact values are representable in these fixtures.")]

    use super::summarize;
    use crate::core::identifiers::BatchId;
    use crate::core::record::Record;
    use crate::core::record::RecordFields;

    fn record(position: u64, category: &str, flowrate: Option<f64>) -> Record {
        Record {
            batch_id: BatchId::new(1),
            position,
            fields: RecordFields {
                name: Some(format!("unit-{position}")),
                category: Some(category.to_string()),
                flowrate,
                pressure: Some(2.0),
                temperature: Some(50.0),
            },
        }
    }

    #[test]
    fn means_exclude_invalid_records() {
        let records = vec![record(0, "Pump", Some(10.0)), record(1, "Pump", Some(20.0)), record(2, "Valve", None)];
        let summary = summarize(&records);
        assert_eq!(summary.total_count, 3);
        assert_eq!(summary.valid_count, 2);
        assert_eq!(summary.averages.flowrate, 15.0);
        assert_eq!(summary.type_distribution.get("Pump"), Some(&2));
        assert_eq!(summary.type_distribution.get("Valve"), None);
    }

    #[test]
    fn nan_category_is_excluded_from_distribution() {
        let records = vec![record(0, "NAN", Some(10.0)), record(1, "Pump", Some(30.0))];
        let summary = summarize(&records);
        assert_eq!(summary.valid_count, 1);
        assert_eq!(summary.averages.flowrate, 30.0);
        assert_eq!(summary.type_distribution.len(), 1);
    }

    #[test]
    fn means_of_extreme_values_stay_finite() {
        let records = vec![record(0, "Pump", Some(1e308)), record(1, "Pump", Some(1e308))];
        let summary = summarize(&records);
        assert!(summary.averages.flowrate.is_finite());
        assert_eq!(summary.averages.flowrate, 1e308);

        let opposite = vec![record(0, "Pump", Some(1e308)), record(1, "Pump", Some(-1e308))];
        assert_eq!(summarize(&opposite).averages.flowrate, 0.0);
    }

    #[test]
    fn empty_batch_yields_zero_summary() {
        let summary = summarize(&[]);
        assert_eq!(summary.total_count, 0);
        assert_eq!(summary.valid_count, 0);
        assert_eq!(summary.averages.flowrate, 0.0);
        assert_eq!(summary.averages.pressure, 0.0);
        assert_eq!(summary.averages.temperature, 0.0);
        assert!(summary.type_distribution.is_empty());
    }
}

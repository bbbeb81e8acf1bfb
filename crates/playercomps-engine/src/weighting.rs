// Positional application of a weight table to a standardized matrix.

use ndarray::{Array1, Array2};
use playercomps_core::WeightTable;
use std::collections::HashSet;
use tracing::debug;

/// Multiply column `j` of `values` by the weight configured for
/// `feature_names[j]` (1.0 when unlisted). Shape is unchanged.
pub fn apply_weights(
    mut values: Array2<f64>,
    feature_names: &[String],
    weights: &WeightTable,
) -> Array2<f64> {
    debug_assert_eq!(values.ncols(), feature_names.len());
    let multipliers = Array1::from(weights.weight_vector(feature_names));
    values *= &multipliers;

    let weighted = multipliers.iter().filter(|&&w| w != 1.0).count();
    debug!(
        "applied weights: {} of {} features carry a non-default weight",
        weighted,
        feature_names.len()
    );
    values
}

/// Stats named in `weights` that match no feature column, sorted.
///
/// Usually a typo in weights.toml, or a profile meant for a table that
/// was not loaded.
pub fn unmatched_weights<'a>(weights: &'a WeightTable, feature_names: &[String]) -> Vec<&'a str> {
    let present: HashSet<&str> = feature_names.iter().map(String::as_str).collect();
    let mut unmatched: Vec<&str> = weights
        .stats()
        .filter(|stat| !present.contains(stat))
        .collect();
    unmatched.sort_unstable();
    unmatched
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

// Per-column standardization (z-scores) over the full season population.

use ndarray::{Array2, ArrayView1, Axis};

// ---------------------------------------------------------------------------
// Pool statistics
// ---------------------------------------------------------------------------

/// Mean and standard deviation for a single feature across all rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoolStats {
    pub mean: f64,
    pub stdev: f64,
}

/// Threshold below which standard deviation is treated as zero.
const STDEV_EPSILON: f64 = 1e-9;

impl PoolStats {
    /// Every value in the column is (approximately) the same.
    pub fn is_constant(&self) -> bool {
        self.stdev < STDEV_EPSILON
    }
}

/// Compute mean and standard deviation for a column of values.
///
/// Returns `PoolStats { mean: 0.0, stdev: 0.0 }` for an empty column.
/// Uses the population standard deviation (N denominator), since the rows
/// are the whole dataset rather than a sample.
pub fn compute_pool_stats(values: ArrayView1<f64>) -> PoolStats {
    if values.is_empty() {
        return PoolStats {
            mean: 0.0,
            stdev: 0.0,
        };
    }
    let n = values.len() as f64;
    let mean = values.sum() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    PoolStats {
        mean,
        stdev: variance.sqrt(),
    }
}

/// Compute a z-score given a value and pool stats.
///
/// Returns 0.0 if the standard deviation is approximately zero, so a
/// constant column contributes nothing instead of NaN.
pub fn compute_zscore(value: f64, stats: &PoolStats) -> f64 {
    if stats.is_constant() {
        return 0.0;
    }
    (value - stats.mean) / stats.stdev
}

// ---------------------------------------------------------------------------
// Standardizer
// ---------------------------------------------------------------------------

/// Column statistics fitted on one feature matrix.
///
/// Only valid for the matrix it was fitted on; refit whenever the rows or
/// columns change.
#[derive(Debug, Clone)]
pub struct Standardizer {
    stats: Vec<PoolStats>,
}

impl Standardizer {
    pub fn fit(values: &Array2<f64>) -> Self {
        let stats = values
            .axis_iter(Axis(1))
            .map(compute_pool_stats)
            .collect();
        Self { stats }
    }

    /// Z-score every cell against its column's stats. Output shape equals
    /// input shape.
    pub fn transform(&self, values: &Array2<f64>) -> Array2<f64> {
        debug_assert_eq!(values.ncols(), self.stats.len());
        let mut scaled = values.clone();
        for (mut column, stats) in scaled.axis_iter_mut(Axis(1)).zip(self.stats.iter()) {
            column.mapv_inplace(|v| compute_zscore(v, stats));
        }
        scaled
    }

    pub fn column_stats(&self) -> &[PoolStats] {
        &self.stats
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

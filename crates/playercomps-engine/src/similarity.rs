// Dense pairwise cosine similarity over weighted feature vectors.

use ndarray::{Array1, Array2, ArrayView1, Axis};
use tracing::info;

/// Cosine similarity between two vectors.
///
/// Defined as 0.0 when either vector has zero length, so ranking never sees
/// NaN.
pub fn cosine_similarity(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    cosine_with_norms(a, b, l2_norm(a), l2_norm(b))
}

fn l2_norm(v: ArrayView1<f64>) -> f64 {
    v.dot(&v).sqrt()
}

/// Cosine similarity with both norms already known. Clamped to [-1, 1].
fn cosine_with_norms(a: ArrayView1<f64>, b: ArrayView1<f64>, norm_a: f64, norm_b: f64) -> f64 {
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (a.dot(&b) / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

/// Square, symmetric matrix of row-to-row cosine similarities. Immutable
/// once computed.
#[derive(Debug, Clone)]
pub struct SimilarityMatrix {
    values: Array2<f64>,
    zero_vectors: usize,
}

impl SimilarityMatrix {
    /// Compute similarity for every pair of rows in `vectors`.
    ///
    /// Only the upper triangle is computed and mirrored, so `get(i, j)` and
    /// `get(j, i)` are bit-identical. The diagonal is exactly 1.0 for
    /// non-zero rows and 0.0 for all-zero rows.
    pub fn compute(vectors: &Array2<f64>) -> Self {
        let n = vectors.nrows();
        let norms: Array1<f64> = vectors.axis_iter(Axis(0)).map(l2_norm).collect();
        let zero_vectors = norms.iter().filter(|&&norm| norm == 0.0).count();

        let mut values = Array2::<f64>::zeros((n, n));
        for i in 0..n {
            if norms[i] == 0.0 {
                continue;
            }
            values[(i, i)] = 1.0;
            let row_i = vectors.row(i);
            for j in (i + 1)..n {
                let sim = cosine_with_norms(row_i, vectors.row(j), norms[i], norms[j]);
                values[(i, j)] = sim;
                values[(j, i)] = sim;
            }
        }

        info!(
            "computed {}x{} similarity matrix over {} features ({} zero vectors)",
            n,
            n,
            vectors.ncols(),
            zero_vectors
        );

        Self {
            values,
            zero_vectors,
        }
    }

    pub fn len(&self) -> usize {
        self.values.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[(i, j)]
    }

    /// Similarity of row `i` to every row, in row order.
    pub fn row(&self, i: usize) -> ArrayView1<'_, f64> {
        self.values.row(i)
    }

    /// Rows whose weighted vector is all zeros.
    pub fn zero_vectors(&self) -> usize {
        self.zero_vectors
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

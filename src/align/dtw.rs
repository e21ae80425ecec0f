//! Monotonic sequence alignment
//!
//! [`SequenceAligner`] is the seam the alignment engine consumes: any
//! implementation that returns a monotonic, endpoint-covering warping path
//! works. The default [`DtwAligner`] is classic dynamic time warping over
//! scalar sequences with symmetric steps: fill the accumulated-cost matrix,
//! then backtrace from the far corner to the origin.

/// Sequence alignment seam
pub trait SequenceAligner {
    /// Align two scalar sequences and return the warping path
    ///
    /// The path is an ordered list of `(i, j)` index pairs from
    /// `(0, 0)` to `(a.len()-1, b.len()-1)`, non-decreasing in both
    /// coordinates. Either input being empty yields an empty path.
    fn align(&self, a: &[f32], b: &[f32]) -> Vec<(usize, usize)>;
}

/// Dynamic time warping with Euclidean distance on scalars
#[derive(Debug, Clone, Default)]
pub struct DtwAligner;

impl SequenceAligner for DtwAligner {
    fn align(&self, a: &[f32], b: &[f32]) -> Vec<(usize, usize)> {
        if a.is_empty() || b.is_empty() {
            return Vec::new();
        }

        let n = a.len();
        let m = b.len();
        let dist = |i: usize, j: usize| (a[i] - b[j]).abs();

        // Accumulated cost, row-major n x m
        let mut acc = vec![0.0f32; n * m];
        acc[0] = dist(0, 0);
        for j in 1..m {
            acc[j] = acc[j - 1] + dist(0, j);
        }
        for i in 1..n {
            acc[i * m] = acc[(i - 1) * m] + dist(i, 0);
            for j in 1..m {
                let diagonal = acc[(i - 1) * m + j - 1];
                let up = acc[(i - 1) * m + j];
                let left = acc[i * m + j - 1];
                acc[i * m + j] = dist(i, j) + diagonal.min(up).min(left);
            }
        }

        // Backtrace from the far corner, preferring the diagonal on ties
        let mut path = Vec::with_capacity(n + m);
        let (mut i, mut j) = (n - 1, m - 1);
        path.push((i, j));
        while i > 0 || j > 0 {
            if i == 0 {
                j -= 1;
            } else if j == 0 {
                i -= 1;
            } else {
                let diagonal = acc[(i - 1) * m + j - 1];
                let up = acc[(i - 1) * m + j];
                let left = acc[i * m + j - 1];
                if diagonal <= up && diagonal <= left {
                    i -= 1;
                    j -= 1;
                } else if up <= left {
                    i -= 1;
                } else {
                    j -= 1;
                }
            }
            path.push((i, j));
        }

        path.reverse();

        log::debug!(
            "DTW aligned {}x{} sequences, path length {}",
            n,
            m,
            path.len()
        );

        path
    }
}

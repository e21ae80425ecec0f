//! Curve resampling onto uniform time grids
//!
//! The alignment stage compares curves sampled at irregular times (tempo
//! points sit at beat midpoints, loudness points at frame centers), so both
//! are first projected onto uniform grids by linear interpolation. Grid
//! points outside a curve's span clamp to its boundary values; nothing is
//! extrapolated.

use crate::error::AnalysisError;

/// One sample of a scalar curve
#[derive(Debug, Clone, Copy)]
pub struct CurvePoint {
    /// Time in seconds
    pub t: f32,

    /// Value at `t`
    pub value: f32,
}

/// Build a uniform grid `0, step, 2*step, ...` strictly below `duration_sec`
pub fn uniform_grid(duration_sec: f32, step: f32) -> Vec<f32> {
    if step <= 0.0 || duration_sec <= 0.0 {
        return Vec::new();
    }
    (0..)
        .map(|i| i as f32 * step)
        .take_while(|&t| t < duration_sec)
        .collect()
}

/// Resample a curve onto a grid by linear interpolation
///
/// The input need not be sorted; it is ordered by `t` before interpolation.
/// Grid points before the first curve point take the first value, points
/// after the last take the last value.
///
/// # Errors
///
/// Returns `AnalysisError::InsufficientData` for an empty input curve; a
/// zero curve is never synthesized in its place.
pub fn resample_curve(points: &[CurvePoint], grid: &[f32]) -> Result<Vec<f32>, AnalysisError> {
    if points.is_empty() {
        return Err(AnalysisError::InsufficientData(
            "Cannot resample an empty curve".to_string(),
        ));
    }

    let mut sorted = points.to_vec();
    sorted.sort_by(|a, b| a.t.partial_cmp(&b.t).unwrap_or(std::cmp::Ordering::Equal));

    let resampled = grid
        .iter()
        .map(|&t| {
            // Index of the first point at or after t
            let idx = sorted.partition_point(|p| p.t < t);
            if idx == 0 {
                return sorted[0].value;
            }
            if idx == sorted.len() {
                return sorted[sorted.len() - 1].value;
            }
            let left = sorted[idx - 1];
            let right = sorted[idx];
            let span = right.t - left.t;
            if span <= f32::EPSILON {
                return left.value;
            }
            let frac = (t - left.t) / span;
            left.value + (right.value - left.value) * frac
        })
        .collect();

    Ok(resampled)
}

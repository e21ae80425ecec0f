//! Relative loudness extraction
//!
//! Computes short-time RMS energy over overlapping frames and expresses it
//! in decibels relative to the loudest frame of the same recording. The
//! scale is deliberately relative, not an absolute loudness standard: the
//! loudest frame is exactly 0 dB and everything else is negative, which is
//! all the downstream alignment and insight stages need.

use crate::analysis::result::{LoudnessAnalysis, LoudnessCurvePoint, LoudnessSummary};
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::preprocessing::silence::trim_silence;

/// Numerical stability epsilon for energy flooring
const EPSILON: f32 = 1e-10;

/// Extract the loudness analysis of a recording
///
/// Trims silence, frames the signal (`config.frame_size` /
/// `config.hop_size`), and converts per-frame RMS to dB relative to the
/// loudest frame. A signal shorter than one analysis frame yields an empty
/// curve and no summary rather than a guessed one.
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` when the sample rate is zero.
pub fn extract_loudness(
    samples: &[f32],
    sample_rate: u32,
    config: &AnalysisConfig,
) -> Result<LoudnessAnalysis, AnalysisError> {
    if sample_rate == 0 {
        return Err(AnalysisError::InvalidInput("Invalid sample rate: 0".to_string()));
    }

    let duration_sec = samples.len() as f32 / sample_rate as f32;
    let trimmed = trim_silence(samples, sample_rate, config);

    let (analysis, analyzed_duration_sec) = if trimmed.samples.len() < config.frame_size {
        (samples, duration_sec)
    } else {
        let trimmed_duration = trimmed.samples.len() as f32 / sample_rate as f32;
        (trimmed.samples.as_slice(), trimmed_duration)
    };

    if analysis.len() < config.frame_size {
        log::debug!(
            "Signal shorter than one analysis frame ({} samples), returning empty loudness curve",
            analysis.len()
        );
        return Ok(LoudnessAnalysis {
            duration_sec,
            analyzed_duration_sec,
            trim: trimmed.info,
            curve: Vec::new(),
            summary: None,
        });
    }

    // Per-frame RMS, floored to keep the dB conversion finite
    let num_frames = (analysis.len() - config.frame_size) / config.hop_size + 1;
    let mut frame_rms = Vec::with_capacity(num_frames);
    for i in 0..num_frames {
        let start = i * config.hop_size;
        let frame = &analysis[start..start + config.frame_size];
        let sum_sq: f32 = frame.iter().map(|&x| x * x).sum();
        frame_rms.push((sum_sq / config.frame_size as f32).sqrt().max(EPSILON));
    }

    let max_rms = frame_rms.iter().copied().fold(EPSILON, f32::max);

    let curve: Vec<LoudnessCurvePoint> = frame_rms
        .iter()
        .enumerate()
        .map(|(i, &rms)| LoudnessCurvePoint {
            t: (i * config.hop_size + config.frame_size / 2) as f32 / sample_rate as f32,
            rms_db: 20.0 * (rms / max_rms).log10(),
        })
        .collect();

    let dbs: Vec<f32> = curve.iter().map(|p| p.rms_db).collect();
    let mean_db = dbs.iter().sum::<f32>() / dbs.len() as f32;
    let dynamic_range_db = percentile(&dbs, 0.95) - percentile(&dbs, 0.05);

    log::debug!(
        "Loudness extraction: {} frames, mean {:.1} dB, dynamic range {:.1} dB",
        curve.len(),
        mean_db,
        dynamic_range_db
    );

    Ok(LoudnessAnalysis {
        duration_sec,
        analyzed_duration_sec,
        trim: trimmed.info,
        curve,
        summary: Some(LoudnessSummary {
            mean_db,
            dynamic_range_db,
        }),
    })
}

/// Linear-interpolated percentile of an unsorted sample, `q` in [0, 1]
fn percentile(values: &[f32], q: f32) -> f32 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let rank = q * (sorted.len() - 1) as f32;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    let frac = rank - lo as f32;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: u32 = 44100;

    fn sine(duration_sec: f32, amplitude: f32) -> Vec<f32> {
        let n = (duration_sec * SR as f32) as usize;
        (0..n)
            .map(|i| (i as f32 * 440.0 * 2.0 * std::f32::consts::PI / SR as f32).sin() * amplitude)
            .collect()
    }

    #[test]
    fn test_loudest_frame_is_zero_db() {
        let samples = sine(2.0, 0.5);
        let config = AnalysisConfig::default();

        let analysis = extract_loudness(&samples, SR, &config).unwrap();

        assert!(!analysis.curve.is_empty());
        let max_db = analysis
            .curve
            .iter()
            .map(|p| p.rms_db)
            .fold(f32::NEG_INFINITY, f32::max);
        assert_eq!(max_db, 0.0);
        for point in &analysis.curve {
            assert!(point.rms_db <= 0.0);
        }
    }

    #[test]
    fn test_quiet_section_measures_below_loud_section() {
        let mut samples = sine(2.0, 0.8);
        samples.extend(sine(2.0, 0.1));
        let config = AnalysisConfig::default();

        let analysis = extract_loudness(&samples, SR, &config).unwrap();
        let summary = analysis.summary.unwrap();

        // 0.8 vs 0.1 amplitude is ~18 dB apart
        assert!(summary.dynamic_range_db > 10.0);
        assert!(summary.mean_db < 0.0);

        let first = analysis.curve.first().unwrap().rms_db;
        let last = analysis.curve.last().unwrap().rms_db;
        assert!(first > last);
    }

    #[test]
    fn test_curve_times_increase_by_hop() {
        let samples = sine(1.0, 0.5);
        let config = AnalysisConfig::default();

        let analysis = extract_loudness(&samples, SR, &config).unwrap();

        let hop_sec = config.hop_size as f32 / SR as f32;
        for pair in analysis.curve.windows(2) {
            assert!((pair[1].t - pair[0].t - hop_sec).abs() < 1e-6);
        }
    }

    #[test]
    fn test_short_signal_gives_empty_curve_and_no_summary() {
        let config = AnalysisConfig::default();
        let samples = vec![0.5f32; 1000]; // below one frame

        let analysis = extract_loudness(&samples, SR, &config).unwrap();

        assert!(analysis.curve.is_empty());
        assert!(analysis.summary.is_none());
    }

    #[test]
    fn test_zero_sample_rate_is_invalid() {
        let config = AnalysisConfig::default();
        assert!(extract_loudness(&[0.5; 4096], 0, &config).is_err());
    }

    #[test]
    fn test_percentile_interpolates() {
        let values = vec![0.0, 1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&values, 0.0), 0.0);
        assert_eq!(percentile(&values, 1.0), 4.0);
        assert_eq!(percentile(&values, 0.5), 2.0);
        assert!((percentile(&values, 0.25) - 1.0).abs() < 1e-6);
        assert!((percentile(&values, 0.95) - 3.8).abs() < 1e-5);
    }

    #[test]
    fn test_silent_signal_still_relative() {
        // All-silent frames are floored to the same epsilon, so every frame
        // sits at the 0 dB reference
        let config = AnalysisConfig::default();
        let samples = vec![0.0f32; SR as usize];

        let analysis = extract_loudness(&samples, SR, &config).unwrap();

        for point in &analysis.curve {
            assert_eq!(point.rms_db, 0.0);
        }
    }
}

//! Silence detection and trimming
//!
//! Removes low-energy regions from the start and end of a recording before
//! measurement. The trim is energy based: short-time RMS frames are compared
//! against the loudest frame, and frames more than the configured threshold
//! below it are treated as silent.
//!
//! Trimming never fails; any input it cannot judge (empty signal, unknown
//! sample rate, no complete analysis frame, fully silent signal) degrades to
//! a no-op trim that keeps the whole signal.

use crate::analysis::result::TrimInfo;
use crate::config::AnalysisConfig;

/// Numerical stability epsilon
const EPSILON: f32 = 1e-10;

/// A trimmed signal with the offsets that were removed
#[derive(Debug, Clone)]
pub struct TrimResult {
    /// The kept region of the signal
    pub samples: Vec<f32>,

    /// Where the kept region sits on the original timeline
    pub info: TrimInfo,
}

/// Trim leading and trailing silence from a recording
///
/// # Arguments
///
/// * `samples` - Mono audio samples
/// * `sample_rate` - Sample rate in Hz
/// * `config` - Analysis configuration (`trim_threshold_db`, `frame_size`,
///   `hop_size`)
///
/// # Returns
///
/// The trimmed samples and the trim window on the original timeline. The
/// window invariant `0 <= start <= end <= duration` always holds.
pub fn trim_silence(samples: &[f32], sample_rate: u32, config: &AnalysisConfig) -> TrimResult {
    if samples.is_empty() || sample_rate == 0 {
        return TrimResult {
            samples: samples.to_vec(),
            info: TrimInfo {
                start_offset_sec: 0.0,
                end_offset_sec: 0.0,
                threshold_db: config.trim_threshold_db,
            },
        };
    }

    let duration = samples.len() as f32 / sample_rate as f32;
    let keep_all = |samples: &[f32]| TrimResult {
        samples: samples.to_vec(),
        info: TrimInfo {
            start_offset_sec: 0.0,
            end_offset_sec: duration,
            threshold_db: config.trim_threshold_db,
        },
    };

    if samples.len() < config.frame_size {
        // No complete analysis frame to judge
        return keep_all(samples);
    }

    // Short-time RMS per frame
    let num_frames = (samples.len() - config.frame_size) / config.hop_size + 1;
    let mut frame_rms = Vec::with_capacity(num_frames);
    for i in 0..num_frames {
        let start = i * config.hop_size;
        let frame = &samples[start..start + config.frame_size];
        let sum_sq: f32 = frame.iter().map(|&x| x * x).sum();
        frame_rms.push((sum_sq / config.frame_size as f32).sqrt());
    }

    let max_rms = frame_rms.iter().copied().fold(0.0f32, f32::max);
    if max_rms <= EPSILON {
        log::debug!("Signal is silent throughout, skipping trim");
        return keep_all(samples);
    }

    // dB relative to the loudest frame; silent when below -threshold
    let is_loud = |rms: f32| {
        let db = 20.0 * (rms.max(EPSILON) / max_rms).log10();
        db > -config.trim_threshold_db
    };

    let first = frame_rms.iter().position(|&rms| is_loud(rms));
    let last = frame_rms.iter().rposition(|&rms| is_loud(rms));

    let (first, last) = match (first, last) {
        (Some(first), Some(last)) => (first, last),
        _ => return keep_all(samples),
    };

    let start_sample = first * config.hop_size;
    let end_sample = (last * config.hop_size + config.frame_size).min(samples.len());

    log::debug!(
        "Trimmed {} -> {} samples (frames {}..={} of {})",
        samples.len(),
        end_sample - start_sample,
        first,
        last,
        num_frames
    );

    TrimResult {
        samples: samples[start_sample..end_sample].to_vec(),
        info: TrimInfo {
            start_offset_sec: start_sample as f32 / sample_rate as f32,
            end_offset_sec: end_sample as f32 / sample_rate as f32,
            threshold_db: config.trim_threshold_db,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: u32 = 44100;

    /// One second of silence, one second of tone, one second of silence
    fn padded_tone() -> Vec<f32> {
        let mut samples = vec![0.0f32; SR as usize * 3];
        for (i, sample) in samples[SR as usize..2 * SR as usize].iter_mut().enumerate() {
            *sample = (i as f32 * 440.0 * 2.0 * std::f32::consts::PI / SR as f32).sin() * 0.5;
        }
        samples
    }

    #[test]
    fn test_trim_removes_leading_and_trailing_silence() {
        let samples = padded_tone();
        let config = AnalysisConfig::default();

        let result = trim_silence(&samples, SR, &config);

        assert!(result.samples.len() < samples.len());
        // The tone occupies [1.0, 2.0]; allow one frame of slack
        let frame_sec = config.frame_size as f32 / SR as f32;
        assert!((result.info.start_offset_sec - 1.0).abs() < frame_sec);
        assert!((result.info.end_offset_sec - 2.0).abs() < frame_sec);
        assert!(result.info.start_offset_sec <= result.info.end_offset_sec);
    }

    #[test]
    fn test_trim_window_invariant() {
        let samples = padded_tone();
        let config = AnalysisConfig::default();

        let result = trim_silence(&samples, SR, &config);
        let duration = samples.len() as f32 / SR as f32;

        assert!(result.info.start_offset_sec >= 0.0);
        assert!(result.info.end_offset_sec <= duration);
    }

    #[test]
    fn test_trim_empty_input_is_noop() {
        let config = AnalysisConfig::default();
        let result = trim_silence(&[], SR, &config);

        assert!(result.samples.is_empty());
        assert_eq!(result.info.start_offset_sec, 0.0);
        assert_eq!(result.info.end_offset_sec, 0.0);
    }

    #[test]
    fn test_trim_unknown_sample_rate_is_noop() {
        let config = AnalysisConfig::default();
        let samples = vec![0.5f32; 4096];
        let result = trim_silence(&samples, 0, &config);

        assert_eq!(result.samples.len(), samples.len());
        assert_eq!(result.info.start_offset_sec, 0.0);
        assert_eq!(result.info.end_offset_sec, 0.0);
    }

    #[test]
    fn test_trim_silent_signal_keeps_everything() {
        let config = AnalysisConfig::default();
        let samples = vec![0.0f32; SR as usize];
        let result = trim_silence(&samples, SR, &config);

        assert_eq!(result.samples.len(), samples.len());
        assert_eq!(result.info.start_offset_sec, 0.0);
        assert!((result.info.end_offset_sec - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_trim_loud_signal_keeps_everything() {
        let config = AnalysisConfig::default();
        let samples: Vec<f32> = (0..SR as usize)
            .map(|i| (i as f32 * 220.0 * 2.0 * std::f32::consts::PI / SR as f32).sin() * 0.8)
            .collect();
        let result = trim_silence(&samples, SR, &config);

        assert_eq!(result.info.start_offset_sec, 0.0);
    }

    #[test]
    fn test_trim_threshold_override() {
        let samples = padded_tone();
        // A huge threshold treats everything as loud
        let config = AnalysisConfig {
            trim_threshold_db: 200.0,
            ..AnalysisConfig::default()
        };
        let result = trim_silence(&samples, SR, &config);

        assert_eq!(result.samples.len(), samples.len());
        assert_eq!(result.info.threshold_db, 200.0);
    }
}

//! Onset envelope and beat tracking
//!
//! The tempo extractor only needs three things from a beat tracker: an
//! onset-strength envelope, an aggregate tempo estimate with beat positions,
//! and a frame-to-seconds conversion. [`BeatTracker`] is that seam, so the
//! default energy-flux tracker can be swapped for a heavier one without
//! touching the extraction pipeline.
//!
//! The default [`EnergyFluxTracker`] works in three steps:
//!
//! 1. Onset envelope: half-wave rectified frame-to-frame RMS energy
//!    difference, `flux[n] = max(0, E[n] - E[n-1])`
//! 2. Aggregate tempo: FFT-accelerated autocorrelation of the envelope,
//!    `ACF = IFFT(|FFT(envelope)|^2)`, peak lag within the BPM range
//! 3. Beats: local envelope maxima picked around the periodic grid anchored
//!    at the strongest onset

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

/// Numerical stability epsilon
const EPSILON: f32 = 1e-10;

/// Beat/onset detection seam consumed by the tempo extractor
///
/// Implementations must return beat positions as frame indices into the
/// envelope, sorted ascending. A tracker that finds nothing returns a tempo
/// estimate of 0 and no beats; the extractor degrades gracefully from there.
pub trait BeatTracker {
    /// Compute an onset-strength envelope, one value per analysis frame
    fn onset_envelope(&self, samples: &[f32], sample_rate: u32, hop_size: usize) -> Vec<f32>;

    /// Estimate an aggregate tempo and beat positions from an envelope
    ///
    /// Returns `(tempo_estimate_bpm, beat_frame_indices)`.
    fn track_beats(&self, envelope: &[f32], sample_rate: u32, hop_size: usize)
        -> (f32, Vec<usize>);
}

/// Convert envelope frame indices to seconds
pub fn frames_to_time(frames: &[usize], sample_rate: u32, hop_size: usize) -> Vec<f32> {
    frames
        .iter()
        .map(|&frame| (frame * hop_size) as f32 / sample_rate as f32)
        .collect()
}

/// Default beat tracker based on RMS energy flux
#[derive(Debug, Clone)]
pub struct EnergyFluxTracker {
    /// Frame size for the energy envelope (default: 2048)
    pub frame_size: usize,

    /// Minimum tempo considered by the autocorrelation search (default: 40.0)
    pub min_bpm: f32,

    /// Maximum tempo considered by the autocorrelation search (default: 240.0)
    pub max_bpm: f32,
}

impl Default for EnergyFluxTracker {
    fn default() -> Self {
        Self {
            frame_size: 2048,
            min_bpm: 40.0,
            max_bpm: 240.0,
        }
    }
}

impl BeatTracker for EnergyFluxTracker {
    fn onset_envelope(&self, samples: &[f32], _sample_rate: u32, hop_size: usize) -> Vec<f32> {
        if samples.len() < self.frame_size || hop_size == 0 {
            return Vec::new();
        }

        let num_frames = (samples.len() - self.frame_size) / hop_size + 1;
        let mut energies = Vec::with_capacity(num_frames);
        for i in 0..num_frames {
            let start = i * hop_size;
            let frame = &samples[start..start + self.frame_size];
            let sum_sq: f32 = frame.iter().map(|&x| x * x).sum();
            energies.push((sum_sq / self.frame_size as f32).sqrt());
        }

        // Half-wave rectified first difference; the leading frame has no
        // predecessor and contributes zero strength
        let mut envelope = Vec::with_capacity(num_frames);
        envelope.push(0.0);
        for i in 1..num_frames {
            envelope.push((energies[i] - energies[i - 1]).max(0.0));
        }

        envelope
    }

    fn track_beats(
        &self,
        envelope: &[f32],
        sample_rate: u32,
        hop_size: usize,
    ) -> (f32, Vec<usize>) {
        if envelope.len() < 2 || sample_rate == 0 || hop_size == 0 {
            return (0.0, Vec::new());
        }

        let max_strength = envelope.iter().copied().fold(0.0f32, f32::max);
        if max_strength <= EPSILON {
            log::debug!("Onset envelope is flat, no beats to track");
            return (0.0, Vec::new());
        }

        // Lag bounds from the BPM range: lag = 60 * sr / (bpm * hop)
        let frames_per_minute = 60.0 * sample_rate as f32 / hop_size as f32;
        let lag_min = (frames_per_minute / self.max_bpm).ceil() as usize;
        let lag_max = (frames_per_minute / self.min_bpm).floor() as usize;

        let acf = autocorrelation_fft(envelope);
        let lag_max = lag_max.min(acf.len().saturating_sub(1));
        if lag_min == 0 || lag_min >= lag_max {
            log::warn!(
                "Envelope too short for tempo search: {} frames, lag range [{}, {}]",
                envelope.len(),
                lag_min,
                lag_max
            );
            return (0.0, Vec::new());
        }

        // Strongest periodicity in range
        let mut best_lag = lag_min;
        let mut best_value = acf[lag_min];
        for (lag, &value) in acf.iter().enumerate().take(lag_max + 1).skip(lag_min) {
            if value > best_value {
                best_value = value;
                best_lag = lag;
            }
        }

        if best_value <= EPSILON {
            return (0.0, Vec::new());
        }

        let tempo_bpm = frames_per_minute / best_lag as f32;
        let beats = pick_beats(envelope, best_lag);

        log::debug!(
            "Tracked {} beats at {:.1} BPM (lag {} frames)",
            beats.len(),
            tempo_bpm,
            best_lag
        );

        (tempo_bpm, beats)
    }
}

/// Autocorrelation via `ACF = IFFT(|FFT(signal)|^2)`
fn autocorrelation_fft(signal: &[f32]) -> Vec<f32> {
    let n = signal.len();
    let fft_size = (2 * n).next_power_of_two();

    let mut buffer: Vec<Complex<f32>> = signal.iter().map(|&x| Complex::new(x, 0.0)).collect();
    buffer.resize(fft_size, Complex::new(0.0, 0.0));

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(fft_size);
    fft.process(&mut buffer);

    for x in &mut buffer {
        *x = *x * x.conj();
    }

    let ifft = planner.plan_fft_inverse(fft_size);
    ifft.process(&mut buffer);

    let scale = 1.0 / fft_size as f32;
    buffer[..n].iter().map(|x| (x.re * scale).max(0.0)).collect()
}

/// Pick beat frames by walking the periodic grid out from the strongest
/// onset, snapping each prediction to the local envelope maximum
fn pick_beats(envelope: &[f32], period: usize) -> Vec<usize> {
    let tolerance = (period / 5).max(1);

    let anchor = envelope
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0);

    let snap = |predicted: usize| -> usize {
        let lo = predicted.saturating_sub(tolerance);
        let hi = (predicted + tolerance).min(envelope.len() - 1);
        let mut best = predicted.min(envelope.len() - 1);
        for i in lo..=hi {
            if envelope[i] > envelope[best] {
                best = i;
            }
        }
        best
    };

    let mut beats = vec![anchor];

    // Forward from the anchor; the next prediction always advances past the
    // current one even when snapping pulls against the walk direction
    let mut predicted = anchor + period;
    while predicted < envelope.len() {
        let snapped = snap(predicted);
        beats.push(snapped);
        predicted = (snapped + period).max(predicted + 1);
    }

    // Backward from the anchor
    let mut predicted = anchor as i64 - period as i64;
    while predicted >= 0 {
        let snapped = snap(predicted as usize);
        beats.push(snapped);
        predicted = (snapped as i64 - period as i64).min(predicted - 1);
    }

    beats.sort_unstable();
    beats.dedup();
    beats
}

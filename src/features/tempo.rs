//! Tempo curve extraction
//!
//! Converts beat timestamps into an instantaneous-tempo curve with summary
//! statistics, an octave-ambiguity interpretation, and unstable-segment
//! events.
//!
//! # Algorithm
//!
//! 1. Trim silence; fall back to the untrimmed signal when the trimmed one
//!    is shorter than the analysis window
//! 2. Track beats on the analyzed signal (see
//!    [`BeatTracker`](crate::features::onset::BeatTracker))
//! 3. Instantaneous BPM between consecutive beats, clamped to the configured
//!    range, timestamped at the beat-pair midpoint
//! 4. Octave disambiguation picks as-detected, half-time, or double-time
//! 5. Centered moving average smooths the curve for display
//! 6. Runs of points deviating more than 15% from the average become
//!    instability events

use crate::analysis::result::{
    EventKind, TempoAnalysis, TempoCurvePoint, TempoInstabilityEvent, TempoInterpretation,
    TempoLabel, TempoSummary, TrimInfo,
};
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::features::onset::{frames_to_time, BeatTracker};
use crate::preprocessing::silence::trim_silence;

/// Floor for inter-beat intervals to keep the BPM division finite
const INTERVAL_FLOOR: f32 = 1e-6;

/// Numerical stability epsilon
const EPSILON: f32 = 1e-9;

/// Extract the tempo analysis of a recording
///
/// Trims silence, tracks beats with the given tracker, and derives the tempo
/// curve. A recording with fewer than `config.min_beats` detected beats
/// yields a degenerate result (empty curve, tracker estimate as the average,
/// no stability coefficient) rather than an error.
///
/// # Arguments
///
/// * `samples` - Mono audio samples
/// * `sample_rate` - Sample rate in Hz
/// * `tracker` - Beat/onset detection implementation
/// * `config` - Analysis configuration
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` when the sample rate is zero.
pub fn extract_tempo(
    samples: &[f32],
    sample_rate: u32,
    tracker: &dyn BeatTracker,
    config: &AnalysisConfig,
) -> Result<TempoAnalysis, AnalysisError> {
    if sample_rate == 0 {
        return Err(AnalysisError::InvalidInput("Invalid sample rate: 0".to_string()));
    }

    let duration_sec = samples.len() as f32 / sample_rate as f32;
    let trimmed = trim_silence(samples, sample_rate, config);

    // Analysis window fallback: a trim that leaves less than one frame of
    // signal keeps the offsets but measures the untrimmed audio
    let (analysis, analyzed_duration_sec) = if trimmed.samples.len() < config.frame_size {
        log::warn!(
            "Trimmed signal too short for analysis ({} samples), using untrimmed signal",
            trimmed.samples.len()
        );
        (samples, duration_sec)
    } else {
        let trimmed_duration = trimmed.samples.len() as f32 / sample_rate as f32;
        (trimmed.samples.as_slice(), trimmed_duration)
    };

    let envelope = tracker.onset_envelope(analysis, sample_rate, config.hop_size);
    let (tempo_estimate, beat_frames) = tracker.track_beats(&envelope, sample_rate, config.hop_size);
    let beat_times = frames_to_time(&beat_frames, sample_rate, config.hop_size);

    log::debug!(
        "Tempo extraction: {:.2}s analyzed, {} beats, estimate {:.1} BPM",
        analyzed_duration_sec,
        beat_times.len(),
        tempo_estimate
    );

    Ok(analyze_beats(
        &beat_times,
        tempo_estimate,
        duration_sec,
        analyzed_duration_sec,
        trimmed.info,
        config,
    ))
}

/// Build a tempo analysis from beat timestamps
///
/// This is the measurement half of [`extract_tempo`], usable directly by
/// callers that already have beat timestamps from an external tracker.
pub fn analyze_beats(
    beat_times: &[f32],
    tempo_estimate: f32,
    duration_sec: f32,
    analyzed_duration_sec: f32,
    trim: TrimInfo,
    config: &AnalysisConfig,
) -> TempoAnalysis {
    if beat_times.len() < config.min_beats {
        return degenerate_analysis(
            tempo_estimate,
            duration_sec,
            analyzed_duration_sec,
            trim,
        );
    }

    // Instantaneous BPM between consecutive beats, clamped against detector
    // glitches; the curve timestamp is the midpoint of each beat pair
    let mut bpm_inst = Vec::with_capacity(beat_times.len() - 1);
    let mut t_mid = Vec::with_capacity(beat_times.len() - 1);
    for pair in beat_times.windows(2) {
        let interval = (pair[1] - pair[0]).max(INTERVAL_FLOOR);
        bpm_inst.push((60.0 / interval).clamp(config.min_bpm, config.max_bpm));
        t_mid.push((pair[0] + pair[1]) / 2.0);
    }

    let avg_bpm = mean(&bpm_inst);
    let bpm_variance = variance(&bpm_inst, avg_bpm);
    let std_bpm = bpm_variance.sqrt();
    let tempo_stability_cv = if avg_bpm > EPSILON {
        Some(std_bpm / avg_bpm)
    } else {
        None
    };

    let interpretation = interpret_tempo(avg_bpm);
    let scale = interpretation.recommended_label.scale();

    let bpm_smooth = if bpm_inst.len() >= config.smoothing_window {
        moving_average_same(&bpm_inst, config.smoothing_window)
    } else {
        bpm_inst.clone()
    };

    let curve = bpm_inst
        .iter()
        .zip(&t_mid)
        .zip(&bpm_smooth)
        .map(|((&bpm, &t), &smooth)| TempoCurvePoint {
            t,
            bpm,
            bpm_musical: Some(bpm * scale),
            bpm_smooth: Some(smooth),
            bpm_musical_smooth: Some(smooth * scale),
        })
        .collect();

    let events = detect_instability(&bpm_inst, &t_mid, avg_bpm, config);

    TempoAnalysis {
        duration_sec,
        analyzed_duration_sec,
        trim,
        curve,
        summary: TempoSummary {
            avg_bpm: if avg_bpm > 0.0 { avg_bpm } else { tempo_estimate },
            bpm_variance,
            tempo_stability_cv,
        },
        interpretation,
        events,
    }
}

/// Resolve octave ambiguity for a detected average tempo
///
/// The rules form a priority chain evaluated top to bottom; the first match
/// wins and later rules assume earlier ones already failed:
///
/// 1. A detected tempo in [90, 180] whose half lands in [40, 110] is read as
///    a subdivision artifact: recommend half-time
/// 2. A detected tempo in [40, 120] is kept as-is
/// 3. A doubled tempo landing in [40, 120] is read as the tracker locking
///    onto a slow pulse level: recommend double-time
/// 4. Otherwise keep the detected tempo
pub fn interpret_tempo(as_detected_bpm: f32) -> TempoInterpretation {
    let half_time_bpm = as_detected_bpm / 2.0;
    let double_time_bpm = as_detected_bpm * 2.0;

    let (recommended_label, reason) = if (90.0..=180.0).contains(&as_detected_bpm)
        && (40.0..=110.0).contains(&half_time_bpm)
    {
        (
            TempoLabel::HalfTime,
            "Detected pulse likely reflects subdivisions; half-time lands in a musical range.",
        )
    } else if (40.0..=120.0).contains(&as_detected_bpm) {
        (
            TempoLabel::AsDetected,
            "Detected tempo falls in a typical musical range.",
        )
    } else if (40.0..=120.0).contains(&double_time_bpm) {
        (
            TempoLabel::DoubleTime,
            "Detected pulse likely reflects a slow pulse level; double-time lands in a musical range.",
        )
    } else {
        (
            TempoLabel::AsDetected,
            "No octave candidate falls in a typical musical range; keeping the detected tempo.",
        )
    };

    let recommended_bpm = match recommended_label {
        TempoLabel::AsDetected => as_detected_bpm,
        TempoLabel::HalfTime => half_time_bpm,
        TempoLabel::DoubleTime => double_time_bpm,
    };

    TempoInterpretation {
        as_detected_bpm,
        half_time_bpm,
        double_time_bpm,
        recommended_bpm,
        recommended_label,
        reason: reason.to_string(),
    }
}

/// Minimal result for recordings with too few beats for a curve
fn degenerate_analysis(
    tempo_estimate: f32,
    duration_sec: f32,
    analyzed_duration_sec: f32,
    trim: TrimInfo,
) -> TempoAnalysis {
    log::debug!(
        "Too few beats for a tempo curve, returning degenerate result at {:.1} BPM",
        tempo_estimate
    );

    TempoAnalysis {
        duration_sec,
        analyzed_duration_sec,
        trim,
        curve: Vec::new(),
        summary: TempoSummary {
            avg_bpm: tempo_estimate,
            bpm_variance: 0.0,
            tempo_stability_cv: None,
        },
        interpretation: TempoInterpretation {
            as_detected_bpm: tempo_estimate,
            half_time_bpm: tempo_estimate / 2.0,
            double_time_bpm: tempo_estimate * 2.0,
            recommended_bpm: tempo_estimate,
            recommended_label: TempoLabel::AsDetected,
            reason: "insufficient beats".to_string(),
        },
        events: Vec::new(),
    }
}

/// Centered moving average with output length equal to input length
///
/// Edge windows shrink to the available neighbors instead of zero-padding,
/// so boundary values stay in the data's range.
fn moving_average_same(values: &[f32], window: usize) -> Vec<f32> {
    let half = window / 2;
    (0..values.len())
        .map(|i| {
            let lo = i.saturating_sub(half);
            let hi = (i + half + 1).min(values.len());
            let sum: f32 = values[lo..hi].iter().sum();
            sum / (hi - lo) as f32
        })
        .collect()
}

/// Find contiguous runs of unstable tempo
///
/// A point is unstable when its relative deviation from the average exceeds
/// `config.instability_deviation`. Runs of at least
/// `config.min_instability_run` points become events; a run still open at
/// the final point is closed inclusive of that point.
fn detect_instability(
    bpm_inst: &[f32],
    t_mid: &[f32],
    avg_bpm: f32,
    config: &AnalysisConfig,
) -> Vec<TempoInstabilityEvent> {
    let mut events = Vec::new();
    if bpm_inst.len() < 3 || avg_bpm <= 0.0 {
        return events;
    }

    let dev: Vec<f32> = bpm_inst
        .iter()
        .map(|&bpm| (bpm - avg_bpm).abs() / avg_bpm)
        .collect();

    let mut start: Option<usize> = None;
    for (i, &deviation) in dev.iter().enumerate() {
        let is_bad = deviation > config.instability_deviation;
        if is_bad && start.is_none() {
            start = Some(i);
        }
        if !is_bad || i == dev.len() - 1 {
            if let Some(run_start) = start.take() {
                let run_end = if is_bad { i + 1 } else { i };
                if run_end - run_start >= config.min_instability_run {
                    let mean_dev = mean(&dev[run_start..run_end]);
                    events.push(TempoInstabilityEvent {
                        t_start: t_mid[run_start],
                        t_end: t_mid[run_end - 1],
                        kind: EventKind::TempoInstability,
                        severity: (mean_dev / config.instability_severity_norm).min(1.0),
                    });
                }
            }
        }
    }

    events
}

fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f32>() / values.len() as f32
}

fn variance(values: &[f32], mean: f32) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values
        .iter()
        .map(|&x| {
            let diff = x - mean;
            diff * diff
        })
        .sum::<f32>()
        / values.len() as f32
}

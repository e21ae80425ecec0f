//! # Cadenza DSP
//!
//! A performance analysis engine for music practice applications: extracts
//! tempo and loudness trajectories from a recorded take and compares a
//! student take against a reference take on a common time axis.
//!
//! ## Features
//!
//! - **Tempo curves**: instantaneous BPM from tracked beats, with
//!   half/double-time octave disambiguation and instability events
//! - **Loudness curves**: short-time RMS in dB relative to the recording's
//!   own loudest frame
//! - **Alignment**: dynamic-time-warping alignment of two takes using
//!   loudness as a proxy for musical progress, yielding tempo and loudness
//!   difference series
//! - **Insights**: severity-graded diagnostic cards derived from the
//!   comparison metrics
//!
//! ## Quick Start
//!
//! ```no_run
//! use cadenza_dsp::{analyze_performance, compare_performances, AnalysisConfig};
//!
//! // Load mono audio samples (f32, normalized)
//! let student: Vec<f32> = vec![]; // Your audio data
//! let reference: Vec<f32> = vec![];
//! let sample_rate = 44100;
//!
//! let config = AnalysisConfig::default();
//! let student_analysis = analyze_performance(&student, sample_rate, &config)?;
//! let reference_analysis = analyze_performance(&reference, sample_rate, &config)?;
//!
//! let comparison = compare_performances(&student_analysis, &reference_analysis, &config);
//! for card in &comparison.insights {
//!     println!("[{:?}] {}: {}", card.severity, card.title, card.detail);
//! }
//! # Ok::<(), cadenza_dsp::AnalysisError>(())
//! ```
//!
//! ## Architecture
//!
//! The analysis pipeline follows this flow:
//!
//! ```text
//! Audio Input → Silence Trim → Tempo / Loudness Extraction → Alignment → Insights
//! ```
//!
//! Each invocation is a pure, blocking function of its inputs; nothing
//! escapes to shared state, so the two per-recording analyses of a
//! comparison can be run concurrently by the caller.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod align;
pub mod analysis;
pub mod config;
pub mod error;
pub mod features;
pub mod insight;
pub mod io;
pub mod preprocessing;

// Re-export main types
pub use align::dtw::{DtwAligner, SequenceAligner};
pub use analysis::result::{
    AlignmentOutcome, AlignmentResult, ComparisonResult, InsightCard, LoudnessAnalysis,
    PerformanceAnalysis, Severity, TempoAnalysis, TempoInterpretation, TempoLabel,
};
pub use config::AnalysisConfig;
pub use error::AnalysisError;
pub use features::onset::{BeatTracker, EnergyFluxTracker};

use align::engine::align_performances;
use features::loudness::extract_loudness;
use features::tempo::extract_tempo;
use insight::generate_insights;

/// Analyze one recording with the default energy-flux beat tracker
///
/// Trims silence, then extracts the tempo and loudness analyses. A recording
/// the tracker cannot find beats in still analyzes: the tempo side degrades
/// to a curveless result and the loudness side is unaffected.
///
/// # Arguments
///
/// * `samples` - Mono audio samples, normalized to [-1.0, 1.0]
/// * `sample_rate` - Sample rate in Hz (typically 44100 or 48000)
/// * `config` - Analysis configuration parameters
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` for empty samples or a zero sample
/// rate.
pub fn analyze_performance(
    samples: &[f32],
    sample_rate: u32,
    config: &AnalysisConfig,
) -> Result<PerformanceAnalysis, AnalysisError> {
    let tracker = EnergyFluxTracker {
        frame_size: config.frame_size,
        min_bpm: config.min_bpm,
        max_bpm: config.max_bpm,
    };
    analyze_performance_with_tracker(samples, sample_rate, &tracker, config)
}

/// Analyze one recording with a caller-provided beat tracker
///
/// Same pipeline as [`analyze_performance`], for callers that bring their
/// own [`BeatTracker`] implementation.
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` for empty samples or a zero sample
/// rate.
pub fn analyze_performance_with_tracker(
    samples: &[f32],
    sample_rate: u32,
    tracker: &dyn BeatTracker,
    config: &AnalysisConfig,
) -> Result<PerformanceAnalysis, AnalysisError> {
    if samples.is_empty() {
        return Err(AnalysisError::InvalidInput("Empty audio samples".to_string()));
    }
    if sample_rate == 0 {
        return Err(AnalysisError::InvalidInput("Invalid sample rate".to_string()));
    }

    log::debug!(
        "Starting performance analysis: {} samples at {} Hz",
        samples.len(),
        sample_rate
    );

    let tempo = extract_tempo(samples, sample_rate, tracker, config)?;
    let loudness = extract_loudness(samples, sample_rate, config)?;

    Ok(PerformanceAnalysis { tempo, loudness })
}

/// Compare a student take against a reference take
///
/// Aligns the two analyses with the default DTW aligner and derives insight
/// cards. Alignment insufficiency (empty curves, too little overlap) is
/// carried inside the result as a structured payload; the summary-based
/// insight cards are still produced.
pub fn compare_performances(
    student: &PerformanceAnalysis,
    reference: &PerformanceAnalysis,
    config: &AnalysisConfig,
) -> ComparisonResult {
    let alignment = align_performances(student, reference, &DtwAligner, config);
    let insights = generate_insights(student, reference, alignment.as_aligned());

    ComparisonResult {
        alignment,
        insights,
    }
}

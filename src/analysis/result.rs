//! Analysis result types
//!
//! Every type here is a plain value object: produced once by a pure function
//! of its inputs, never mutated afterwards, and serializable as the payload
//! a job store or HTTP layer would persist verbatim.

use serde::{Deserialize, Serialize};

/// Silence-trim metadata for one recording
///
/// The trim window spans `[start_offset_sec, end_offset_sec]` on the
/// original timeline; `0 <= start_offset_sec <= end_offset_sec <= duration`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrimInfo {
    /// Seconds trimmed from the start of the recording
    pub start_offset_sec: f32,

    /// End of the kept region, in seconds from the start of the recording
    pub end_offset_sec: f32,

    /// Threshold used for the trim, in dB below the loudest frame
    pub threshold_db: f32,
}

/// One point of an instantaneous-tempo curve
///
/// `bpm` is the raw clamped estimate between two consecutive beats;
/// `bpm_musical` is scaled by the octave interpretation. The smoothed
/// variants are always filled by this crate's extractor but are optional in
/// the payload, so curves from other producers may omit them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TempoCurvePoint {
    /// Time in seconds (midpoint of the beat pair)
    pub t: f32,

    /// Instantaneous BPM, clamped to the configured range
    pub bpm: f32,

    /// BPM scaled by the recommended octave interpretation
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub bpm_musical: Option<f32>,

    /// Moving-average smoothed BPM
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub bpm_smooth: Option<f32>,

    /// Moving-average smoothed BPM, octave-scaled
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub bpm_musical_smooth: Option<f32>,
}

/// Which tempo interpretation a recommendation refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TempoLabel {
    /// The tempo as reported by the beat tracker
    #[serde(rename = "as_detected_bpm")]
    AsDetected,

    /// Half of the detected tempo (tracker locked onto subdivisions)
    #[serde(rename = "half_time_bpm")]
    HalfTime,

    /// Double the detected tempo (tracker locked onto a multiple)
    #[serde(rename = "double_time_bpm")]
    DoubleTime,
}

impl TempoLabel {
    /// Octave scale factor applied to curve points for this label
    pub fn scale(&self) -> f32 {
        match self {
            TempoLabel::AsDetected => 1.0,
            TempoLabel::HalfTime => 0.5,
            TempoLabel::DoubleTime => 2.0,
        }
    }
}

/// Octave-ambiguity interpretation of a detected tempo
///
/// `half_time_bpm` and `double_time_bpm` are exactly half and double the
/// detected value, and `recommended_bpm` always equals the candidate named
/// by `recommended_label`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TempoInterpretation {
    /// Average BPM as detected
    pub as_detected_bpm: f32,

    /// Detected BPM halved
    pub half_time_bpm: f32,

    /// Detected BPM doubled
    pub double_time_bpm: f32,

    /// The candidate recommended for musical use
    pub recommended_bpm: f32,

    /// Which candidate `recommended_bpm` is
    pub recommended_label: TempoLabel,

    /// Human-readable justification for the recommendation
    pub reason: String,
}

/// Summary statistics over the instantaneous-tempo series
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TempoSummary {
    /// Mean of the clamped instantaneous BPM series
    pub avg_bpm: f32,

    /// Variance of the instantaneous BPM series
    pub bpm_variance: f32,

    /// Coefficient of variation (std / mean); `None` for degenerate results
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub tempo_stability_cv: Option<f32>,
}

/// Kind tag carried by serialized analysis events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A segment where the tempo deviated noticeably from the average
    TempoInstability,
}

/// A contiguous segment of unstable tempo
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TempoInstabilityEvent {
    /// Segment start in seconds
    pub t_start: f32,

    /// Segment end in seconds
    pub t_end: f32,

    /// Event kind tag
    #[serde(rename = "type")]
    pub kind: EventKind,

    /// Severity in [0, 1]
    pub severity: f32,
}

/// Tempo analysis of one recording
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TempoAnalysis {
    /// Duration of the original recording in seconds
    pub duration_sec: f32,

    /// Duration of the signal that was actually analyzed, in seconds
    ///
    /// Equal to the trimmed duration, or to `duration_sec` when the trimmed
    /// signal was shorter than the minimum analysis window and the extractor
    /// fell back to the untrimmed signal. Curve times are relative to the
    /// start of the analyzed signal.
    pub analyzed_duration_sec: f32,

    /// Silence-trim metadata (reported even when the fallback was taken)
    pub trim: TrimInfo,

    /// Instantaneous-tempo curve; empty for degenerate results
    pub curve: Vec<TempoCurvePoint>,

    /// Summary statistics
    pub summary: TempoSummary,

    /// Octave-ambiguity interpretation
    pub interpretation: TempoInterpretation,

    /// Unstable-tempo segments
    pub events: Vec<TempoInstabilityEvent>,
}

/// One point of a relative-loudness curve
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoudnessCurvePoint {
    /// Time in seconds (frame center)
    pub t: f32,

    /// RMS level in dB relative to the loudest frame of the same recording;
    /// always `<= 0`, with the loudest frame at exactly 0
    pub rms_db: f32,
}

/// Summary statistics over a loudness curve
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoudnessSummary {
    /// Mean level in dB
    pub mean_db: f32,

    /// P95 minus P5 of the level distribution, in dB
    pub dynamic_range_db: f32,
}

/// Loudness analysis of one recording
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoudnessAnalysis {
    /// Duration of the original recording in seconds
    pub duration_sec: f32,

    /// Duration of the signal that was actually analyzed, in seconds
    pub analyzed_duration_sec: f32,

    /// Silence-trim metadata
    pub trim: TrimInfo,

    /// Relative-loudness curve; empty when the signal is too short
    pub curve: Vec<LoudnessCurvePoint>,

    /// Summary statistics; `None` when the curve is empty
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub summary: Option<LoudnessSummary>,
}

/// Complete analysis of one recording
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceAnalysis {
    /// Tempo analysis
    pub tempo: TempoAnalysis,

    /// Loudness analysis
    pub loudness: LoudnessAnalysis,
}

/// Which tempo-curve field was projected onto the alignment grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TempoField {
    /// Smoothed, octave-scaled BPM (preferred)
    BpmMusicalSmooth,
    /// Octave-scaled BPM
    BpmMusical,
    /// Smoothed raw BPM
    BpmSmooth,
    /// Raw clamped BPM
    Bpm,
}

/// Aligned comparison of two recordings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlignmentResult {
    /// The shorter of the two analyzed durations, in seconds
    pub overlap_sec: f32,

    /// Resolution of the alignment grids in Hz
    pub grid_hz: f32,

    /// Student-timeline seconds for each retained alignment pair
    pub aligned_time_axis: Vec<f32>,

    /// Student minus reference tempo at each retained pair, in BPM
    pub tempo_diff_series: Vec<f32>,

    /// Student minus reference loudness at each retained pair, in dB
    pub loudness_diff_series: Vec<f32>,

    /// Tempo-curve field used for the student recording
    pub student_tempo_field: TempoField,

    /// Tempo-curve field used for the reference recording
    pub reference_tempo_field: TempoField,

    /// Mean absolute tempo difference over the aligned pairs, in BPM
    pub mean_abs_bpm_diff: f32,

    /// Mean absolute loudness difference over the aligned pairs, in dB
    pub mean_abs_db_diff: f32,

    /// Student minus reference recommended BPM; `None` when either
    /// recommendation is missing from the payload
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub recommended_bpm_diff: Option<f32>,
}

/// Outcome of aligning two recordings
///
/// Alignment-stage insufficiency is data, not an error: callers render the
/// `InsufficientData` variant as "comparison unavailable" while the
/// per-recording analyses remain valid on their own.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AlignmentOutcome {
    /// Alignment succeeded
    Aligned(AlignmentResult),

    /// The recordings could not be aligned
    InsufficientData {
        /// Why the alignment was not possible
        reason: String,
    },
}

impl AlignmentOutcome {
    /// The alignment result, if the recordings were aligned
    pub fn as_aligned(&self) -> Option<&AlignmentResult> {
        match self {
            AlignmentOutcome::Aligned(result) => Some(result),
            AlignmentOutcome::InsufficientData { .. } => None,
        }
    }

    /// True when alignment succeeded
    pub fn is_aligned(&self) -> bool {
        self.as_aligned().is_some()
    }
}

/// Severity grade of an insight card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Within the target range
    Good,
    /// Noticeable but workable deviation
    Warn,
    /// Deviation that needs attention
    Bad,
}

/// One human-readable diagnostic card
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightCard {
    /// Short card title
    pub title: String,

    /// Severity grade
    pub severity: Severity,

    /// What was measured
    pub detail: String,

    /// What to practice
    pub suggestion: String,
}

/// Full comparison of a student take against a reference take
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonResult {
    /// Temporal alignment, or a structured reason it was unavailable
    pub alignment: AlignmentOutcome,

    /// Diagnostic cards derived from the summaries and the alignment
    pub insights: Vec<InsightCard>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tempo_label_scale() {
        assert_eq!(TempoLabel::AsDetected.scale(), 1.0);
        assert_eq!(TempoLabel::HalfTime.scale(), 0.5);
        assert_eq!(TempoLabel::DoubleTime.scale(), 2.0);
    }

    #[test]
    fn test_tempo_label_serializes_to_payload_names() {
        let json = serde_json::to_string(&TempoLabel::HalfTime).unwrap();
        assert_eq!(json, "\"half_time_bpm\"");
        let back: TempoLabel = serde_json::from_str("\"as_detected_bpm\"").unwrap();
        assert_eq!(back, TempoLabel::AsDetected);
    }

    #[test]
    fn test_curve_point_omits_absent_fields() {
        let point = TempoCurvePoint {
            t: 1.0,
            bpm: 120.0,
            bpm_musical: None,
            bpm_smooth: None,
            bpm_musical_smooth: None,
        };
        let json = serde_json::to_string(&point).unwrap();
        assert!(!json.contains("bpm_smooth"));

        // A bare payload from another producer still deserializes
        let back: TempoCurvePoint = serde_json::from_str("{\"t\":1.0,\"bpm\":120.0}").unwrap();
        assert_eq!(back.bpm, 120.0);
        assert!(back.bpm_musical_smooth.is_none());
    }

    #[test]
    fn test_instability_event_type_tag() {
        let event = TempoInstabilityEvent {
            t_start: 1.0,
            t_end: 2.0,
            kind: EventKind::TempoInstability,
            severity: 0.5,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"tempo_instability\""));
    }

    #[test]
    fn test_alignment_outcome_status_tag() {
        let outcome = AlignmentOutcome::InsufficientData {
            reason: "empty loudness curve".to_string(),
        };
        assert!(!outcome.is_aligned());
        let json = serde_json::to_string(&outcome).unwrap();
        assert!(json.contains("\"status\":\"insufficient_data\""));
    }

    #[test]
    fn test_severity_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Severity::Warn).unwrap(), "\"warn\"");
    }
}

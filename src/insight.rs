//! Diagnostic insight cards
//!
//! Maps comparison metrics to severity-graded, human-readable cards. Each
//! rule is independent and evaluated top to bottom only when its inputs are
//! present; a missing metric silently skips its card instead of erroring, so
//! a degenerate analysis still yields whatever insights remain computable.
//!
//! The thresholds are a decision table: values at or below the first bound
//! grade `good`, at or below the second grade `warn`, everything beyond
//! grades `bad`.

use crate::analysis::result::{
    AlignmentResult, InsightCard, PerformanceAnalysis, Severity,
};

/// Numerical stability epsilon
const EPSILON: f32 = 1e-9;

/// Tolerance for the internal recommended-BPM consistency check
const CONSISTENCY_TOLERANCE: f32 = 1e-3;

/// Generate diagnostic cards for a student take against a reference take
///
/// `alignment` is the aligned comparison when available; without it the
/// alignment-based cards (tempo tracking, dynamics tracking, consistency
/// check) are skipped and only the summary-based cards are produced.
pub fn generate_insights(
    student: &PerformanceAnalysis,
    reference: &PerformanceAnalysis,
    alignment: Option<&AlignmentResult>,
) -> Vec<InsightCard> {
    let mut cards = Vec::new();

    overall_tempo_card(student, reference, &mut cards);
    tempo_consistency_card(student, &mut cards);
    tempo_tracking_card(alignment, &mut cards);
    overall_loudness_card(student, reference, &mut cards);
    dynamic_range_card(student, reference, &mut cards);
    dynamics_tracking_card(alignment, &mut cards);
    consistency_check_card(student, reference, alignment, &mut cards);

    cards
}

/// Grade a non-negative metric against its good/warn bounds
fn grade(value: f32, good: f32, warn: f32) -> Severity {
    if value <= good {
        Severity::Good
    } else if value <= warn {
        Severity::Warn
    } else {
        Severity::Bad
    }
}

fn overall_tempo_card(
    student: &PerformanceAnalysis,
    reference: &PerformanceAnalysis,
    cards: &mut Vec<InsightCard>,
) {
    let student_bpm = student.tempo.interpretation.recommended_bpm;
    let reference_bpm = reference.tempo.interpretation.recommended_bpm;
    if reference_bpm.abs() <= EPSILON {
        return;
    }

    let percent_diff = (student_bpm - reference_bpm) / reference_bpm * 100.0;
    let severity = grade(percent_diff.abs(), 5.0, 12.0);

    let suggestion = match severity {
        Severity::Good => "Your overall tempo matches the reference well.",
        Severity::Warn => {
            "Practice with a metronome set to the reference tempo to close the gap."
        }
        Severity::Bad => {
            "Start well below the reference tempo with a metronome and work back up gradually."
        }
    };

    cards.push(InsightCard {
        title: "Overall tempo vs reference".to_string(),
        severity,
        detail: format!(
            "Your recommended tempo is {:.0} BPM against {:.0} BPM in the reference ({:+.1}%).",
            student_bpm, reference_bpm, percent_diff
        ),
        suggestion: suggestion.to_string(),
    });
}

fn tempo_consistency_card(student: &PerformanceAnalysis, cards: &mut Vec<InsightCard>) {
    let cv = match student.tempo.summary.tempo_stability_cv {
        Some(cv) => cv,
        None => return,
    };

    let severity = grade(cv, 0.06, 0.10);
    let suggestion = match severity {
        Severity::Good => "Your pulse is steady throughout the take.",
        Severity::Warn => "Isolate the passages where the tempo drifts and loop them slowly.",
        Severity::Bad => {
            "Record short sections against a click and compare before playing the full piece."
        }
    };

    cards.push(InsightCard {
        title: "Tempo consistency".to_string(),
        severity,
        detail: format!(
            "Beat-to-beat tempo variation is {:.1}% of your average tempo.",
            cv * 100.0
        ),
        suggestion: suggestion.to_string(),
    });
}

fn tempo_tracking_card(alignment: Option<&AlignmentResult>, cards: &mut Vec<InsightCard>) {
    let alignment = match alignment {
        Some(alignment) => alignment,
        None => return,
    };

    let severity = grade(alignment.mean_abs_bpm_diff, 4.0, 10.0);
    let suggestion = match severity {
        Severity::Good => "You follow the reference's tempo shape closely.",
        Severity::Warn => "Listen to the reference while reading the score to internalize its pacing.",
        Severity::Bad => "Play along with the reference recording in short sections before going solo.",
    };

    cards.push(InsightCard {
        title: "Tempo tracking".to_string(),
        severity,
        detail: format!(
            "Aligned against the reference, your tempo differs by {:.1} BPM on average.",
            alignment.mean_abs_bpm_diff
        ),
        suggestion: suggestion.to_string(),
    });
}

fn overall_loudness_card(
    student: &PerformanceAnalysis,
    reference: &PerformanceAnalysis,
    cards: &mut Vec<InsightCard>,
) {
    let (student_summary, reference_summary) = match (
        &student.loudness.summary,
        &reference.loudness.summary,
    ) {
        (Some(student_summary), Some(reference_summary)) => (student_summary, reference_summary),
        _ => return,
    };

    let diff = student_summary.mean_db - reference_summary.mean_db;
    let severity = grade(diff.abs(), 2.0, 5.0);
    let suggestion = match severity {
        Severity::Good => "Your overall level balance matches the reference.",
        Severity::Warn => "Check your average playing level against the reference's character.",
        Severity::Bad => "Rebalance the overall dynamic: the take sits far from the reference's level.",
    };

    cards.push(InsightCard {
        title: "Overall loudness vs reference".to_string(),
        severity,
        detail: format!(
            "Average level differs from the reference by {:+.1} dB.",
            diff
        ),
        suggestion: suggestion.to_string(),
    });
}

fn dynamic_range_card(
    student: &PerformanceAnalysis,
    reference: &PerformanceAnalysis,
    cards: &mut Vec<InsightCard>,
) {
    let (student_summary, reference_summary) = match (
        &student.loudness.summary,
        &reference.loudness.summary,
    ) {
        (Some(student_summary), Some(reference_summary)) => (student_summary, reference_summary),
        _ => return,
    };

    let diff = student_summary.dynamic_range_db - reference_summary.dynamic_range_db;
    let severity = grade(diff.abs(), 2.0, 6.0);
    let suggestion = match severity {
        Severity::Good => "Your dynamic contrast is on par with the reference.",
        Severity::Warn => "Exaggerate the marked dynamics slightly to widen your contrast.",
        Severity::Bad => {
            "Work on the loud-soft contrast: practice crescendos and decrescendos in isolation."
        }
    };

    cards.push(InsightCard {
        title: "Dynamic range".to_string(),
        severity,
        detail: format!(
            "Your dynamic range differs from the reference by {:+.1} dB.",
            diff
        ),
        suggestion: suggestion.to_string(),
    });
}

fn dynamics_tracking_card(alignment: Option<&AlignmentResult>, cards: &mut Vec<InsightCard>) {
    let alignment = match alignment {
        Some(alignment) => alignment,
        None => return,
    };

    let severity = grade(alignment.mean_abs_db_diff, 1.5, 3.5);
    let suggestion = match severity {
        Severity::Good => "Your dynamic shaping follows the reference closely.",
        Severity::Warn => "Mark the reference's dynamic shape in the score and follow it deliberately.",
        Severity::Bad => "Study where the reference breathes dynamically; your shaping diverges from it.",
    };

    cards.push(InsightCard {
        title: "Dynamics tracking".to_string(),
        severity,
        detail: format!(
            "Aligned against the reference, your loudness differs by {:.1} dB on average.",
            alignment.mean_abs_db_diff
        ),
        suggestion: suggestion.to_string(),
    });
}

/// Cross-check between the summaries and the alignment payload
///
/// The recommended-BPM difference is computable two ways; disagreement
/// beyond the tolerance surfaces as a low-severity card, not an error.
fn consistency_check_card(
    student: &PerformanceAnalysis,
    reference: &PerformanceAnalysis,
    alignment: Option<&AlignmentResult>,
    cards: &mut Vec<InsightCard>,
) {
    let aligned_diff = match alignment.and_then(|a| a.recommended_bpm_diff) {
        Some(diff) => diff,
        None => return,
    };

    let summary_diff = student.tempo.interpretation.recommended_bpm
        - reference.tempo.interpretation.recommended_bpm;

    if (summary_diff - aligned_diff).abs() <= CONSISTENCY_TOLERANCE {
        return;
    }

    log::warn!(
        "Recommended-BPM difference mismatch: summaries say {:.3}, alignment says {:.3}",
        summary_diff,
        aligned_diff
    );

    cards.push(InsightCard {
        title: "Internal consistency".to_string(),
        severity: Severity::Warn,
        detail: format!(
            "Recommended-tempo difference disagrees between summaries ({:.2} BPM) and alignment ({:.2} BPM).",
            summary_diff, aligned_diff
        ),
        suggestion: "Diagnostic only: re-run the comparison; if it persists, the analyses may be from different takes.".to_string(),
    });
}

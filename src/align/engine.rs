//! Alignment engine
//!
//! Uses loudness as a proxy for musical progress: both recordings' loudness
//! curves are resampled onto uniform 0.1 s grids, warped onto each other by
//! sequence alignment, and the warping path is reduced to a 1:1 mapping from
//! student time to reference time. Tempo and loudness curves are then
//! projected through that mapping to produce difference series.
//!
//! Insufficiency at any step (empty curves, non-positive durations, a path
//! with too few pairs) is returned as a structured
//! [`AlignmentOutcome::InsufficientData`] payload, never as an error: the
//! per-recording analyses stay valid on their own and the caller renders the
//! comparison as unavailable.

use crate::align::dtw::SequenceAligner;
use crate::align::resample::{resample_curve, uniform_grid, CurvePoint};
use crate::analysis::result::{
    AlignmentOutcome, AlignmentResult, PerformanceAnalysis, TempoCurvePoint, TempoField,
};
use crate::config::AnalysisConfig;

/// Align two analyzed recordings and derive difference series
///
/// # Arguments
///
/// * `student` - Analysis of the student take
/// * `reference` - Analysis of the reference take
/// * `aligner` - Sequence alignment implementation
/// * `config` - Analysis configuration (`alignment_grid_step`,
///   `min_alignment_pairs`)
pub fn align_performances(
    student: &PerformanceAnalysis,
    reference: &PerformanceAnalysis,
    aligner: &dyn SequenceAligner,
    config: &AnalysisConfig,
) -> AlignmentOutcome {
    let insufficient = |reason: &str| {
        log::debug!("Alignment unavailable: {}", reason);
        AlignmentOutcome::InsufficientData {
            reason: reason.to_string(),
        }
    };

    if student.loudness.curve.is_empty() {
        return insufficient("student loudness curve is empty");
    }
    if reference.loudness.curve.is_empty() {
        return insufficient("reference loudness curve is empty");
    }
    if student.tempo.curve.is_empty() {
        return insufficient("student tempo curve is empty");
    }
    if reference.tempo.curve.is_empty() {
        return insufficient("reference tempo curve is empty");
    }

    let student_duration = student.loudness.analyzed_duration_sec;
    let reference_duration = reference.loudness.analyzed_duration_sec;
    if student_duration <= 0.0 || reference_duration <= 0.0 {
        return insufficient("analyzed duration is not positive");
    }

    // Each recording gets its own grid spanning its own duration; the
    // warping path is what relates the two timelines
    let student_grid = uniform_grid(student_duration, config.alignment_grid_step);
    let reference_grid = uniform_grid(reference_duration, config.alignment_grid_step);
    if student_grid.is_empty() || reference_grid.is_empty() {
        return insufficient("alignment grid is empty");
    }

    let student_loudness = match resample_curve(&loudness_points(student), &student_grid) {
        Ok(values) => values,
        Err(_) => return insufficient("student loudness curve could not be resampled"),
    };
    let reference_loudness = match resample_curve(&loudness_points(reference), &reference_grid) {
        Ok(values) => values,
        Err(_) => return insufficient("reference loudness curve could not be resampled"),
    };

    let path = aligner.align(&student_loudness, &reference_loudness);
    let retained = reduce_path(&path, student_grid.len());
    if retained.len() < config.min_alignment_pairs {
        return insufficient("alignment path too short");
    }

    let student_field = preferred_tempo_field(&student.tempo.curve);
    let reference_field = preferred_tempo_field(&reference.tempo.curve);

    let student_tempo = match resample_curve(
        &tempo_points(&student.tempo.curve, student_field),
        &student_grid,
    ) {
        Ok(values) => values,
        Err(_) => return insufficient("student tempo curve could not be resampled"),
    };
    let reference_tempo = match resample_curve(
        &tempo_points(&reference.tempo.curve, reference_field),
        &reference_grid,
    ) {
        Ok(values) => values,
        Err(_) => return insufficient("reference tempo curve could not be resampled"),
    };

    let mut aligned_time_axis = Vec::with_capacity(retained.len());
    let mut tempo_diff_series = Vec::with_capacity(retained.len());
    let mut loudness_diff_series = Vec::with_capacity(retained.len());
    for &(i, j) in &retained {
        aligned_time_axis.push(student_grid[i]);
        tempo_diff_series.push(student_tempo[i] - reference_tempo[j]);
        loudness_diff_series.push(student_loudness[i] - reference_loudness[j]);
    }

    let mean_abs_bpm_diff = mean_abs(&tempo_diff_series);
    let mean_abs_db_diff = mean_abs(&loudness_diff_series);
    let recommended_bpm_diff = Some(
        student.tempo.interpretation.recommended_bpm
            - reference.tempo.interpretation.recommended_bpm,
    );

    log::debug!(
        "Aligned {} pairs: mean |dBPM| {:.2}, mean |ddB| {:.2}",
        retained.len(),
        mean_abs_bpm_diff,
        mean_abs_db_diff
    );

    AlignmentOutcome::Aligned(AlignmentResult {
        overlap_sec: student_duration.min(reference_duration),
        grid_hz: config.alignment_grid_hz(),
        aligned_time_axis,
        tempo_diff_series,
        loudness_diff_series,
        student_tempo_field: student_field,
        reference_tempo_field: reference_field,
        mean_abs_bpm_diff,
        mean_abs_db_diff,
        recommended_bpm_diff,
    })
}

/// Collapse a warping path into a 1:1 student-to-reference mapping
///
/// For each student index the first reference index on the path wins. A
/// boolean-marked array keyed by student index keeps the scan ordered and
/// deterministic; the output preserves path order, so student indices come
/// out strictly increasing and reference indices non-decreasing.
fn reduce_path(path: &[(usize, usize)], student_len: usize) -> Vec<(usize, usize)> {
    let mut seen = vec![false; student_len];
    let mut retained = Vec::new();
    for &(i, j) in path {
        if i < student_len && !seen[i] {
            seen[i] = true;
            retained.push((i, j));
        }
    }
    retained
}

/// First tempo field present on every point of the curve, in preference
/// order: musical-smooth, musical, smooth, raw
fn preferred_tempo_field(curve: &[TempoCurvePoint]) -> TempoField {
    if curve.iter().all(|p| p.bpm_musical_smooth.is_some()) {
        TempoField::BpmMusicalSmooth
    } else if curve.iter().all(|p| p.bpm_musical.is_some()) {
        TempoField::BpmMusical
    } else if curve.iter().all(|p| p.bpm_smooth.is_some()) {
        TempoField::BpmSmooth
    } else {
        TempoField::Bpm
    }
}

fn tempo_points(curve: &[TempoCurvePoint], field: TempoField) -> Vec<CurvePoint> {
    curve
        .iter()
        .map(|p| CurvePoint {
            t: p.t,
            value: match field {
                TempoField::BpmMusicalSmooth => p.bpm_musical_smooth.unwrap_or(p.bpm),
                TempoField::BpmMusical => p.bpm_musical.unwrap_or(p.bpm),
                TempoField::BpmSmooth => p.bpm_smooth.unwrap_or(p.bpm),
                TempoField::Bpm => p.bpm,
            },
        })
        .collect()
}

fn loudness_points(analysis: &PerformanceAnalysis) -> Vec<CurvePoint> {
    analysis
        .loudness
        .curve
        .iter()
        .map(|p| CurvePoint {
            t: p.t,
            value: p.rms_db,
        })
        .collect()
}

fn mean_abs(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|x| x.abs()).sum::<f32>() / values.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::dtw::DtwAligner;
    use crate::analysis::result::{
        LoudnessAnalysis, LoudnessCurvePoint, LoudnessSummary, TempoAnalysis, TempoSummary,
        TrimInfo,
    };
    use crate::features::tempo::interpret_tempo;

    fn no_trim(duration: f32) -> TrimInfo {
        TrimInfo {
            start_offset_sec: 0.0,
            end_offset_sec: duration,
            threshold_db: 35.0,
        }
    }

    /// Analysis with a constant tempo and a slowly varying loudness curve
    fn synth_analysis(duration: f32, bpm: f32) -> PerformanceAnalysis {
        let beat_interval = 60.0 / bpm;
        let mut tempo_curve = Vec::new();
        let mut t = beat_interval / 2.0;
        while t < duration {
            tempo_curve.push(TempoCurvePoint {
                t,
                bpm,
                bpm_musical: Some(bpm),
                bpm_smooth: Some(bpm),
                bpm_musical_smooth: Some(bpm),
            });
            t += beat_interval;
        }

        let mut loudness_curve = Vec::new();
        let mut t = 0.0;
        while t < duration {
            loudness_curve.push(LoudnessCurvePoint {
                t,
                rms_db: -10.0 + 8.0 * (t * 0.7).sin(),
            });
            t += 0.05;
        }

        PerformanceAnalysis {
            tempo: TempoAnalysis {
                duration_sec: duration,
                analyzed_duration_sec: duration,
                trim: no_trim(duration),
                curve: tempo_curve,
                summary: TempoSummary {
                    avg_bpm: bpm,
                    bpm_variance: 0.0,
                    tempo_stability_cv: Some(0.0),
                },
                interpretation: interpret_tempo(bpm),
                events: Vec::new(),
            },
            loudness: LoudnessAnalysis {
                duration_sec: duration,
                analyzed_duration_sec: duration,
                trim: no_trim(duration),
                curve: loudness_curve,
                summary: Some(LoudnessSummary {
                    mean_db: -10.0,
                    dynamic_range_db: 12.0,
                }),
            },
        }
    }

    #[test]
    fn test_identical_recordings_align_with_zero_diffs() {
        let config = AnalysisConfig::default();
        let analysis = synth_analysis(10.0, 100.0);

        let outcome = align_performances(&analysis, &analysis, &DtwAligner, &config);
        let result = outcome.as_aligned().expect("should align");

        assert_eq!(result.grid_hz, 10.0);
        assert_eq!(result.overlap_sec, 10.0);
        assert!(result.mean_abs_bpm_diff < 1e-4);
        assert!(result.mean_abs_db_diff < 1e-4);
        assert_eq!(result.recommended_bpm_diff, Some(0.0));
        for pair in result.aligned_time_axis.windows(2) {
            assert!(pair[1] > pair[0]);
        }
    }

    #[test]
    fn test_overlap_is_shorter_duration() {
        let config = AnalysisConfig::default();
        let student = synth_analysis(8.0, 100.0);
        let reference = synth_analysis(12.0, 100.0);

        let outcome = align_performances(&student, &reference, &DtwAligner, &config);
        let result = outcome.as_aligned().expect("should align");

        assert_eq!(result.overlap_sec, 8.0);
    }

    #[test]
    fn test_tempo_offset_shows_in_diffs() {
        let config = AnalysisConfig::default();
        // 88 and 80 both interpret as-detected, so the recommended
        // difference matches the curve difference
        let student = synth_analysis(10.0, 88.0);
        let reference = synth_analysis(10.0, 80.0);

        let outcome = align_performances(&student, &reference, &DtwAligner, &config);
        let result = outcome.as_aligned().expect("should align");

        assert!((result.mean_abs_bpm_diff - 8.0).abs() < 0.5);
        assert_eq!(result.recommended_bpm_diff, Some(8.0));
    }

    #[test]
    fn test_empty_loudness_curve_is_insufficient() {
        let config = AnalysisConfig::default();
        let mut student = synth_analysis(10.0, 100.0);
        student.loudness.curve.clear();
        let reference = synth_analysis(10.0, 100.0);

        let outcome = align_performances(&student, &reference, &DtwAligner, &config);
        assert!(!outcome.is_aligned());
    }

    #[test]
    fn test_empty_tempo_curve_is_insufficient() {
        let config = AnalysisConfig::default();
        let student = synth_analysis(10.0, 100.0);
        let mut reference = synth_analysis(10.0, 100.0);
        reference.tempo.curve.clear();

        let outcome = align_performances(&student, &reference, &DtwAligner, &config);
        assert!(!outcome.is_aligned());
    }

    #[test]
    fn test_short_recording_path_too_short() {
        let config = AnalysisConfig::default();
        // 0.5 s at 10 Hz: at most 5 retained pairs, below the minimum of 10
        let student = synth_analysis(0.5, 100.0);
        let reference = synth_analysis(0.5, 100.0);

        let outcome = align_performances(&student, &reference, &DtwAligner, &config);
        match outcome {
            AlignmentOutcome::InsufficientData { reason } => {
                assert!(reason.contains("path too short"));
            }
            AlignmentOutcome::Aligned(_) => panic!("expected insufficient data"),
        }
    }

    #[test]
    fn test_tempo_field_preference_falls_back() {
        let config = AnalysisConfig::default();
        let mut student = synth_analysis(10.0, 100.0);
        for point in &mut student.tempo.curve {
            point.bpm_musical_smooth = None;
        }
        let reference = synth_analysis(10.0, 100.0);

        let outcome = align_performances(&student, &reference, &DtwAligner, &config);
        let result = outcome.as_aligned().expect("should align");

        // The two recordings may legitimately use different fields
        assert_eq!(result.student_tempo_field, TempoField::BpmMusical);
        assert_eq!(result.reference_tempo_field, TempoField::BpmMusicalSmooth);
    }

    #[test]
    fn test_reduce_path_first_seen_wins() {
        let path = vec![(0, 0), (0, 1), (1, 1), (2, 1), (2, 2), (3, 3)];
        let retained = reduce_path(&path, 4);

        assert_eq!(retained, vec![(0, 0), (1, 1), (2, 1), (3, 3)]);
        // Student indices strictly increasing, reference non-decreasing
        for pair in retained.windows(2) {
            assert!(pair[1].0 > pair[0].0);
            assert!(pair[1].1 >= pair[0].1);
        }
    }

    #[test]
    fn test_preferred_tempo_field_chain() {
        let mut curve = vec![TempoCurvePoint {
            t: 0.0,
            bpm: 100.0,
            bpm_musical: Some(100.0),
            bpm_smooth: Some(100.0),
            bpm_musical_smooth: Some(100.0),
        }];
        assert_eq!(preferred_tempo_field(&curve), TempoField::BpmMusicalSmooth);

        curve[0].bpm_musical_smooth = None;
        assert_eq!(preferred_tempo_field(&curve), TempoField::BpmMusical);

        curve[0].bpm_musical = None;
        assert_eq!(preferred_tempo_field(&curve), TempoField::BpmSmooth);

        curve[0].bpm_smooth = None;
        assert_eq!(preferred_tempo_field(&curve), TempoField::Bpm);
    }
}

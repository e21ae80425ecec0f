//! Configuration parameters for performance analysis

/// Analysis configuration parameters
///
/// Every numeric threshold used by the engine lives here so tests and
/// callers can override them; no component reads hidden module-level state.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    // Preprocessing
    /// Silence trim threshold in dB below the loudest frame (default: 35.0)
    /// Frames more than this far below the peak are considered silent
    pub trim_threshold_db: f32,

    /// Frame size for short-time analysis, in samples (default: 2048)
    /// Also the minimum analysis window: trimmed signals shorter than this
    /// fall back to the untrimmed signal
    pub frame_size: usize,

    /// Hop size between frames, in samples (default: 512)
    pub hop_size: usize,

    // Tempo extraction
    /// Minimum instantaneous BPM; lower values are clamped (default: 40.0)
    pub min_bpm: f32,

    /// Maximum instantaneous BPM; higher values are clamped (default: 240.0)
    pub max_bpm: f32,

    /// Minimum number of detected beats for a tempo curve (default: 3)
    /// Below this the extractor returns a degenerate result
    pub min_beats: usize,

    /// Moving-average window for tempo-curve smoothing (default: 7)
    pub smoothing_window: usize,

    /// Relative BPM deviation above which a curve point is unstable
    /// (default: 0.15)
    pub instability_deviation: f32,

    /// Deviation that maps to severity 1.0 for instability events
    /// (default: 0.30)
    pub instability_severity_norm: f32,

    /// Minimum run length of unstable points to form an event (default: 2)
    pub min_instability_run: usize,

    // Alignment
    /// Resolution of the uniform alignment grids in seconds (default: 0.1)
    pub alignment_grid_step: f32,

    /// Minimum retained warping-path pairs for a usable alignment
    /// (default: 10)
    pub min_alignment_pairs: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            trim_threshold_db: 35.0,
            frame_size: 2048,
            hop_size: 512,
            min_bpm: 40.0,
            max_bpm: 240.0,
            min_beats: 3,
            smoothing_window: 7,
            instability_deviation: 0.15,
            instability_severity_norm: 0.30,
            min_instability_run: 2,
            alignment_grid_step: 0.1,
            min_alignment_pairs: 10,
        }
    }
}

impl AnalysisConfig {
    /// Grid frequency of the alignment grids in Hz
    pub fn alignment_grid_hz(&self) -> f32 {
        1.0 / self.alignment_grid_step
    }
}

//! Error types for the performance analysis engine

use std::fmt;

/// Errors that can occur during performance analysis
///
/// Extraction-stage insufficiency (too few beats, signal shorter than the
/// analysis window) degrades to a well-defined minimal result instead of an
/// error; `InsufficientData` is reserved for operations that cannot produce
/// even a degenerate output, such as resampling an empty curve. Alignment
/// failures are reported as a structured
/// [`AlignmentOutcome`](crate::analysis::result::AlignmentOutcome) payload
/// rather than through this type.
#[derive(Debug, Clone)]
pub enum AnalysisError {
    /// Invalid input parameters
    InvalidInput(String),

    /// Audio decoding error (fatal for the affected recording)
    DecodingError(String),

    /// Not enough data to produce any result
    InsufficientData(String),

    /// Processing error during analysis
    ProcessingError(String),
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            AnalysisError::DecodingError(msg) => write!(f, "Decoding error: {}", msg),
            AnalysisError::InsufficientData(msg) => write!(f, "Insufficient data: {}", msg),
            AnalysisError::ProcessingError(msg) => write!(f, "Processing error: {}", msg),
        }
    }
}

impl std::error::Error for AnalysisError {}

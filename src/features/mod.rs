//! Feature extraction modules
//!
//! Per-recording measurement:
//! - Onset envelope and beat tracking
//! - Tempo curve, octave interpretation, instability events
//! - Relative loudness curve

pub mod loudness;
pub mod onset;
pub mod tempo;

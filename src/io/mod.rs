//! Audio input modules
//!
//! Decoding of audio files into the mono sample vectors the analysis
//! pipeline consumes.

pub mod decoder;

//! Audio preprocessing modules
//!
//! Utilities for preparing audio for analysis:
//! - Silence detection and trimming

pub mod silence;

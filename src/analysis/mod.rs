//! Result aggregation modules
//!
//! Value-object types shared by the extraction, alignment, and insight
//! stages, shaped for direct serialization as a job payload.

pub mod result;

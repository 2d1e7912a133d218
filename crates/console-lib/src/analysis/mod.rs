//! Narrative analysis against the classification API

mod aggregate;
mod client;
mod samples;

pub use aggregate::aggregate;
pub use client::{AnalysisClient, AnalysisConfig, DEFAULT_ANALYSIS_TIMEOUT, MAX_ERROR_BODY_BYTES};
pub use samples::{sample_narrative, SAMPLE_NARRATIVES};

//! Core library for the FIR Assist control console
//!
//! This crate provides the core functionality for:
//! - Lifecycle commands against the container stack (deploy/stop)
//! - Health probing and the shared service status cache
//! - Narrative analysis against the classification API
//! - Aggregation of analysis results
//! - Settings, metrics and structured logging

pub mod analysis;
pub mod control;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod observability;
pub mod settings;
pub mod status;

mod text;

#[cfg(test)]
mod test_support;

pub use analysis::{
    aggregate, sample_narrative, AnalysisClient, AnalysisConfig, SAMPLE_NARRATIVES,
};
pub use control::ControlPlane;
pub use error::{AnalysisError, LifecycleError};
pub use lifecycle::{
    CommandRunner, CommandSpec, LifecycleCommand, LifecycleOrchestrator, LifecycleReport,
    OrchestratorConfig, ProcessRunner, RunnerConfig, StackState,
};
pub use models::*;
pub use observability::{ConsoleMetrics, StructuredLogger};
pub use settings::Settings;
pub use status::{HttpProber, Probe, ProbeConfig, StatusCache};

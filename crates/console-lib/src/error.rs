//! Error types surfaced at component boundaries

use crate::lifecycle::StackState;
use thiserror::Error;

/// Failure of a narrative analysis request
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Rejected before any request was issued
    #[error("invalid narrative: {0}")]
    Validation(String),

    /// Network unreachable, DNS failure, connection refused
    #[error("analysis request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    #[error("analysis request timed out after {0}s")]
    Timeout(u64),

    /// Non-200 answer from the classification API
    #[error("analysis API returned HTTP {status}: {body}")]
    Remote { status: u16, body: String },

    /// 200 answer whose body could not be interpreted
    #[error("analysis API returned a malformed body (HTTP {status}): {reason}")]
    Malformed {
        status: u16,
        reason: String,
        body: String,
    },
}

impl AnalysisError {
    /// Stable identifier used for metric labels and API error codes
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::Validation(_) => "validation",
            AnalysisError::Transport { .. } => "transport",
            AnalysisError::Timeout(_) => "timeout",
            AnalysisError::Remote { .. } => "remote",
            AnalysisError::Malformed { .. } => "malformed",
        }
    }
}

/// Rejection of a lifecycle operation
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("another lifecycle operation is in flight (stack is {in_flight})")]
    Busy { in_flight: StackState },
}

impl LifecycleError {
    pub fn kind(&self) -> &'static str {
        match self {
            LifecycleError::Busy { .. } => "busy",
        }
    }
}

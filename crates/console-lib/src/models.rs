//! Core data models for the control console

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A managed service of the stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceName {
    Frontend,
    Backend,
    Datastore,
}

impl ServiceName {
    pub const ALL: [ServiceName; 3] = [
        ServiceName::Frontend,
        ServiceName::Backend,
        ServiceName::Datastore,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceName::Frontend => "frontend",
            ServiceName::Backend => "backend",
            ServiceName::Datastore => "datastore",
        }
    }

    /// Human-facing label
    pub fn display_name(&self) -> &'static str {
        match self {
            ServiceName::Frontend => "Frontend",
            ServiceName::Backend => "Backend API",
            ServiceName::Datastore => "Datastore",
        }
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Last observed status of a service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    /// Endpoint answered with HTTP 200
    Running,
    /// Endpoint reachable but answered with a non-success status
    Error,
    /// Probe ran and could not connect
    Stopped,
    /// No probe has run yet
    Unknown,
}

impl ServiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceStatus::Running => "Running",
            ServiceStatus::Error => "Error",
            ServiceStatus::Stopped => "Stopped",
            ServiceStatus::Unknown => "Unknown",
        }
    }

    /// Returns true if the endpoint answered at all
    pub fn is_reachable(&self) -> bool {
        matches!(self, ServiceStatus::Running | ServiceStatus::Error)
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Statuses of every service captured in one probing pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub generation: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub captured_at: Option<DateTime<Utc>>,
    pub services: BTreeMap<ServiceName, ServiceStatus>,
}

impl StatusSnapshot {
    /// The snapshot a process starts with: every service `Unknown`
    pub fn unknown() -> Self {
        Self {
            generation: 0,
            captured_at: None,
            services: ServiceName::ALL
                .iter()
                .map(|name| (*name, ServiceStatus::Unknown))
                .collect(),
        }
    }

    /// Build a snapshot from one complete probing pass
    pub fn captured(
        generation: u64,
        statuses: impl IntoIterator<Item = (ServiceName, ServiceStatus)>,
    ) -> Self {
        let mut services: BTreeMap<_, _> = ServiceName::ALL
            .iter()
            .map(|name| (*name, ServiceStatus::Unknown))
            .collect();
        services.extend(statuses);

        Self {
            generation,
            captured_at: Some(Utc::now()),
            services,
        }
    }

    pub fn get(&self, service: ServiceName) -> ServiceStatus {
        self.services
            .get(&service)
            .copied()
            .unwrap_or(ServiceStatus::Unknown)
    }

    /// Returns true until the first refresh has been committed
    pub fn is_initial(&self) -> bool {
        self.generation == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (ServiceName, ServiceStatus)> + '_ {
        self.services.iter().map(|(name, status)| (*name, *status))
    }
}

impl Default for StatusSnapshot {
    fn default() -> Self {
        Self::unknown()
    }
}

/// Outcome of a single lifecycle command invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleResult {
    pub succeeded: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_detail: Option<String>,
}

impl LifecycleResult {
    pub fn success(message: impl Into<String>, exit_detail: Option<String>) -> Self {
        Self {
            succeeded: true,
            message: message.into(),
            exit_detail,
        }
    }

    pub fn failure(message: impl Into<String>, exit_detail: Option<String>) -> Self {
        Self {
            succeeded: false,
            message: message.into(),
            exit_detail,
        }
    }
}

/// Precedent case attached to a recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Judgment {
    pub case_name: String,
    pub synopsis: String,
}

/// Statutory section suggested for a narrative
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub code: String,
    pub title: String,
    pub description: String,
    /// Classifier confidence, always within [0, 1]
    pub score: f64,
    pub judgments: Vec<Judgment>,
}

/// Summary metrics over a recommendation set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateStats {
    pub section_count: usize,
    /// `None` when there are no recommendations
    pub mean_confidence: Option<f64>,
    pub total_judgments: usize,
}

impl AggregateStats {
    /// Mean confidence as a percentage, or "n/a" for an empty set
    pub fn mean_confidence_label(&self) -> String {
        match self.mean_confidence {
            Some(mean) => format!("{:.1}%", mean * 100.0),
            None => "n/a".to_string(),
        }
    }
}

/// Ranked recommendations with their summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub recommendations: Vec<Recommendation>,
    pub summary: AggregateStats,
}

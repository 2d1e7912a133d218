//! Console settings
//!
//! Layered as defaults, then an optional config file, then `FIR_*`
//! environment variables. Callers may override fields afterwards.

use crate::analysis::{AnalysisConfig, DEFAULT_ANALYSIS_TIMEOUT};
use crate::lifecycle::{LifecycleCommand, OrchestratorConfig, RunnerConfig};
use crate::status::{ProbeConfig, DEFAULT_PROBE_TIMEOUT};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Environment variable prefix for settings overrides
pub const ENV_PREFIX: &str = "FIR";

/// Settings shared by every console front end
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Backend API base URL
    pub backend_url: String,
    /// Frontend base URL
    pub frontend_url: String,
    /// Document store connection string (informational)
    pub datastore_uri: String,
    /// Display threshold for recommendation confidence
    pub confidence_threshold: f64,
    /// Classification model identifier (informational)
    pub model_id: String,
    /// Name of the managed stack
    pub stack_name: String,
    /// Directory holding the deployment descriptor
    pub deployment_dir: PathBuf,
    /// Container orchestration program
    pub compose_program: String,
    pub probe_timeout_secs: u64,
    pub deploy_timeout_secs: u64,
    pub stop_timeout_secs: u64,
    pub analysis_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:5000".to_string(),
            frontend_url: "http://localhost:3000".to_string(),
            datastore_uri: "mongodb://localhost:27017/fir-assist".to_string(),
            confidence_threshold: 0.7,
            model_id: "nlpaueb/legal-bert-base-uncased".to_string(),
            stack_name: "fir-assist".to_string(),
            deployment_dir: PathBuf::from("job"),
            compose_program: "docker-compose".to_string(),
            probe_timeout_secs: DEFAULT_PROBE_TIMEOUT.as_secs(),
            deploy_timeout_secs: LifecycleCommand::Deploy.default_timeout().as_secs(),
            stop_timeout_secs: LifecycleCommand::Stop.default_timeout().as_secs(),
            analysis_timeout_secs: DEFAULT_ANALYSIS_TIMEOUT.as_secs(),
        }
    }
}

impl Settings {
    /// Load settings from an optional file and the environment
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let settings: Settings = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .context("Failed to load configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;

        settings.validate()?;
        Ok(settings)
    }

    /// Check value ranges and URL syntax
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            anyhow::bail!(
                "confidence_threshold must be within [0, 1], got {}",
                self.confidence_threshold
            );
        }
        for (name, secs) in [
            ("probe_timeout_secs", self.probe_timeout_secs),
            ("deploy_timeout_secs", self.deploy_timeout_secs),
            ("stop_timeout_secs", self.stop_timeout_secs),
            ("analysis_timeout_secs", self.analysis_timeout_secs),
        ] {
            if secs == 0 {
                anyhow::bail!("{} must be greater than zero", name);
            }
        }
        Url::parse(&self.backend_url)
            .with_context(|| format!("Invalid backend_url: {}", self.backend_url))?;
        Url::parse(&self.frontend_url)
            .with_context(|| format!("Invalid frontend_url: {}", self.frontend_url))?;
        Ok(())
    }

    pub fn probe_config(&self) -> Result<ProbeConfig> {
        Ok(ProbeConfig::new(&self.backend_url, &self.frontend_url)?
            .with_timeout(Duration::from_secs(self.probe_timeout_secs)))
    }

    pub fn runner_config(&self) -> RunnerConfig {
        RunnerConfig::for_program(&self.compose_program)
    }

    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            stack_name: self.stack_name.clone(),
            deployment_dir: self.deployment_dir.clone(),
            deploy_timeout: Duration::from_secs(self.deploy_timeout_secs),
            stop_timeout: Duration::from_secs(self.stop_timeout_secs),
        }
    }

    pub fn analysis_config(&self) -> Result<AnalysisConfig> {
        Ok(AnalysisConfig::new(&self.backend_url)?
            .with_timeout(Duration::from_secs(self.analysis_timeout_secs)))
    }

    /// Datastore URI with any password masked
    pub fn redacted_datastore_uri(&self) -> String {
        match Url::parse(&self.datastore_uri) {
            Ok(mut url) => {
                if url.password().is_some() && url.set_password(Some("****")).is_err() {
                    return "****".to_string();
                }
                url.to_string()
            }
            Err(_) => "****".to_string(),
        }
    }

    /// Copy suitable for display
    pub fn redacted(&self) -> Settings {
        Settings {
            datastore_uri: self.redacted_datastore_uri(),
            ..self.clone()
        }
    }
}

//! Wiring of the core components from settings

use crate::analysis::AnalysisClient;
use crate::lifecycle::{CommandRunner, LifecycleOrchestrator, ProcessRunner};
use crate::observability::StructuredLogger;
use crate::settings::Settings;
use crate::status::{HttpProber, Probe, StatusCache};
use anyhow::Result;
use std::sync::Arc;

/// One status cache, orchestrator and analysis client sharing a prober
#[derive(Clone)]
pub struct ControlPlane {
    pub settings: Settings,
    pub cache: Arc<StatusCache>,
    pub orchestrator: Arc<LifecycleOrchestrator>,
    pub analysis: Arc<AnalysisClient>,
    pub logger: StructuredLogger,
}

impl ControlPlane {
    /// Build the control plane with the HTTP prober and process runner
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let prober: Arc<dyn Probe> = Arc::new(HttpProber::new(settings.probe_config()?)?);
        let runner: Arc<dyn CommandRunner> =
            Arc::new(ProcessRunner::new(settings.runner_config()));
        Self::with_components(settings, prober, runner)
    }

    /// Build the control plane around caller-provided probe and runner
    pub fn with_components(
        settings: Settings,
        prober: Arc<dyn Probe>,
        runner: Arc<dyn CommandRunner>,
    ) -> Result<Self> {
        settings.validate()?;

        let logger = StructuredLogger::new(settings.stack_name.clone());
        let cache = Arc::new(StatusCache::new(prober, logger.clone()));
        let orchestrator = Arc::new(LifecycleOrchestrator::new(
            runner,
            cache.clone(),
            settings.orchestrator_config(),
        ));
        let analysis = Arc::new(AnalysisClient::new(settings.analysis_config()?)?);

        Ok(Self {
            settings,
            cache,
            orchestrator,
            analysis,
            logger,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::StackState;
    use crate::models::{ServiceName, ServiceStatus};
    use crate::test_support::{ScriptedProbe, ScriptedRunner};

    #[tokio::test]
    async fn test_orchestrator_and_callers_share_one_cache() {
        let plane = ControlPlane::with_components(
            Settings::default(),
            Arc::new(ScriptedProbe::all(ServiceStatus::Running)),
            Arc::new(ScriptedRunner::succeeding()),
        )
        .unwrap();

        let report = plane.orchestrator.deploy().await.unwrap();
        assert_eq!(report.state, StackState::Running);

        let cached = plane.cache.current().await;
        assert_eq!(cached.generation, 1);
        assert_eq!(cached.get(ServiceName::Backend), ServiceStatus::Running);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let settings = Settings {
            backend_url: "::not-a-url".to_string(),
            ..Settings::default()
        };
        assert!(ControlPlane::from_settings(settings).is_err());
    }

    #[test]
    fn test_from_settings_uses_configured_endpoints() {
        let plane = ControlPlane::from_settings(Settings::default()).unwrap();
        assert_eq!(
            plane.analysis.endpoint().as_str(),
            "http://localhost:5000/api/analyze"
        );
    }
}

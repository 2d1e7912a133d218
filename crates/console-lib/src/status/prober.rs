//! HTTP health prober

use super::Probe;
use crate::models::{ServiceName, ServiceStatus};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Default per-probe timeout
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Endpoints and timeout for health probes
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// Backend API base URL; also answers for the datastore
    pub backend_url: Url,
    /// Frontend base URL
    pub frontend_url: Url,
    /// Transport-level timeout per probe
    pub timeout: Duration,
}

impl ProbeConfig {
    pub fn new(backend_url: &str, frontend_url: &str) -> Result<Self> {
        Ok(Self {
            backend_url: base_url(backend_url).context("Invalid backend URL")?,
            frontend_url: base_url(frontend_url).context("Invalid frontend URL")?,
            timeout: DEFAULT_PROBE_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Parse a base URL, ensuring a trailing slash so relative joins append.
pub(crate) fn base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw).with_context(|| format!("not a valid URL: {}", raw))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Health prober issuing one bounded GET per service
pub struct HttpProber {
    client: Client,
    config: ProbeConfig,
}

impl HttpProber {
    pub fn new(config: ProbeConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, config })
    }

    /// Health URL for a service. The datastore has no endpoint of its own
    /// and is reported through the backend's `/health`.
    pub fn health_url(&self, service: ServiceName) -> Url {
        match service {
            ServiceName::Frontend => self.config.frontend_url.clone(),
            ServiceName::Backend | ServiceName::Datastore => self
                .config
                .backend_url
                .join("health")
                .unwrap_or_else(|_| self.config.backend_url.clone()),
        }
    }

    /// Probe an arbitrary endpoint
    pub async fn probe_endpoint(&self, url: Url) -> ServiceStatus {
        match self.client.get(url.clone()).send().await {
            Ok(response) if response.status() == StatusCode::OK => ServiceStatus::Running,
            Ok(response) => {
                debug!(
                    url = %url,
                    status = %response.status(),
                    "Health probe answered with non-success status"
                );
                ServiceStatus::Error
            }
            Err(e) => {
                debug!(
                    url = %url,
                    error = %e,
                    timeout = e.is_timeout(),
                    "Health probe could not connect"
                );
                ServiceStatus::Stopped
            }
        }
    }
}

#[async_trait]
impl Probe for HttpProber {
    async fn probe(&self, service: ServiceName) -> ServiceStatus {
        self.probe_endpoint(self.health_url(service)).await
    }
}

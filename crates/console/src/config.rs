//! Daemon configuration

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Daemon-only configuration; stack settings live in `console_lib::Settings`
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// HTTP listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Refuse analysis while the cached backend status is not Running
    #[serde(default = "default_require_backend")]
    pub require_backend: bool,

    /// Optional settings file (`FIR_CONSOLE_CONFIG`)
    #[serde(default)]
    pub config: Option<PathBuf>,
}

fn default_port() -> u16 {
    8501
}

fn default_require_backend() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            require_backend: default_require_backend(),
            config: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from `FIR_CONSOLE_*` environment variables
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("FIR_CONSOLE").try_parsing(true))
            .build()
            .context("Failed to read daemon configuration")?;

        config
            .try_deserialize()
            .context("Invalid daemon configuration")
    }
}

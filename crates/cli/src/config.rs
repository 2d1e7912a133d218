//! Configuration management for the CLI

use anyhow::{Context, Result};
use console_lib::Settings;
use std::path::{Path, PathBuf};

/// Command-line overrides applied on top of loaded settings
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub backend_url: Option<String>,
    pub frontend_url: Option<String>,
    pub deployment_dir: Option<PathBuf>,
}

/// Load settings from the explicit or default config file, the
/// environment, then command-line overrides
pub fn load_settings(explicit: Option<&Path>, overrides: Overrides) -> Result<Settings> {
    let file = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => default_config_path().filter(|path| path.exists()),
    };

    let mut settings = Settings::load(file.as_deref())
        .with_context(|| match &file {
            Some(path) => format!("Failed to load settings from {}", path.display()),
            None => "Failed to load settings".to_string(),
        })?;

    if let Some(url) = overrides.backend_url {
        settings.backend_url = url;
    }
    if let Some(url) = overrides.frontend_url {
        settings.frontend_url = url;
    }
    if let Some(dir) = overrides.deployment_dir {
        settings.deployment_dir = dir;
    }

    settings.validate()?;
    Ok(settings)
}

/// `~/.config/firctl/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs_next::home_dir().map(|home| home.join(".config").join("firctl").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_path_under_home() {
        if let Some(path) = default_config_path() {
            assert!(path.ends_with(".config/firctl/config.toml"));
        }
    }

    #[test]
    fn test_overrides_win_over_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "backend_url = \"http://from-file:5000\"").unwrap();
        writeln!(file, "frontend_url = \"http://from-file:3000\"").unwrap();

        let settings = load_settings(
            Some(file.path()),
            Overrides {
                backend_url: Some("http://from-flag:5000".to_string()),
                deployment_dir: Some(PathBuf::from("/srv/job")),
                ..Overrides::default()
            },
        )
        .unwrap();

        assert_eq!(settings.backend_url, "http://from-flag:5000");
        assert_eq!(settings.frontend_url, "http://from-file:3000");
        assert_eq!(settings.deployment_dir, PathBuf::from("/srv/job"));
    }

    #[test]
    fn test_invalid_override_rejected() {
        let file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        let result = load_settings(
            Some(file.path()),
            Overrides {
                backend_url: Some("not a url".to_string()),
                ..Overrides::default()
            },
        );
        assert!(result.is_err());
    }
}

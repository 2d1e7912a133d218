//! Settings display

use anyhow::Result;
use colored::Colorize;
use console_lib::ControlPlane;
use tabled::Tabled;

use crate::output::{print_json, print_table, OutputFormat};

#[derive(Tabled)]
struct SettingRow {
    #[tabled(rename = "Setting")]
    name: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

fn row(name: &'static str, value: impl std::fmt::Display) -> SettingRow {
    SettingRow {
        name,
        value: value.to_string(),
    }
}

/// Show the effective settings with secrets masked
pub fn show_info(plane: &ControlPlane, format: OutputFormat) -> Result<()> {
    let settings = plane.settings.redacted();

    match format {
        OutputFormat::Json => print_json(&settings)?,
        OutputFormat::Table => {
            let timeouts = format!(
                "{}s / {}s / {}s / {}s",
                settings.probe_timeout_secs,
                settings.deploy_timeout_secs,
                settings.stop_timeout_secs,
                settings.analysis_timeout_secs
            );
            let rows = vec![
                row("Stack", &settings.stack_name),
                row("Backend URL", &settings.backend_url),
                row("Frontend URL", &settings.frontend_url),
                row("Datastore", &settings.datastore_uri),
                row("Model", &settings.model_id),
                row("Confidence threshold", format!("{:.2}", settings.confidence_threshold)),
                row("Deployment dir", settings.deployment_dir.display()),
                row("Compose program", &settings.compose_program),
                row("Timeouts (probe/deploy/stop/analysis)", timeouts),
            ];

            println!("{} {}", "firctl".bold(), env!("CARGO_PKG_VERSION"));
            print_table(&rows, "No settings");
        }
    }
    Ok(())
}

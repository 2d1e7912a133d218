//! Deploy and stop commands

use anyhow::Result;
use console_lib::{ControlPlane, LifecycleCommand};

use crate::commands::status::print_snapshot;
use crate::output::{print_info, print_json, print_success, print_warning, OutputFormat};

/// Run one lifecycle command and report the outcome
///
/// A failed command is returned as an error so the process exits non-zero.
pub async fn run(
    plane: &ControlPlane,
    command: LifecycleCommand,
    format: OutputFormat,
) -> Result<()> {
    if format == OutputFormat::Table {
        let action = match command {
            LifecycleCommand::Deploy => "Deploying",
            LifecycleCommand::Stop => "Stopping",
        };
        print_info(&format!(
            "{} stack '{}' from {}...",
            action,
            plane.settings.stack_name,
            plane.settings.deployment_dir.display()
        ));
    }

    let report = match command {
        LifecycleCommand::Deploy => plane.orchestrator.deploy().await?,
        LifecycleCommand::Stop => plane.orchestrator.stop().await?,
    };

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Table => {
            if report.result.succeeded {
                print_success(&report.result.message);
            }
            for warning in &report.warnings {
                print_warning(warning);
            }
            if let Some(snapshot) = &report.snapshot {
                println!();
                print_snapshot(snapshot, format)?;
            }
            println!();
            println!("Stack state: {}", report.state);
        }
    }

    if !report.result.succeeded {
        if let Some(detail) = &report.result.exit_detail {
            tracing::debug!(detail = %detail, "Lifecycle command detail");
        }
        anyhow::bail!("{}", report.result.message);
    }
    Ok(())
}

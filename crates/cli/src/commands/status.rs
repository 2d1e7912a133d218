//! Service status commands

use anyhow::Result;
use chrono::Local;
use colored::Colorize;
use console_lib::{ControlPlane, StatusSnapshot};
use tabled::Tabled;

use crate::output::{color_status, print_json, print_table, OutputFormat};

/// Row for the service status table
#[derive(Tabled)]
struct ServiceRow {
    #[tabled(rename = "Service")]
    service: String,
    #[tabled(rename = "Status")]
    status: String,
}

/// Refresh and show the status of every service
pub async fn show_status(plane: &ControlPlane, format: OutputFormat) -> Result<()> {
    let snapshot = plane.cache.refresh().await;
    print_snapshot(&snapshot, format)
}

/// Render one snapshot
pub fn print_snapshot(snapshot: &StatusSnapshot, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(snapshot)?,
        OutputFormat::Table => {
            let rows: Vec<ServiceRow> = snapshot
                .iter()
                .map(|(service, status)| ServiceRow {
                    service: service.display_name().to_string(),
                    status: color_status(status),
                })
                .collect();

            println!("{}", "Service Status".bold());
            print_table(&rows, "No services probed");

            if let Some(at) = snapshot.captured_at {
                println!(
                    "{}",
                    format!(
                        "Checked at {} (generation {})",
                        at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S"),
                        snapshot.generation
                    )
                    .dimmed()
                );
            }
        }
    }
    Ok(())
}

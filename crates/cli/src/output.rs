//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use console_lib::ServiceStatus;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print a rounded table, or a notice when there is nothing to show
pub fn print_table<T: Tabled>(items: &[T], empty_message: &str) {
    if items.is_empty() {
        println!("{}", empty_message.yellow());
        return;
    }
    let table = Table::new(items).with(Style::rounded()).to_string();
    println!("{}", table);
}

/// Print any serializable value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Format a [0, 1] score as a percentage
pub fn format_confidence(score: f64) -> String {
    format!("{:.1}%", score * 100.0)
}

/// Color service status based on value
pub fn color_status(status: ServiceStatus) -> String {
    let label = status.as_str();
    match status {
        ServiceStatus::Running => label.green().to_string(),
        ServiceStatus::Error => label.red().to_string(),
        ServiceStatus::Stopped => label.yellow().to_string(),
        ServiceStatus::Unknown => label.dimmed().to_string(),
    }
}

/// Color confidence relative to the display threshold
pub fn color_confidence(score: f64, threshold: f64) -> String {
    let formatted = format_confidence(score);
    if score >= threshold {
        formatted.green().to_string()
    } else if score >= threshold * 0.75 {
        formatted.yellow().to_string()
    } else {
        formatted.red().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_confidence() {
        assert_eq!(format_confidence(0.7), "70.0%");
        assert_eq!(format_confidence(1.0), "100.0%");
        assert_eq!(format_confidence(0.0), "0.0%");
    }

    #[test]
    fn test_color_keeps_text() {
        colored::control::set_override(false);
        assert_eq!(color_status(ServiceStatus::Running), "Running");
        assert_eq!(color_confidence(0.55, 0.7), "55.0%");
    }
}

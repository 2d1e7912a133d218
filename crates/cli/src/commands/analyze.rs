//! Narrative analysis commands

use anyhow::{Context, Result};
use colored::Colorize;
use console_lib::{
    sample_narrative, AnalysisResult, ControlPlane, Recommendation, ServiceName, ServiceStatus,
    SAMPLE_NARRATIVES,
};
use std::io::Read;
use std::path::PathBuf;
use tabled::Tabled;

use crate::output::{
    color_confidence, print_info, print_json, print_table, print_warning, OutputFormat,
};

/// Flags controlling one analysis run
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyzeOptions {
    pub above_threshold: bool,
    pub skip_status_check: bool,
}

/// Row for the recommendations table
#[derive(Tabled)]
struct RecommendationRow {
    #[tabled(rename = "#")]
    rank: usize,
    #[tabled(rename = "Section")]
    code: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Confidence")]
    confidence: String,
    #[tabled(rename = "Judgments")]
    judgments: usize,
}

/// Row for the samples table
#[derive(Tabled)]
struct SampleRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Narrative")]
    narrative: String,
}

/// Pick the narrative from the positional argument, a sample, or a file
pub fn resolve_narrative(
    narrative: Option<String>,
    sample: Option<usize>,
    file: Option<PathBuf>,
) -> Result<String> {
    if let Some(index) = sample {
        return sample_narrative(index).map(str::to_string).with_context(|| {
            format!(
                "No sample narrative #{} (choose 1-{})",
                index,
                SAMPLE_NARRATIVES.len()
            )
        });
    }

    if let Some(path) = file {
        if path.as_os_str() == "-" {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read narrative from stdin")?;
            return Ok(text);
        }
        return std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read narrative from {}", path.display()));
    }

    narrative.context("Provide a narrative, --sample N or --file PATH")
}

/// Submit a narrative and render the recommendations
pub async fn analyze(
    plane: &ControlPlane,
    narrative: &str,
    options: AnalyzeOptions,
    format: OutputFormat,
) -> Result<()> {
    if !options.skip_status_check && !narrative.trim().is_empty() {
        let snapshot = plane.cache.refresh().await;
        if snapshot.get(ServiceName::Backend) != ServiceStatus::Running {
            anyhow::bail!("Backend service is not running. Please deploy services first.");
        }
    }

    let mut result = plane.analysis.analyze(narrative).await?;
    let threshold = plane.settings.confidence_threshold;
    let hidden = if options.above_threshold {
        hide_below_threshold(&mut result, threshold)
    } else {
        0
    };

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => print_result(&result, threshold, hidden),
    }
    Ok(())
}

/// Drop recommendations under the threshold from display, keeping the
/// summary computed over the full set
fn hide_below_threshold(result: &mut AnalysisResult, threshold: f64) -> usize {
    let before = result.recommendations.len();
    result.recommendations.retain(|r| r.score >= threshold);
    before - result.recommendations.len()
}

fn print_result(result: &AnalysisResult, threshold: f64, hidden: usize) {
    let summary = &result.summary;
    println!("{}", "Analysis Summary".bold());
    println!("{}", "=".repeat(50));
    println!("Sections:               {}", summary.section_count);
    println!("Mean confidence:        {}", summary.mean_confidence_label());
    println!("Precedent judgments:    {}", summary.total_judgments);
    println!();

    if summary.section_count == 0 {
        print_warning("The classifier returned no recommendations for this narrative");
        return;
    }

    let rows: Vec<RecommendationRow> = result
        .recommendations
        .iter()
        .enumerate()
        .map(|(i, r)| RecommendationRow {
            rank: i + 1,
            code: r.code.clone(),
            title: r.title.clone(),
            confidence: color_confidence(r.score, threshold),
            judgments: r.judgments.len(),
        })
        .collect();
    print_table(&rows, "No recommendations at or above the confidence threshold");

    if hidden > 0 {
        print_info(&format!(
            "{} recommendation(s) below {:.0}% hidden",
            hidden,
            threshold * 100.0
        ));
    }

    for recommendation in &result.recommendations {
        print_details(recommendation, threshold);
    }
}

fn print_details(recommendation: &Recommendation, threshold: f64) {
    println!();
    println!(
        "{} {}",
        recommendation.code.cyan().bold(),
        recommendation.title.bold()
    );
    if recommendation.score < threshold {
        print_warning("Low confidence; review carefully");
    }
    if !recommendation.description.is_empty() {
        println!("  {}", recommendation.description);
    }
    for judgment in &recommendation.judgments {
        println!("  • {}", judgment.case_name.italic());
        if !judgment.synopsis.is_empty() {
            println!("    {}", judgment.synopsis.dimmed());
        }
    }
}

/// List the sample narratives
pub fn list_samples(format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(&SAMPLE_NARRATIVES)?,
        OutputFormat::Table => {
            let rows: Vec<SampleRow> = SAMPLE_NARRATIVES
                .iter()
                .enumerate()
                .map(|(i, narrative)| SampleRow {
                    index: i + 1,
                    narrative: narrative.to_string(),
                })
                .collect();
            print_table(&rows, "No samples");
        }
    }
    Ok(())
}

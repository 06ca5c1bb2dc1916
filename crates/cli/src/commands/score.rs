//! Score a window of samples and report anomalies

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use colored::Colorize;
use scorer_lib::{
    ingest, report, AnomalyScorer, Report, ScorerMetrics, StructuredLogger,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use tabled::Tabled;
use tokio::io::AsyncReadExt;
use tracing::debug;

use crate::config::Settings;
use crate::output::{
    color_confidence, color_severity, format_deviation, print_info, print_json, print_success,
    print_table, print_warning, OutputFormat,
};

#[derive(Debug, Args)]
pub struct ScoreArgs {
    /// Sample file (JSON array or JSON lines), or - for stdin
    #[arg(long, short)]
    pub input: String,

    /// Deviation ratio threshold (overrides configuration)
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Directory for the report artifact (overrides configuration)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Do not write a report artifact
    #[arg(long)]
    pub no_artifact: bool,

    /// Write Prometheus metrics in text format to this file
    #[arg(long)]
    pub metrics_file: Option<PathBuf>,
}

/// Row for findings table
#[derive(Tabled)]
struct FindingRow {
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Service")]
    service: String,
    #[tabled(rename = "Metric")]
    metric: String,
    #[tabled(rename = "Observed")]
    observed: String,
    #[tabled(rename = "Baseline")]
    baseline: String,
    #[tabled(rename = "Deviation")]
    deviation: String,
    #[tabled(rename = "Confidence")]
    confidence: String,
}

/// Score the input and return exit status 1 when anomalies were found
pub async fn run(args: ScoreArgs, settings: &Settings, format: OutputFormat) -> Result<ExitCode> {
    let logger = StructuredLogger::new("scorer-cli");
    let metrics = ScorerMetrics::new();

    let raw = read_input(&args.input).await?;
    let outcome = ingest::parse_samples(&raw)
        .with_context(|| format!("Failed to parse samples from {}", args.input))?;
    if outcome.rejected > 0 {
        logger.log_rejected(outcome.rejected, "ingest");
    }
    debug!(samples = outcome.samples.len(), "Samples loaded");

    let mut config = settings.scorer_config();
    if let Some(threshold) = args.threshold {
        config.threshold = threshold;
    }
    let scorer = AnomalyScorer::new(config).context("Invalid scorer configuration")?;

    let started = Instant::now();
    let report = scorer.score(&outcome.samples);
    metrics.observe_score_latency(started.elapsed().as_secs_f64());
    metrics.record_report(&report, outcome.samples.len().saturating_sub(report.samples_rejected));
    logger.log_report(&report);

    match format {
        OutputFormat::Text => println!("{}", report::render_text(&report)),
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Table => print_findings(&report),
    }

    if outcome.rejected > 0 {
        print_warning(&format!(
            "{} malformed records in input were ignored",
            outcome.rejected
        ));
    }

    if !args.no_artifact {
        let dir = args.output_dir.as_deref().unwrap_or(settings.output_dir.as_path());
        let path = write_artifact(&report, dir).await?;
        logger.log_report_written(&path.display().to_string(), report.len());
        print_info(&format!("Report saved to: {}", path.display()));
    }

    if let Some(path) = &args.metrics_file {
        let text = metrics.encode_text().context("Failed to encode metrics")?;
        tokio::fs::write(path, text)
            .await
            .with_context(|| format!("Failed to write metrics to {}", path.display()))?;
    }

    if report.has_anomalies() {
        print_warning(&format!("{} anomalies detected!", report.len()));
        Ok(ExitCode::from(1))
    } else {
        print_success("No anomalies detected - all systems normal");
        Ok(ExitCode::SUCCESS)
    }
}

async fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut buffer = String::new();
        tokio::io::stdin()
            .read_to_string(&mut buffer)
            .await
            .context("Failed to read samples from stdin")?;
        return Ok(buffer);
    }

    tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("Failed to read sample file {}", input))
}

/// Write the text report as `anomaly_report_{unix}.txt` under `dir`
async fn write_artifact(report: &Report, dir: &Path) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let path = dir.join(report::artifact_file_name(Utc::now().timestamp()));
    tokio::fs::write(&path, report::render_text(report))
        .await
        .with_context(|| format!("Failed to write report to {}", path.display()))?;

    Ok(path)
}

fn print_findings(report: &Report) {
    println!("{}", "Anomaly Findings".bold());
    println!("Generated: {}", report::format_timestamp(report.generated_at));
    println!();

    let rows: Vec<FindingRow> = report
        .findings
        .iter()
        .map(|f| FindingRow {
            severity: color_severity(f.severity),
            service: f.service.clone().unwrap_or_else(|| "-".to_string()),
            metric: f.metric.clone(),
            observed: format!("{:.3}", f.observed),
            baseline: format!("{:.3}", f.baseline),
            deviation: format_deviation(f.deviation_ratio),
            confidence: color_confidence(f.confidence),
        })
        .collect();
    print_table(rows);

    for (i, finding) in report.findings.iter().enumerate() {
        println!("\n{} {}", format!("#{}", i + 1).bold(), finding.explanation);
        for action in &finding.recommended_actions {
            println!("  - {}", action);
        }
    }

    if !report.skipped.is_empty() {
        println!("\nSkipped {} series without a usable baseline", report.skipped.len());
    }
}

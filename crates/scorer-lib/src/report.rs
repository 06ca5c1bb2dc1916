//! Incident report rendering
//!
//! Turns a scored `Report` into the plain-text incident report written as a
//! timestamped artifact, or into JSON for machine consumers.

use std::fmt::Write;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::Result;
use crate::models::Report;

const RULE_WIDTH: usize = 50;
const SECTION_WIDTH: usize = 40;

/// File name of the report artifact written at `unix_secs`
pub fn artifact_file_name(unix_secs: i64) -> String {
    format!("anomaly_report_{}.txt", unix_secs)
}

/// RFC 3339 rendering of a unix timestamp
pub fn format_timestamp(unix_secs: i64) -> String {
    DateTime::<Utc>::from_timestamp(unix_secs, 0)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_else(|| unix_secs.to_string())
}

/// Render the human-readable incident report
pub fn render_text(report: &Report) -> String {
    if report.findings.is_empty() {
        return "No anomalies detected. All systems operating normally.".to_string();
    }

    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = write_report(&mut out, report);
    out
}

fn write_report(out: &mut String, report: &Report) -> std::fmt::Result {
    writeln!(out, "ANOMALY DETECTION REPORT")?;
    writeln!(out, "{}", "=".repeat(RULE_WIDTH))?;
    writeln!(out, "Generated: {}", format_timestamp(report.generated_at))?;
    writeln!(out, "Total Anomalies: {}", report.findings.len())?;
    writeln!(out)?;

    for (i, finding) in report.findings.iter().enumerate() {
        writeln!(
            out,
            "## Anomaly #{}: {}",
            i + 1,
            finding.severity.as_str().to_uppercase()
        )?;
        if let Some(service) = &finding.service {
            writeln!(out, "Service: {}", service)?;
        }
        writeln!(out, "Metric: {}", finding.metric)?;
        writeln!(out, "Confidence: {:.1}%", finding.confidence * 100.0)?;
        writeln!(out, "Impact: {}", finding.impact_estimate)?;
        writeln!(out)?;
        writeln!(out, "Analysis:")?;
        writeln!(out, "{}", finding.explanation)?;
        writeln!(out)?;
        writeln!(out, "Recommended Actions:")?;
        for action in &finding.recommended_actions {
            writeln!(out, "- {}", action)?;
        }
        writeln!(out)?;
        writeln!(out, "{}", "-".repeat(SECTION_WIDTH))?;
        writeln!(out)?;
    }

    if report.is_correlated() {
        writeln!(out, "## Correlation Analysis")?;
        writeln!(out, "Multiple anomalies detected simultaneously.")?;
        writeln!(
            out,
            "This pattern suggests a systemic issue that may require coordinated response."
        )?;
        writeln!(out)?;
    }

    if !report.skipped.is_empty() || report.samples_rejected > 0 {
        writeln!(
            out,
            "Not scored: {} series, {} malformed samples dropped",
            report.skipped.len(),
            report.samples_rejected
        )?;
    }

    Ok(())
}

/// Pretty-printed JSON form of the report
pub fn render_json(report: &Report) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anomaly::AnomalyScorer;
    use crate::models::MetricSample;

    fn scored(samples: Vec<MetricSample>) -> Report {
        AnomalyScorer::default().score(&samples)
    }

    #[test]
    fn test_artifact_file_name() {
        assert_eq!(artifact_file_name(1_700_000_000), "anomaly_report_1700000000.txt");
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0), "1970-01-01T00:00:00Z");
        assert_eq!(format_timestamp(1_704_067_500), "2024-01-01T00:05:00Z");
    }

    #[test]
    fn test_empty_report() {
        let text = render_text(&Report::empty(0));
        assert_eq!(text, "No anomalies detected. All systems operating normally.");
    }

    #[test]
    fn test_single_finding_sections() {
        let report = scored(vec![
            MetricSample::new("error_rate", 0.02, 0).with_service("payments-service"),
            MetricSample::new("error_rate", 0.2, 300).with_service("payments-service"),
        ]);

        let text = render_text(&report);

        assert!(text.starts_with("ANOMALY DETECTION REPORT\n"));
        assert!(text.contains("Generated: 1970-01-01T00:05:00Z"));
        assert!(text.contains("Total Anomalies: 1"));
        assert!(text.contains("## Anomaly #1: CRITICAL"));
        assert!(text.contains("Service: payments-service"));
        assert!(text.contains("Metric: error_rate"));
        assert!(text.contains("Impact: $200/hour in lost revenue"));
        assert!(text.contains("- Investigate recent deployments or configuration changes"));
        assert!(!text.contains("Correlation Analysis"));
    }

    #[test]
    fn test_correlation_note_for_multiple_findings() {
        let report = scored(vec![
            MetricSample::new("errors", 10.0, 0),
            MetricSample::new("errors", 50.0, 60),
            MetricSample::new("cpu_usage", 0.2, 0),
            MetricSample::new("cpu_usage", 0.9, 60),
        ]);

        let text = render_text(&report);

        assert!(text.contains("## Anomaly #2"));
        assert!(text.contains("## Correlation Analysis"));
    }

    #[test]
    fn test_not_scored_footer() {
        let report = scored(vec![
            MetricSample::new("errors", 10.0, 0),
            MetricSample::new("errors", 50.0, 60),
            MetricSample::new("latency", 0.3, 0),
            MetricSample::new("latency", f64::NAN, 60),
        ]);

        let text = render_text(&report);

        assert!(text.contains("Not scored: 1 series, 1 malformed samples dropped"));
    }

    #[test]
    fn test_json_round_trip() {
        let report = scored(vec![
            MetricSample::new("errors", 10.0, 0),
            MetricSample::new("errors", 40.0, 60),
        ]);

        let json = render_json(&report).unwrap();
        let parsed: Report = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, report);
        assert!(json.contains("\"severity\": \"high\""));
    }
}

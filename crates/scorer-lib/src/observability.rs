//! Observability infrastructure for the anomaly scorer
//!
//! Provides:
//! - Prometheus metrics (scoring latency, samples scored and rejected, findings by severity)
//! - Structured JSON logging with tracing

use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Encoder, Histogram, IntCounter, IntCounterVec, IntGauge, TextEncoder,
};
use std::sync::OnceLock;
use tracing::{info, warn};

use crate::models::{AnomalyFinding, Report, Severity, SkippedSeries};

/// Histogram buckets for scoring latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<ScorerMetricsInner> = OnceLock::new();

struct ScorerMetricsInner {
    score_latency_seconds: Histogram,
    samples_scored: IntCounter,
    samples_rejected: IntCounter,
    findings: IntCounterVec,
    series_skipped: IntCounterVec,
    last_report_findings: IntGauge,
}

impl ScorerMetricsInner {
    fn new() -> Self {
        Self {
            score_latency_seconds: register_histogram!(
                "anomaly_scorer_score_latency_seconds",
                "Time spent scoring one sample window",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register score_latency_seconds"),

            samples_scored: register_int_counter!(
                "anomaly_scorer_samples_scored_total",
                "Total number of well-formed samples scored"
            )
            .expect("Failed to register samples_scored"),

            samples_rejected: register_int_counter!(
                "anomaly_scorer_samples_rejected_total",
                "Total number of malformed samples dropped before scoring"
            )
            .expect("Failed to register samples_rejected"),

            findings: register_int_counter_vec!(
                "anomaly_scorer_findings_total",
                "Total number of anomaly findings by severity",
                &["severity"]
            )
            .expect("Failed to register findings"),

            series_skipped: register_int_counter_vec!(
                "anomaly_scorer_series_skipped_total",
                "Total number of series skipped by reason",
                &["reason"]
            )
            .expect("Failed to register series_skipped"),

            last_report_findings: register_int_gauge!(
                "anomaly_scorer_last_report_findings",
                "Number of findings in the most recent report"
            )
            .expect("Failed to register last_report_findings"),
        }
    }
}

/// Scorer metrics for Prometheus exposition
///
/// Lightweight handle to the global metrics instance; clones share
/// the same underlying metrics.
#[derive(Clone)]
pub struct ScorerMetrics {
    _private: (),
}

impl Default for ScorerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ScorerMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ScorerMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ScorerMetricsInner {
        GLOBAL_METRICS.get_or_init(ScorerMetricsInner::new)
    }

    pub fn observe_score_latency(&self, duration_secs: f64) {
        self.inner().score_latency_seconds.observe(duration_secs);
    }

    /// Record the counts carried by a finished report
    pub fn record_report(&self, report: &Report, samples_scored: usize) {
        let inner = self.inner();
        inner.samples_scored.inc_by(samples_scored as u64);
        inner.samples_rejected.inc_by(report.samples_rejected as u64);

        for finding in &report.findings {
            inner
                .findings
                .with_label_values(&[finding.severity.as_str()])
                .inc();
        }
        for skipped in &report.skipped {
            inner
                .series_skipped
                .with_label_values(&[skipped.reason.as_str()])
                .inc();
        }

        inner.last_report_findings.set(report.findings.len() as i64);
    }

    /// Render the default registry in the Prometheus text format
    pub fn encode_text(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&prometheus::gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

/// Structured logger for scorer events
///
/// Provides consistent field names for findings, skipped series and
/// report artifacts.
#[derive(Clone)]
pub struct StructuredLogger {
    source: String,
}

impl StructuredLogger {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    pub fn log_startup(&self, version: &str) {
        info!(
            event = "scorer_started",
            source = %self.source,
            version = %version,
            "Anomaly scorer started"
        );
    }

    /// Log a finding; critical findings are logged at warn
    pub fn log_finding(&self, finding: &AnomalyFinding) {
        let service = finding.service.as_deref().unwrap_or("-");
        if finding.severity == Severity::Critical {
            warn!(
                event = "finding_detected",
                source = %self.source,
                metric = %finding.metric,
                service = %service,
                severity = %finding.severity,
                observed = finding.observed,
                baseline = finding.baseline,
                deviation_ratio = finding.deviation_ratio,
                confidence = finding.confidence,
                "Critical anomaly detected"
            );
        } else {
            info!(
                event = "finding_detected",
                source = %self.source,
                metric = %finding.metric,
                service = %service,
                severity = %finding.severity,
                observed = finding.observed,
                baseline = finding.baseline,
                deviation_ratio = finding.deviation_ratio,
                confidence = finding.confidence,
                "Anomaly detected"
            );
        }
    }

    pub fn log_skipped(&self, skipped: &SkippedSeries) {
        info!(
            event = "series_skipped",
            source = %self.source,
            metric = %skipped.metric,
            service = %skipped.service.as_deref().unwrap_or("-"),
            reason = %skipped.reason.as_str(),
            detail = %skipped.reason,
            "Series not scored"
        );
    }

    pub fn log_rejected(&self, count: usize, stage: &str) {
        warn!(
            event = "samples_rejected",
            source = %self.source,
            count = count,
            stage = %stage,
            "Dropped malformed samples"
        );
    }

    /// Log every event carried by a report
    pub fn log_report(&self, report: &Report) {
        for finding in &report.findings {
            self.log_finding(finding);
        }
        for skipped in &report.skipped {
            self.log_skipped(skipped);
        }
        if report.samples_rejected > 0 {
            self.log_rejected(report.samples_rejected, "score");
        }
    }

    pub fn log_report_written(&self, path: &str, findings: usize) {
        info!(
            event = "report_written",
            source = %self.source,
            path = %path,
            findings = findings,
            "Report saved"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anomaly::AnomalyScorer;
    use crate::models::MetricSample;

    #[test]
    fn test_scorer_metrics_recording() {
        let metrics = ScorerMetrics::new();
        let report = AnomalyScorer::default().score(&[
            MetricSample::new("errors", 10.0, 0),
            MetricSample::new("errors", 40.0, 60),
            MetricSample::new("latency", 0.1, 0),
            MetricSample::new("latency", f64::NAN, 0),
        ]);

        metrics.observe_score_latency(0.0001);
        metrics.record_report(&report, 3);

        let text = metrics.encode_text().unwrap();
        assert!(text.contains("anomaly_scorer_findings_total{severity=\"high\"}"));
        assert!(text.contains("anomaly_scorer_series_skipped_total{reason=\"insufficient_samples\"}"));
        assert!(text.contains("anomaly_scorer_last_report_findings"));
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("test-source");
        assert_eq!(logger.source, "test-source");
    }
}

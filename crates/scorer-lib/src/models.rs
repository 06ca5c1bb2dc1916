//! Core data models for the anomaly scorer

use serde::{Deserialize, Serialize};

/// A single timestamped observation of an operational metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub metric: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    pub value: f64,
    /// Unix timestamp in seconds
    pub timestamp: i64,
}

impl MetricSample {
    pub fn new(metric: impl Into<String>, value: f64, timestamp: i64) -> Self {
        Self {
            metric: metric.into(),
            service: None,
            value,
            timestamp,
        }
    }

    /// Attach the service that emitted this sample
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    /// A sample can be scored when it names a metric and carries a finite value
    pub fn is_well_formed(&self) -> bool {
        !self.metric.trim().is_empty() && self.value.is_finite()
    }

    pub fn series_key(&self) -> SeriesKey {
        SeriesKey {
            metric: self.metric.clone(),
            service: self.service.clone(),
        }
    }
}

/// Identifies one time series: a metric name, optionally scoped to a service
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SeriesKey {
    pub metric: String,
    pub service: Option<String>,
}

impl std::fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.service {
            Some(service) => write!(f, "{}/{}", service, self.metric),
            None => write!(f, "{}", self.metric),
        }
    }
}

/// Severity of a finding, ordered from least to most urgent
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Classify a deviation ratio. A ratio of 4.0 means the latest value is 5x baseline.
    pub fn from_deviation(deviation_ratio: f64) -> Self {
        if deviation_ratio >= 4.0 {
            Severity::Critical
        } else if deviation_ratio >= 2.0 {
            Severity::High
        } else if deviation_ratio >= 1.0 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scored, explained deviation of one series from its trailing baseline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyFinding {
    pub metric: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    /// Most recent value in the series
    pub observed: f64,
    /// Mean of every sample except the most recent
    pub baseline: f64,
    /// (observed - baseline) / baseline
    pub deviation_ratio: f64,
    /// Confidence score in [0, 1]
    pub confidence: f64,
    pub severity: Severity,
    pub explanation: String,
    pub recommended_actions: Vec<String>,
    pub impact_estimate: String,
    pub samples_analyzed: usize,
    /// Timestamp of the observed sample
    pub observed_at: i64,
}

/// Why a series produced no verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    InsufficientSamples { found: usize, required: usize },
    /// Baseline of zero leaves the deviation ratio undefined
    ZeroBaseline,
    /// A negative baseline flips the sign of the ratio, so "increase" is meaningless
    NegativeBaseline,
    /// Values so large or so close to zero that the ratio overflows
    NonFiniteDeviation,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::InsufficientSamples { .. } => "insufficient_samples",
            SkipReason::ZeroBaseline => "zero_baseline",
            SkipReason::NegativeBaseline => "negative_baseline",
            SkipReason::NonFiniteDeviation => "non_finite_deviation",
        }
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::InsufficientSamples { found, required } => {
                write!(f, "{} of {} required samples", found, required)
            }
            SkipReason::ZeroBaseline => write!(f, "baseline is zero, deviation undefined"),
            SkipReason::NegativeBaseline => write!(f, "baseline is negative, deviation undefined"),
            SkipReason::NonFiniteDeviation => write!(f, "deviation ratio is not finite"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedSeries {
    pub metric: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    pub reason: SkipReason,
}

/// Outcome of scoring one window. Findings are sorted by descending confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Unix timestamp of the newest sample scored (0 for an empty window)
    pub generated_at: i64,
    pub findings: Vec<AnomalyFinding>,
    #[serde(default)]
    pub skipped: Vec<SkippedSeries>,
    #[serde(default)]
    pub samples_rejected: usize,
}

impl Report {
    pub fn empty(generated_at: i64) -> Self {
        Self {
            generated_at,
            findings: Vec::new(),
            skipped: Vec::new(),
            samples_rejected: 0,
        }
    }

    pub fn has_anomalies(&self) -> bool {
        !self.findings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn highest_severity(&self) -> Option<Severity> {
        self.findings.iter().map(|f| f.severity).max()
    }

    /// Several simultaneous findings usually point at one systemic cause
    pub fn is_correlated(&self) -> bool {
        self.findings.len() > 1
    }
}

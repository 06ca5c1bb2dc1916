//! Trailing-baseline deviation scoring
//!
//! For every series in a window the most recent sample is compared with the
//! mean of the samples before it. A relative increase at or above the
//! configured threshold becomes a finding whose confidence grows with the
//! size of the deviation.

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};

use super::remediation;
use crate::error::{Result, ScorerError};
use crate::models::{
    AnomalyFinding, MetricSample, Report, SeriesKey, Severity, SkipReason, SkippedSeries,
};
use crate::window::{SampleWindow, DEFAULT_WINDOW_CAPACITY};

/// Minimum samples needed for a baseline plus one observation
pub const MIN_SAMPLES_FOR_BASELINE: usize = 2;

/// Default deviation ratio threshold (2.0 = latest is 200% above baseline)
pub const DEFAULT_THRESHOLD: f64 = 2.0;

/// Deviation ratio at which confidence reaches 0.5
const DEFAULT_CONFIDENCE_SCALE: f64 = 2.0;

const DEFAULT_MAX_CONFIDENCE: f64 = 0.95;

/// Scorer tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScorerConfig {
    /// Deviation ratio at or above which a finding is emitted
    pub threshold: f64,
    /// Per-metric threshold overrides, keyed by metric name
    pub thresholds: BTreeMap<String, f64>,
    /// Samples a series needs before it is scored
    pub min_samples: usize,
    /// Samples retained per series
    pub window_capacity: usize,
    /// Deviation ratio at which confidence reaches 0.5
    pub confidence_scale: f64,
    /// Upper clip for confidence scores
    pub max_confidence: f64,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            thresholds: BTreeMap::new(),
            min_samples: MIN_SAMPLES_FOR_BASELINE,
            window_capacity: DEFAULT_WINDOW_CAPACITY,
            confidence_scale: DEFAULT_CONFIDENCE_SCALE,
            max_confidence: DEFAULT_MAX_CONFIDENCE,
        }
    }
}

impl ScorerConfig {
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_metric_threshold(mut self, metric: impl Into<String>, threshold: f64) -> Self {
        self.thresholds.insert(metric.into(), threshold);
        self
    }

    pub fn with_window_capacity(mut self, capacity: usize) -> Self {
        self.window_capacity = capacity;
        self
    }

    pub fn threshold_for(&self, metric: &str) -> f64 {
        self.thresholds.get(metric).copied().unwrap_or(self.threshold)
    }

    pub fn validate(&self) -> Result<()> {
        let thresholds = std::iter::once(("default", self.threshold))
            .chain(self.thresholds.iter().map(|(k, v)| (k.as_str(), *v)));
        for (metric, threshold) in thresholds {
            if !threshold.is_finite() || threshold <= 0.0 {
                return Err(ScorerError::InvalidConfig(format!(
                    "threshold for {} must be a positive number, got {}",
                    metric, threshold
                )));
            }
        }

        if self.min_samples < MIN_SAMPLES_FOR_BASELINE {
            return Err(ScorerError::InvalidConfig(format!(
                "min_samples must be at least {}, got {}",
                MIN_SAMPLES_FOR_BASELINE, self.min_samples
            )));
        }

        if self.window_capacity < self.min_samples {
            return Err(ScorerError::InvalidConfig(format!(
                "window_capacity ({}) must be at least min_samples ({})",
                self.window_capacity, self.min_samples
            )));
        }

        if !self.confidence_scale.is_finite() || self.confidence_scale <= 0.0 {
            return Err(ScorerError::InvalidConfig(format!(
                "confidence_scale must be a positive number, got {}",
                self.confidence_scale
            )));
        }

        if !(self.max_confidence > 0.0 && self.max_confidence <= 1.0) {
            return Err(ScorerError::InvalidConfig(format!(
                "max_confidence must be in (0, 1], got {}",
                self.max_confidence
            )));
        }

        Ok(())
    }
}

/// Scores sample windows into reports. Stateless; `score` is a pure function.
#[derive(Debug, Clone, Default)]
pub struct AnomalyScorer {
    config: ScorerConfig,
}

impl AnomalyScorer {
    pub fn new(config: ScorerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ScorerConfig {
        &self.config
    }

    /// Score a window of samples in any order
    ///
    /// Malformed samples are dropped and counted in `samples_rejected`.
    /// Series that cannot be scored are listed in `skipped`.
    pub fn score(&self, window: &[MetricSample]) -> Report {
        let mut rejected = 0;
        let accepted = window.iter().filter(|sample| {
            let ok = sample.is_well_formed();
            if !ok {
                rejected += 1;
            }
            ok
        });
        let window = SampleWindow::from_samples(self.config.window_capacity, accepted.cloned());

        let mut report = self.score_window(&window);
        report.samples_rejected = rejected;
        report
    }

    /// Score an already assembled window
    pub fn score_window(&self, window: &SampleWindow) -> Report {
        let mut report = Report::empty(window.latest_timestamp().unwrap_or(0));

        for (key, samples) in window.series() {
            match self.evaluate(key, samples) {
                Ok(Some(finding)) => report.findings.push(finding),
                Ok(None) => {}
                Err(reason) => report.skipped.push(SkippedSeries {
                    metric: key.metric.clone(),
                    service: key.service.clone(),
                    reason,
                }),
            }
        }

        report.findings.sort_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then_with(|| a.metric.cmp(&b.metric))
                .then_with(|| a.service.cmp(&b.service))
        });

        report
    }

    /// Evaluate one series, oldest sample first
    fn evaluate(
        &self,
        key: &SeriesKey,
        samples: &VecDeque<MetricSample>,
    ) -> std::result::Result<Option<AnomalyFinding>, SkipReason> {
        let count = samples.len();
        if count < self.config.min_samples {
            return Err(SkipReason::InsufficientSamples {
                found: count,
                required: self.config.min_samples,
            });
        }

        let Some(latest) = samples.back() else {
            return Err(SkipReason::InsufficientSamples {
                found: 0,
                required: self.config.min_samples,
            });
        };

        let baseline = trailing_mean(samples.iter().take(count - 1).map(|s| s.value));

        if baseline == 0.0 {
            return Err(SkipReason::ZeroBaseline);
        }
        if baseline < 0.0 {
            return Err(SkipReason::NegativeBaseline);
        }

        let deviation_ratio = (latest.value - baseline) / baseline;
        if !deviation_ratio.is_finite() {
            return Err(SkipReason::NonFiniteDeviation);
        }
        if deviation_ratio < self.config.threshold_for(&key.metric) {
            return Ok(None);
        }

        let severity = Severity::from_deviation(deviation_ratio);
        let remediation = remediation::lookup(&key.metric);

        Ok(Some(AnomalyFinding {
            metric: key.metric.clone(),
            service: key.service.clone(),
            observed: latest.value,
            baseline,
            deviation_ratio,
            confidence: self.confidence(deviation_ratio),
            severity,
            explanation: explain(key, latest.value, baseline, deviation_ratio, remediation.cause),
            recommended_actions: remediation.action_list(),
            impact_estimate: remediation.impact_for(severity, latest.value),
            samples_analyzed: count,
            observed_at: latest.timestamp,
        }))
    }

    /// Saturating, monotonic in the deviation magnitude, clipped to [0, max_confidence]
    fn confidence(&self, deviation_ratio: f64) -> f64 {
        if deviation_ratio.is_nan() {
            return 0.0;
        }
        let magnitude = deviation_ratio.max(0.0);
        if magnitude.is_infinite() {
            return self.config.max_confidence;
        }
        let score = magnitude / (magnitude + self.config.confidence_scale);
        score.clamp(0.0, self.config.max_confidence)
    }
}

/// Running mean; stays finite for finite inputs near `f64::MAX`
fn trailing_mean(values: impl Iterator<Item = f64>) -> f64 {
    values
        .enumerate()
        .fold(0.0, |mean, (i, x)| mean + (x - mean) / (i + 1) as f64)
}

fn explain(key: &SeriesKey, observed: f64, baseline: f64, deviation_ratio: f64, cause: &str) -> String {
    let scope = match &key.service {
        Some(service) => format!(" on {}", service),
        None => String::new(),
    };
    format!(
        "{:.0}% increase in {}{} ({} vs baseline {}) suggests {}.",
        deviation_ratio * 100.0,
        key.metric,
        scope,
        format_value(observed),
        format_value(baseline),
        cause
    )
}

/// Render whole numbers without decimals, everything else with up to 3
fn format_value(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{:.0}", value)
    } else {
        let formatted = format!("{:.3}", value);
        formatted.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn errors(values: &[f64]) -> Vec<MetricSample> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| MetricSample::new("errors", *v, i as i64 * 60))
            .collect()
    }

    #[test]
    fn test_config_validation() {
        assert!(ScorerConfig::default().validate().is_ok());
        assert!(ScorerConfig::default().with_threshold(0.0).validate().is_err());
        assert!(ScorerConfig::default().with_threshold(f64::NAN).validate().is_err());
        assert!(ScorerConfig::default()
            .with_metric_threshold("errors", -1.0)
            .validate()
            .is_err());
        assert!(ScorerConfig::default().with_window_capacity(1).validate().is_err());

        let config = ScorerConfig {
            min_samples: 1,
            ..Default::default()
        };
        assert!(matches!(
            AnomalyScorer::new(config),
            Err(ScorerError::InvalidConfig(_))
        ));

        let config = ScorerConfig {
            max_confidence: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_threshold_override() {
        let config = ScorerConfig::default().with_metric_threshold("response_time", 1.0);
        assert_eq!(config.threshold_for("response_time"), 1.0);
        assert_eq!(config.threshold_for("errors"), DEFAULT_THRESHOLD);
    }

    #[test]
    fn test_confidence_is_monotonic_and_clipped() {
        let scorer = AnomalyScorer::default();
        let mut previous = 0.0;
        for step in 0..200 {
            let c = scorer.confidence(step as f64 * 0.5);
            assert!(c >= previous);
            assert!((0.0..=1.0).contains(&c));
            previous = c;
        }
        assert_eq!(scorer.confidence(1e9), DEFAULT_MAX_CONFIDENCE);
        assert_eq!(scorer.confidence(-3.0), 0.0);
        assert_eq!(scorer.confidence(f64::INFINITY), DEFAULT_MAX_CONFIDENCE);
        assert_eq!(scorer.confidence(f64::NAN), 0.0);
    }

    #[test]
    fn test_trailing_mean_does_not_overflow() {
        assert_eq!(trailing_mean([10.0, 20.0].into_iter()), 15.0);
        assert_eq!(trailing_mean([1e308, 1e308].into_iter()), 1e308);
        assert!(trailing_mean([f64::MAX, f64::MAX, f64::MAX].into_iter()).is_finite());
    }

    #[test]
    fn test_baseline_excludes_latest() {
        let scorer = AnomalyScorer::default();
        let report = scorer.score(&errors(&[10.0, 20.0, 90.0]));

        let finding = &report.findings[0];
        assert_eq!(finding.baseline, 15.0);
        assert_eq!(finding.observed, 90.0);
        assert_eq!(finding.deviation_ratio, (90.0 - 15.0) / 15.0);
        assert_eq!(finding.samples_analyzed, 3);
        assert_eq!(finding.observed_at, 120);
    }

    #[test]
    fn test_explanation_template() {
        let scorer = AnomalyScorer::default();
        let report = scorer.score(&errors(&[10.0, 40.0]));

        assert_eq!(
            report.findings[0].explanation,
            "300% increase in errors (40 vs baseline 10) suggests degraded service \
             reliability, often after a deployment or a dependency failure."
        );
    }

    #[test]
    fn test_explanation_names_service() {
        let scorer = AnomalyScorer::default();
        let samples = vec![
            MetricSample::new("cpu_usage", 0.3, 0).with_service("payments-service"),
            MetricSample::new("cpu_usage", 0.95, 300).with_service("payments-service"),
        ];
        let report = scorer.score(&samples);

        let finding = &report.findings[0];
        assert_eq!(finding.service.as_deref(), Some("payments-service"));
        assert!(finding
            .explanation
            .starts_with("217% increase in cpu_usage on payments-service (0.95 vs baseline 0.3)"));
    }

    #[test]
    fn test_decrease_is_not_a_finding() {
        let scorer = AnomalyScorer::default();
        let report = scorer.score(&errors(&[40.0, 10.0]));
        assert!(report.findings.is_empty());
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(40.0), "40");
        assert_eq!(format_value(0.25), "0.25");
        assert_eq!(format_value(1.0 / 3.0), "0.333");
        assert_eq!(format_value(-2.0), "-2");
    }
}

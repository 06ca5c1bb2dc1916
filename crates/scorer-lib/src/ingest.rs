//! Sample ingestion
//!
//! Reads metric samples from a JSON array or JSON lines. Individual records
//! that are missing fields or carry the wrong types are counted and dropped;
//! only an unreadable top-level document is an error.

use std::path::Path;

use chrono::DateTime;
use serde_json::Value;
use tracing::debug;

use crate::error::Result;
use crate::models::MetricSample;

/// Samples accepted from a document plus the number of records dropped
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestOutcome {
    pub samples: Vec<MetricSample>,
    pub rejected: usize,
}

impl IngestOutcome {
    fn push_record(&mut self, record: &Value) {
        match sample_from_record(record) {
            Some(sample) => self.samples.push(sample),
            None => {
                debug!(record = %record, "Dropping malformed sample record");
                self.rejected += 1;
            }
        }
    }
}

/// Parse a JSON array of samples, or one sample object per line
pub fn parse_samples(input: &str) -> Result<IngestOutcome> {
    let trimmed = input.trim_start();
    let mut outcome = IngestOutcome::default();

    if trimmed.is_empty() {
        return Ok(outcome);
    }

    if trimmed.starts_with('[') {
        let records: Vec<Value> = serde_json::from_str(trimmed)?;
        for record in &records {
            outcome.push_record(record);
        }
        return Ok(outcome);
    }

    for line in trimmed.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match serde_json::from_str::<Value>(line) {
            Ok(record) => outcome.push_record(&record),
            Err(e) => {
                debug!(error = %e, "Dropping unparseable sample line");
                outcome.rejected += 1;
            }
        }
    }

    Ok(outcome)
}

/// Read and parse a sample file
pub fn load_samples(path: impl AsRef<Path>) -> Result<IngestOutcome> {
    let content = std::fs::read_to_string(path.as_ref())?;
    parse_samples(&content)
}

fn sample_from_record(record: &Value) -> Option<MetricSample> {
    let obj = record.as_object()?;

    let metric = obj
        .get("metric")
        .or_else(|| obj.get("metric_name"))
        .and_then(Value::as_str)?;
    let value = obj.get("value").and_then(Value::as_f64)?;
    let timestamp = obj.get("timestamp").and_then(parse_timestamp)?;
    let service = obj.get("service").and_then(Value::as_str);

    let mut sample = MetricSample::new(metric, value, timestamp);
    if let Some(service) = service {
        sample = sample.with_service(service);
    }

    sample.is_well_formed().then_some(sample)
}

/// Unix seconds (integer or float) or an RFC 3339 string
fn parse_timestamp(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.floor() as i64)),
        Value::String(s) => DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.timestamp()),
        _ => None,
    }
}

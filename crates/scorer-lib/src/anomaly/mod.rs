//! Anomaly scoring for operational metrics
//!
//! This module provides:
//! - Trailing-baseline deviation scoring with confidence ranking
//! - A static remediation catalog explaining each finding

mod remediation;
mod scorer;


pub use remediation::{catalog, lookup, Remediation};
pub use scorer::{AnomalyScorer, ScorerConfig, DEFAULT_THRESHOLD, MIN_SAMPLES_FOR_BASELINE};

//! Scoring library for operational metric anomalies
//!
//! This crate provides the core functionality for:
//! - Bounded per-series sample windows
//! - Baseline deviation scoring with explained findings
//! - Lenient ingestion of sample files
//! - Incident report rendering
//! - Prometheus metrics and structured logging

pub mod anomaly;
pub mod error;
pub mod ingest;
pub mod models;
pub mod observability;
pub mod report;
pub mod window;

pub use anomaly::{AnomalyScorer, ScorerConfig};
pub use error::{Result, ScorerError};
pub use models::*;
pub use observability::{ScorerMetrics, StructuredLogger};
pub use window::SampleWindow;

//! Generate a synthetic sample window for demos and smoke tests

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::Args;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use scorer_lib::MetricSample;
use std::path::PathBuf;

use crate::output::print_info;

/// Services emitting simulated metrics
const SERVICES: &[&str] = &[
    "ai-devops-demo",
    "product-details",
    "payments-service",
    "user-profiles",
];

/// Spacing between simulated samples (5 minutes)
const STEP_SECS: i64 = 5 * 60;

#[derive(Debug, Args)]
pub struct SimulateArgs {
    /// Samples generated per service and metric
    #[arg(long, default_value_t = 20)]
    pub points: usize,

    /// Seed for reproducible output
    #[arg(long)]
    pub seed: Option<u64>,

    /// Probability that any sample is an injected spike
    #[arg(long, default_value_t = 0.2)]
    pub anomaly_rate: f64,

    /// Unix timestamp of the newest sample (defaults to now)
    #[arg(long)]
    pub end: Option<i64>,

    /// Write samples to this file instead of stdout
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

pub async fn run(args: SimulateArgs) -> Result<()> {
    if !(0.0..=1.0).contains(&args.anomaly_rate) {
        bail!("--anomaly-rate must be between 0 and 1, got {}", args.anomaly_rate);
    }

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let end = args.end.unwrap_or_else(|| Utc::now().timestamp());

    let samples = generate(&mut rng, args.points, args.anomaly_rate, end);
    let json = serde_json::to_string_pretty(&samples)?;

    match &args.output {
        Some(path) => {
            tokio::fs::write(path, json)
                .await
                .with_context(|| format!("Failed to write samples to {}", path.display()))?;
            print_info(&format!(
                "Wrote {} samples to {}",
                samples.len(),
                path.display()
            ));
        }
        None => println!("{}", json),
    }

    Ok(())
}

/// Error rate and CPU usage for every service, oldest first
fn generate<R: Rng>(rng: &mut R, points: usize, anomaly_rate: f64, end: i64) -> Vec<MetricSample> {
    let mut samples = Vec::with_capacity(points * SERVICES.len() * 2);

    for step in 0..points {
        let timestamp = end - (points - 1 - step) as i64 * STEP_SECS;

        for service in SERVICES {
            let error_rate = if rng.gen_bool(anomaly_rate) {
                rng.gen_range(0.1..0.3)
            } else {
                rng.gen_range(0.01..0.04)
            };
            let cpu_usage = if rng.gen_bool(anomaly_rate) {
                rng.gen_range(0.85..0.95)
            } else {
                rng.gen_range(0.2..0.4)
            };

            samples.push(MetricSample::new("error_rate", error_rate, timestamp).with_service(*service));
            samples.push(MetricSample::new("cpu_usage", cpu_usage, timestamp).with_service(*service));
        }
    }

    samples
}

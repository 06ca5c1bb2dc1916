//! Configuration management for the CLI
//!
//! Settings are layered: built-in defaults, then the config file
//! (`~/.config/scorer/config.toml` or `--config`), then `SCORER_*`
//! environment variables. Command-line flags are applied last by the
//! individual commands.

use anyhow::{Context, Result};
use clap::ValueEnum;
use scorer_lib::ScorerConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

/// CLI settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Deviation ratio at or above which a finding is emitted
    pub threshold: f64,
    /// Per-metric threshold overrides
    pub thresholds: BTreeMap<String, f64>,
    /// Samples a series needs before it is scored
    pub min_samples: usize,
    /// Samples retained per series
    pub window_capacity: usize,
    /// Deviation ratio at which confidence reaches 0.5
    pub confidence_scale: f64,
    /// Upper clip for confidence scores
    pub max_confidence: f64,
    /// Directory receiving report artifacts
    pub output_dir: PathBuf,
    pub log_format: LogFormat,
}

impl Default for Settings {
    fn default() -> Self {
        let scorer = ScorerConfig::default();
        Self {
            threshold: scorer.threshold,
            thresholds: scorer.thresholds,
            min_samples: scorer.min_samples,
            window_capacity: scorer.window_capacity,
            confidence_scale: scorer.confidence_scale,
            max_confidence: scorer.max_confidence,
            output_dir: PathBuf::from("."),
            log_format: LogFormat::default(),
        }
    }
}

impl Settings {
    /// Load settings from the config file and environment
    ///
    /// An explicit `path` must exist; the default location is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        match path {
            Some(path) => {
                builder = builder.add_source(config::File::from(path.to_path_buf()).required(true));
            }
            None => {
                if let Some(default_path) = Self::config_path() {
                    builder = builder.add_source(config::File::from(default_path).required(false));
                }
            }
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix("SCORER")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read configuration")?;

        settings
            .try_deserialize()
            .context("Failed to parse configuration")
    }

    /// Scorer tuning derived from these settings
    pub fn scorer_config(&self) -> ScorerConfig {
        ScorerConfig {
            threshold: self.threshold,
            thresholds: self.thresholds.clone(),
            min_samples: self.min_samples,
            window_capacity: self.window_capacity,
            confidence_scale: self.confidence_scale,
            max_confidence: self.max_confidence,
        }
    }

    /// Default configuration file path
    fn config_path() -> Option<PathBuf> {
        dirs_next::home_dir().map(|home| home.join(".config").join("scorer").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_defaults_match_scorer() {
        let settings = Settings::default();
        assert_eq!(settings.scorer_config(), ScorerConfig::default());
        assert_eq!(settings.output_dir, PathBuf::from("."));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "threshold = 1.5\nwindow_capacity = 30\noutput_dir = \"/tmp/reports\"\n\n[thresholds]\nresponse_time = 1.0"
        )
        .unwrap();

        let settings = Settings::load(Some(file.path())).unwrap();

        assert_eq!(settings.threshold, 1.5);
        assert_eq!(settings.window_capacity, 30);
        assert_eq!(settings.output_dir, PathBuf::from("/tmp/reports"));
        assert_eq!(settings.scorer_config().threshold_for("response_time"), 1.0);
        assert_eq!(settings.min_samples, 2);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        assert!(Settings::load(Some(Path::new("/nonexistent/scorer.toml"))).is_err());
    }
}

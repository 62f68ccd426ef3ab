//! Monitor configuration
//!
//! Built by the binary from CLI flags / env vars, validated once before the
//! run starts.

use std::num::NonZeroU64;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::error::{MonitorError, Result};

/// Confidence tracker configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Track prediction confidence at all
    pub enabled: bool,

    /// Confidence (percent, 0 - 100) below which a prediction is "low"
    pub threshold: f32,

    /// Percent of low predictions per interval that raises an alert
    pub degradation_percent: f32,

    /// Keep low-confidence samples for later inspection
    pub capture_low_confidence_samples: bool,

    /// Capture ring capacity (oldest evicted first)
    pub capture_capacity: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            threshold: constants::DEFAULT_CONF_THRESHOLD,
            degradation_percent: constants::DEFAULT_CONF_PERCENT,
            capture_low_confidence_samples: false,
            capture_capacity: constants::DEFAULT_CAPTURE_CAPACITY,
        }
    }
}

impl TrackerConfig {
    pub fn enabled(threshold: f32, degradation_percent: f32) -> Self {
        Self {
            enabled: true,
            threshold,
            degradation_percent,
            ..Default::default()
        }
    }

    pub fn with_capture(mut self, capacity: usize) -> Self {
        self.capture_low_confidence_samples = true;
        self.capture_capacity = capacity;
        self
    }

    /// Size of the recent-confidence window
    pub fn window_size(&self) -> usize {
        if self.capture_low_confidence_samples {
            self.capture_capacity
        } else {
            constants::DEFAULT_CONFIDENCE_WINDOW
        }
    }

    pub fn validate(&self) -> Result<()> {
        check_percent("tracker.threshold", self.threshold)?;
        check_percent("tracker.degradation_percent", self.degradation_percent)?;
        if self.capture_low_confidence_samples && self.capture_capacity == 0 {
            return Err(MonitorError::Config(
                "tracker.capture_capacity must be > 0 when capture is enabled".to_string(),
            ));
        }
        Ok(())
    }
}

fn check_percent(name: &str, value: f32) -> Result<()> {
    if !(0.0..=100.0).contains(&value) {
        return Err(MonitorError::Config(format!(
            "{} must be within 0-100, got {}",
            name, value
        )));
    }
    Ok(())
}

/// Whole-run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Predictions per report
    pub report_interval: NonZeroU64,

    pub tracker: TrackerConfig,

    /// Prediction output (one class index per line)
    pub output_file: PathBuf,

    /// Telemetry JSONL directory
    pub telemetry_dir: PathBuf,

    /// Captured low-confidence samples export
    pub low_confidence_file: PathBuf,

    /// Column labels for the distribution stats
    pub class_labels: Vec<String>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            report_interval: NonZeroU64::new(constants::DEFAULT_REPORT_INTERVAL)
                .unwrap_or(NonZeroU64::MIN),
            tracker: TrackerConfig::default(),
            output_file: constants::default_output_file(),
            telemetry_dir: constants::default_telemetry_dir(),
            low_confidence_file: constants::default_low_confidence_file(),
            class_labels: constants::default_class_labels(constants::DEFAULT_NUM_CLASSES),
        }
    }
}

impl MonitorConfig {
    /// Build a report interval from a raw count
    pub fn report_interval_from(value: u64) -> Result<NonZeroU64> {
        NonZeroU64::new(value)
            .ok_or_else(|| MonitorError::Config("report_interval must be > 0".to_string()))
    }

    pub fn num_classes(&self) -> usize {
        self.class_labels.len()
    }

    /// Check the config against the model's class count
    pub fn validate(&self, model_classes: usize) -> Result<()> {
        self.tracker.validate()?;
        if self.class_labels.is_empty() {
            return Err(MonitorError::Config("at least one class label is required".to_string()));
        }
        if self.class_labels.len() != model_classes {
            return Err(MonitorError::Config(format!(
                "{} class labels configured but the model has {} classes",
                self.class_labels.len(),
                model_classes
            )));
        }
        Ok(())
    }
}

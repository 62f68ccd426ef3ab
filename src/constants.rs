//! Central Configuration Constants
//!
//! Single source of truth for all configuration defaults.

use std::path::PathBuf;

/// Predictions between two reports
pub const DEFAULT_REPORT_INTERVAL: u64 = 100;

/// Confidence (percent) below which a prediction counts as low
pub const DEFAULT_CONF_THRESHOLD: f32 = 50.0;

/// Percent of low-confidence predictions in an interval that raises an alert
pub const DEFAULT_CONF_PERCENT: f32 = 10.0;

/// Capacity of the low-confidence capture ring
pub const DEFAULT_CAPTURE_CAPACITY: usize = 100;

/// Recent-confidence window size used when sample capture is off
pub const DEFAULT_CONFIDENCE_WINDOW: usize = 100;

/// Records pulled from a dataset stream
pub const DEFAULT_TOTAL_RECORDS: u64 = 1000;

/// Output classes of the default (MNIST) model
pub const DEFAULT_NUM_CLASSES: usize = 10;

/// Buckets for the input pixel-value distribution
pub const DEFAULT_PIXEL_BINS: usize = 10;

/// Serving signature used by the default model
pub const DEFAULT_SIGNATURE_NAME: &str = "predict_images";

/// Model name on the serving endpoint
pub const DEFAULT_MODEL_NAME: &str = "mnist";

/// File name looked up when `--model` points at a directory
pub const MODEL_FILE_NAME: &str = "model.onnx";

/// Remote model request timeout (seconds)
pub const DEFAULT_SERVING_TIMEOUT_SECS: u64 = 30;

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "inference-monitor";

// ============================================
// Default locations
// ============================================

/// Where predictions go when no output file is given
pub fn default_output_file() -> PathBuf {
    std::env::temp_dir().join("mnist_predictions")
}

/// Where MNIST IDX files are looked up
pub fn default_input_dir() -> PathBuf {
    std::env::temp_dir().join("mnist_data")
}

/// Telemetry log directory (app data dir, falls back to cwd)
pub fn default_telemetry_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
        .join("telemetry")
}

/// Low-confidence exemplar export file
pub fn default_low_confidence_file() -> PathBuf {
    std::env::temp_dir().join("mnist_low_confidence.jsonl")
}

/// Default class labels "0".."n-1"
pub fn default_class_labels(num_classes: usize) -> Vec<String> {
    (0..num_classes).map(|i| i.to_string()).collect()
}

//! Error types for the inference monitor.

use thiserror::Error;

/// Main error type for the monitor.
///
/// End of input is not an error: sources signal it with `Ok(None)`.
#[derive(Error, Debug)]
pub enum MonitorError {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Model produced a class index outside the histogram range
    #[error("Invalid class index {class} (model has {num_classes} classes)")]
    InvalidClass { class: usize, num_classes: usize },

    /// Model call failed
    #[error("Model invocation failed: {0}")]
    ModelInvocation(String),

    /// Sample source failed for a reason other than end of input
    #[error("Sample source failed: {0}")]
    Source(String),

    /// Dataset files could not be parsed
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// Telemetry sink error
    #[error("Telemetry error: {0}")]
    Telemetry(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for MonitorError {
    fn from(err: serde_json::Error) -> Self {
        MonitorError::Serialization(err.to_string())
    }
}

/// Specialized Result type for monitor operations.
pub type Result<T> = std::result::Result<T, MonitorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MonitorError::InvalidClass { class: 12, num_classes: 10 };
        assert_eq!(err.to_string(), "Invalid class index 12 (model has 10 classes)");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: MonitorError = io_err.into();
        assert!(matches!(err, MonitorError::Io(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<u32>("not json").unwrap_err();
        let err: MonitorError = json_err.into();
        assert!(matches!(err, MonitorError::Serialization(_)));
    }
}

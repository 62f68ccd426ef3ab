//! Inference Monitor - Core Library
//!
//! Streams samples through a classifier, persists one prediction per line and
//! watches prediction confidence for degradation.
//!
//! ## Structure
//! - `logic/source` - Sample sources (IDX dataset stream, JSONL)
//! - `logic/model` - Classifier seam + ONNX / remote backends
//! - `logic/confidence` - Confidence tracker, capture ring, exemplar export
//! - `logic/histogram` - Per-class prediction counts
//! - `logic/telemetry` - Stats, JSONL recorder, webhook alerts
//! - `logic/driver` - The inference loop

pub mod constants;
pub mod error;
pub mod logic;

pub use error::{MonitorError, Result};

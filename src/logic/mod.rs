//! Logic Module - Inference loop & monitoring engines
//!
//! ## Architecture
//! - `source/` - Sample sources (dataset stream, JSONL)
//! - `model/` - Classifier trait, ONNX + remote backends
//! - `confidence/` - Degradation tracking, capture ring, exemplar export
//! - `telemetry/` - Stats, recorder, webhook alerts

pub mod config;
pub mod driver;
pub mod histogram;
pub mod output;

pub mod confidence;
pub mod model;
pub mod source;
pub mod telemetry;

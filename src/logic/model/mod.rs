//! Model Module - classification backends
//!
//! Keeps inference out of the driver loop. Backends are a local ONNX
//! session or a remote serving endpoint.

pub mod inference;
pub mod onnx;
pub mod remote;

// Re-export common types
pub use inference::{argmax, Classifier, EngineStats, PredictionEvent};
pub use onnx::OnnxClassifier;
pub use remote::{RemoteClassifier, ServingConfig};

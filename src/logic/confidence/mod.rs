//! Confidence Module - prediction quality tracking
//!
//! - `tracker.rs` - per-interval degradation detection
//! - `ring.rs` - fixed-capacity ring used for the window and the capture set
//! - `export.rs` - JSONL export of captured low-confidence samples

pub mod export;
pub mod ring;
pub mod tracker;

pub use export::LowConfidenceWriter;
pub use ring::RingBuffer;
pub use tracker::{AlertDecision, ConfidenceTracker, ConfidenceWindow, LowConfidenceSample};

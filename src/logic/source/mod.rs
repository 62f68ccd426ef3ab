//! Sample Sources
//!
//! A source yields `(sample, label)` pairs one at a time. `Ok(None)` is the
//! end-of-stream signal; any `Err` is a real failure.
//!
//! - `idx.rs` - MNIST IDX file loader
//! - `stream.rs` - bounded (optionally randomised) stream over a dataset
//! - `jsonl.rs` - one JSON sample per line

pub mod idx;
pub mod jsonl;
pub mod stream;

pub use idx::IdxDataset;
pub use jsonl::JsonlSource;
pub use stream::StreamInput;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A sample and its (unused by the monitor) ground-truth label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledSample<S> {
    pub sample: S,
    #[serde(default)]
    pub label: Option<usize>,
}

impl<S> LabeledSample<S> {
    pub fn new(sample: S, label: Option<usize>) -> Self {
        Self { sample, label }
    }

    pub fn unlabeled(sample: S) -> Self {
        Self { sample, label: None }
    }
}

pub trait SampleSource {
    type Sample;

    /// Next sample, `Ok(None)` at end of input
    fn next_sample(&mut self) -> Result<Option<LabeledSample<Self::Sample>>>;
}

impl<T: SampleSource + ?Sized> SampleSource for Box<T> {
    type Sample = T::Sample;

    fn next_sample(&mut self) -> Result<Option<LabeledSample<Self::Sample>>> {
        (**self).next_sample()
    }
}

/// Adapts any iterator of samples into a source
pub struct IterSource<I> {
    inner: I,
}

impl<I> IterSource<I> {
    pub fn new(inner: I) -> Self {
        Self { inner }
    }
}

impl<S, I> SampleSource for IterSource<I>
where
    I: Iterator<Item = LabeledSample<S>>,
{
    type Sample = S;

    fn next_sample(&mut self) -> Result<Option<LabeledSample<S>>> {
        Ok(self.inner.next())
    }
}

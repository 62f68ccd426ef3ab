//! Stream Input - bounded stream over an in-memory dataset
//!
//! Yields exactly `total_records` samples, walking the dataset in order
//! (wrapping around) or picking uniformly at random.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::idx::IdxDataset;
use super::{LabeledSample, SampleSource};
use crate::error::{MonitorError, Result};

pub struct StreamInput {
    samples: Vec<Vec<f32>>,
    labels: Vec<u8>,
    total_records: u64,
    emitted: u64,
    rng: Option<StdRng>,
}

impl StreamInput {
    pub fn new(dataset: IdxDataset, total_records: u64) -> Self {
        Self {
            samples: dataset.images,
            labels: dataset.labels,
            total_records,
            emitted: 0,
            rng: None,
        }
    }

    /// Pick samples at random; a seed makes the order reproducible
    pub fn randomized(mut self, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.rng = Some(rng);
        self
    }
}

impl SampleSource for StreamInput {
    type Sample = Vec<f32>;

    fn next_sample(&mut self) -> Result<Option<LabeledSample<Vec<f32>>>> {
        if self.emitted >= self.total_records {
            return Ok(None);
        }
        if self.samples.is_empty() {
            return Err(MonitorError::Source("dataset is empty".to_string()));
        }

        let len = self.samples.len();
        let idx = match self.rng.as_mut() {
            Some(rng) => rng.gen_range(0..len),
            None => (self.emitted % len as u64) as usize,
        };
        self.emitted += 1;

        let label = self.labels.get(idx).map(|&l| l as usize);
        Ok(Some(LabeledSample::new(self.samples[idx].clone(), label)))
    }
}

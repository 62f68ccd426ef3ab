//! Class Histogram - per-class prediction counts
//!
//! Cumulative for the whole run, never reset.

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::error::{MonitorError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassHistogram {
    labels: Vec<String>,
    counts: Vec<u64>,
}

impl ClassHistogram {
    /// Histogram with labels "0".."num_classes-1"
    pub fn new(num_classes: usize) -> Self {
        Self::with_labels(constants::default_class_labels(num_classes))
    }

    pub fn with_labels(labels: Vec<String>) -> Self {
        let counts = vec![0; labels.len()];
        Self { labels, counts }
    }

    /// Count one prediction of `class_index`
    pub fn record(&mut self, class_index: usize) -> Result<()> {
        let num_classes = self.counts.len();
        let slot = self
            .counts
            .get_mut(class_index)
            .ok_or(MonitorError::InvalidClass { class: class_index, num_classes })?;
        *slot += 1;
        Ok(())
    }

    /// Copy of the counts, ordered by class index
    pub fn snapshot(&self) -> Vec<u64> {
        self.counts.clone()
    }

    pub fn count(&self, class_index: usize) -> Option<u64> {
        self.counts.get(class_index).copied()
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn num_classes(&self) -> usize {
        self.counts.len()
    }

    /// (label, count) pairs for reporting
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> + '_ {
        self.labels.iter().map(String::as_str).zip(self.counts.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_snapshot() {
        let mut hist = ClassHistogram::new(4);
        for class in [0, 2, 2, 3, 2] {
            hist.record(class).unwrap();
        }

        assert_eq!(hist.snapshot(), vec![1, 0, 3, 1]);
        assert_eq!(hist.total(), 5);
    }

    #[test]
    fn test_invalid_class() {
        let mut hist = ClassHistogram::new(10);
        let err = hist.record(10).unwrap_err();
        assert!(matches!(err, MonitorError::InvalidClass { class: 10, num_classes: 10 }));
        assert_eq!(hist.total(), 0);
    }

    #[test]
    fn test_snapshot_does_not_reset() {
        let mut hist = ClassHistogram::new(2);
        hist.record(1).unwrap();
        let first = hist.snapshot();
        hist.record(1).unwrap();
        let second = hist.snapshot();

        assert_eq!(first, vec![0, 1]);
        assert_eq!(second, vec![0, 2]);
    }

    #[test]
    fn test_counts_monotonic_and_sum_matches() {
        let mut hist = ClassHistogram::new(5);
        let mut previous = hist.snapshot();

        for i in 0..200usize {
            hist.record((i * 7 + i / 3) % 5).unwrap();
            let current = hist.snapshot();
            assert!(current.iter().zip(&previous).all(|(c, p)| c >= p));
            assert_eq!(hist.total(), i as u64 + 1);
            previous = current;
        }
    }

    #[test]
    fn test_labels_iter() {
        let mut hist = ClassHistogram::with_labels(vec!["cat".into(), "dog".into()]);
        hist.record(1).unwrap();
        let pairs: Vec<_> = hist.iter().collect();
        assert_eq!(pairs, vec![("cat", 0), ("dog", 1)]);
    }
}

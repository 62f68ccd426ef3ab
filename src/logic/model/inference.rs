//! Inference seam - classifier trait + prediction derivation

use serde::{Deserialize, Serialize};

use crate::error::{MonitorError, Result};

// ============================================================================
// CLASSIFIER TRAIT
// ============================================================================

/// Trait for classification backends (ONNX, remote serving, ...)
///
/// `infer` returns one probability per class. The vector is trusted to be a
/// distribution; backends only check its length.
pub trait Classifier {
    type Input;

    fn num_classes(&self) -> usize;

    fn infer(&mut self, sample: &Self::Input) -> Result<Vec<f32>>;

    /// Backend latency stats, if the backend keeps any
    fn stats(&self) -> Option<EngineStats> {
        None
    }
}

impl<C: Classifier + ?Sized> Classifier for Box<C> {
    type Input = C::Input;

    fn num_classes(&self) -> usize {
        (**self).num_classes()
    }

    fn infer(&mut self, sample: &Self::Input) -> Result<Vec<f32>> {
        (**self).infer(sample)
    }

    fn stats(&self) -> Option<EngineStats> {
        (**self).stats()
    }
}

/// Engine stats for the end-of-run summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStats {
    pub backend: String,
    pub inference_count: u64,
    pub avg_latency_ms: f32,
}

impl EngineStats {
    pub fn from_totals(backend: &str, inference_count: u64, latency_sum_us: u64) -> Self {
        let avg = if inference_count > 0 {
            (latency_sum_us as f32 / inference_count as f32) / 1000.0
        } else {
            0.0
        };

        Self {
            backend: backend.to_string(),
            inference_count,
            avg_latency_ms: avg,
        }
    }
}

// ============================================================================
// PREDICTION
// ============================================================================

/// One processed sample
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionEvent<S> {
    /// argmax over the probability vector, ties to the lowest index
    pub predicted_class: usize,
    /// Probability of the predicted class, as a percentage
    pub confidence: f32,
    pub sample: S,
}

impl<S> PredictionEvent<S> {
    pub fn derive(probabilities: &[f32], sample: S) -> Result<Self> {
        let predicted_class = argmax(probabilities).ok_or_else(|| {
            MonitorError::ModelInvocation("model returned an empty probability vector".to_string())
        })?;

        Ok(Self {
            predicted_class,
            confidence: probabilities[predicted_class] * 100.0,
            sample,
        })
    }
}

/// Index of the largest value, first one on ties
pub fn argmax(values: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (idx, &value) in values.iter().enumerate() {
        match best {
            Some((_, top)) if value <= top => {}
            _ => best = Some((idx, value)),
        }
    }
    best.map(|(idx, _)| idx)
}

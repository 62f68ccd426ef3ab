//! ONNX Runtime backend
//!
//! Input is a flat feature vector fed as a `[1, features]` tensor; the
//! first output must hold one probability per class.

use std::path::{Path, PathBuf};

use ndarray::Array2;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;

use super::inference::{Classifier, EngineStats};
use crate::constants;
use crate::error::{MonitorError, Result};

pub struct OnnxClassifier {
    session: Session,
    output_name: String,
    num_classes: usize,
    latency_sum_us: u64,
    inference_count: u64,
}

impl OnnxClassifier {
    /// Resolve `--model`: a file is used as is, a directory must hold `model.onnx`
    pub fn resolve_path(path: &Path) -> Result<PathBuf> {
        let candidate = if path.is_dir() {
            path.join(constants::MODEL_FILE_NAME)
        } else {
            path.to_path_buf()
        };

        if !candidate.exists() {
            return Err(MonitorError::ModelInvocation(format!(
                "No model found at {}",
                candidate.display()
            )));
        }
        Ok(candidate)
    }

    /// Load the model file and build the ONNX session
    pub fn load(model_path: &Path, num_classes: usize) -> Result<Self> {
        log::info!("Loading ONNX model from: {}", model_path.display());

        let session = Session::builder()
            .map_err(|e| model_err("Failed to create session builder", e))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| model_err("Failed to set optimization", e))?
            .commit_from_file(model_path)
            .map_err(|e| model_err("Failed to load model", e))?;

        let output_name = session
            .outputs()
            .first()
            .map(|o| o.name().to_string())
            .ok_or_else(|| MonitorError::ModelInvocation("No output defined".to_string()))?;

        log::info!("ONNX model loaded successfully (output: {})", output_name);

        Ok(Self {
            session,
            output_name,
            num_classes,
            latency_sum_us: 0,
            inference_count: 0,
        })
    }
}

impl Classifier for OnnxClassifier {
    type Input = Vec<f32>;

    fn num_classes(&self) -> usize {
        self.num_classes
    }

    fn infer(&mut self, sample: &Vec<f32>) -> Result<Vec<f32>> {
        let start_time = std::time::Instant::now();

        let input_array = Array2::<f32>::from_shape_vec((1, sample.len()), sample.clone())
            .map_err(|e| model_err("Array error", e))?;

        let input_tensor = Value::from_array(input_array)
            .map_err(|e| model_err("Tensor error", e))?;

        let probabilities = {
            let outputs = self
                .session
                .run(ort::inputs![input_tensor])
                .map_err(|e| model_err("Inference failed", e))?;

            let output = outputs
                .get(&self.output_name)
                .ok_or_else(|| MonitorError::ModelInvocation("No output".to_string()))?;

            let output_tensor = output
                .try_extract_tensor::<f32>()
                .map_err(|e| model_err("Extract error", e))?;

            output_tensor.1.to_vec()
        };

        if probabilities.len() != self.num_classes {
            return Err(MonitorError::ModelInvocation(format!(
                "expected {} class probabilities, model returned {}",
                self.num_classes,
                probabilities.len()
            )));
        }

        self.latency_sum_us += start_time.elapsed().as_micros() as u64;
        self.inference_count += 1;

        Ok(probabilities)
    }

    fn stats(&self) -> Option<EngineStats> {
        Some(EngineStats::from_totals(
            "ONNX Runtime (CPU)",
            self.inference_count,
            self.latency_sum_us,
        ))
    }
}

fn model_err(context: &str, e: impl std::fmt::Display) -> MonitorError {
    MonitorError::ModelInvocation(format!("{}: {}", context, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_resolve_missing_model() {
        let dir = tempdir().unwrap();
        let err = OnnxClassifier::resolve_path(dir.path()).unwrap_err();
        assert!(err.to_string().contains("No model found"));
    }

    #[test]
    fn test_resolve_directory() {
        let dir = tempdir().unwrap();
        let model = dir.path().join(constants::MODEL_FILE_NAME);
        std::fs::write(&model, b"onnx").unwrap();

        assert_eq!(OnnxClassifier::resolve_path(dir.path()).unwrap(), model);
        assert_eq!(OnnxClassifier::resolve_path(&model).unwrap(), model);
    }
}

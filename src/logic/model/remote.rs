//! Remote serving backend
//!
//! Blocking client for a TF-Serving style REST endpoint:
//! `POST {base}/v1/models/{name}:predict` with
//! `{"signature_name": ..., "instances": [sample]}`.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use super::inference::{Classifier, EngineStats};
use crate::constants;
use crate::error::{MonitorError, Result};

/// Serving endpoint configuration
#[derive(Debug, Clone)]
pub struct ServingConfig {
    pub base_url: String,
    pub model_name: String,
    pub signature_name: String,
    pub num_classes: usize,
    pub timeout_seconds: u64,
}

impl ServingConfig {
    pub fn new(base_url: &str, num_classes: usize) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model_name: constants::DEFAULT_MODEL_NAME.to_string(),
            signature_name: constants::DEFAULT_SIGNATURE_NAME.to_string(),
            num_classes,
            timeout_seconds: constants::DEFAULT_SERVING_TIMEOUT_SECS,
        }
    }

    pub fn predict_url(&self) -> String {
        format!("{}/v1/models/{}:predict", self.base_url, self.model_name)
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    signature_name: &'a str,
    instances: [&'a [f32]; 1],
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    predictions: Vec<Vec<f32>>,
}

pub struct RemoteClassifier {
    config: ServingConfig,
    latency_sum_us: u64,
    inference_count: u64,
}

impl RemoteClassifier {
    pub fn new(config: ServingConfig) -> Self {
        log::info!(
            "Using remote model '{}' (signature '{}') at {}",
            config.model_name,
            config.signature_name,
            config.base_url
        );
        Self {
            config,
            latency_sum_us: 0,
            inference_count: 0,
        }
    }

    fn request_body(&self, sample: &[f32]) -> Result<String> {
        let request = PredictRequest {
            signature_name: &self.config.signature_name,
            instances: [sample],
        };
        Ok(serde_json::to_string(&request)?)
    }

    fn parse_response(&self, body: &str) -> Result<Vec<f32>> {
        let response: PredictResponse = serde_json::from_str(body)
            .map_err(|e| MonitorError::ModelInvocation(format!("Bad serving response: {}", e)))?;

        let probabilities = response.predictions.into_iter().next().ok_or_else(|| {
            MonitorError::ModelInvocation("Serving response has no predictions".to_string())
        })?;

        if probabilities.len() != self.config.num_classes {
            return Err(MonitorError::ModelInvocation(format!(
                "expected {} class probabilities, server returned {}",
                self.config.num_classes,
                probabilities.len()
            )));
        }
        Ok(probabilities)
    }
}

impl Classifier for RemoteClassifier {
    type Input = Vec<f32>;

    fn num_classes(&self) -> usize {
        self.config.num_classes
    }

    fn infer(&mut self, sample: &Vec<f32>) -> Result<Vec<f32>> {
        let start_time = Instant::now();
        let body = self.request_body(sample)?;

        let response = ureq::post(&self.config.predict_url())
            .timeout(Duration::from_secs(self.config.timeout_seconds))
            .set("Content-Type", "application/json")
            .send_string(&body);

        let text = match response {
            Ok(resp) => resp
                .into_string()
                .map_err(|e| MonitorError::ModelInvocation(format!("Read error: {}", e)))?,
            Err(ureq::Error::Status(code, _)) => {
                return Err(MonitorError::ModelInvocation(format!(
                    "Serving endpoint returned HTTP {}",
                    code
                )));
            }
            Err(e) => {
                return Err(MonitorError::ModelInvocation(format!("Network error: {}", e)));
            }
        };

        let probabilities = self.parse_response(&text)?;

        self.latency_sum_us += start_time.elapsed().as_micros() as u64;
        self.inference_count += 1;

        Ok(probabilities)
    }

    fn stats(&self) -> Option<EngineStats> {
        Some(EngineStats::from_totals(
            "Remote serving",
            self.inference_count,
            self.latency_sum_us,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> RemoteClassifier {
        RemoteClassifier::new(ServingConfig::new("http://localhost:8501/", 3))
    }

    #[test]
    fn test_predict_url() {
        let config = ServingConfig::new("http://localhost:8501/", 10);
        assert_eq!(config.predict_url(), "http://localhost:8501/v1/models/mnist:predict");
    }

    #[test]
    fn test_request_body() {
        let body = client().request_body(&[0.5, 1.0]).unwrap();
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();

        assert_eq!(json["signature_name"], "predict_images");
        assert_eq!(json["instances"], serde_json::json!([[0.5, 1.0]]));
    }

    #[test]
    fn test_parse_response() {
        let probs = client()
            .parse_response(r#"{"predictions": [[0.1, 0.7, 0.2]]}"#)
            .unwrap();
        assert_eq!(probs, vec![0.1, 0.7, 0.2]);
    }

    #[test]
    fn test_parse_response_wrong_length() {
        let err = client()
            .parse_response(r#"{"predictions": [[0.5, 0.5]]}"#)
            .unwrap_err();
        assert!(matches!(err, MonitorError::ModelInvocation(_)));
    }

    #[test]
    fn test_parse_response_empty() {
        assert!(client().parse_response(r#"{"predictions": []}"#).is_err());
        assert!(client().parse_response("not json").is_err());
    }
}

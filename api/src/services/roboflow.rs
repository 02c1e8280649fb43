//! Roboflow hosted object detection

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::Deserialize;

use crate::constants::{DETECTION_CONFIDENCE, DETECTION_OVERLAP};
use crate::detection::Detection;
use crate::error::ProviderError;

/// A remote model that finds labelled objects in one image.
/// Thresholding and NMS happen on the provider side.
#[async_trait]
pub trait ObjectDetector: Send + Sync {
    async fn predict(&self, image: &[u8]) -> Result<Vec<Detection>, ProviderError>;
}

#[derive(Debug, Deserialize)]
struct PredictionResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    class: String,
    confidence: f64,
}

#[derive(Clone)]
pub struct RoboflowClient {
    api_key: String,
    base_url: String,
    model_id: String,
    http: Client,
}

impl RoboflowClient {
    pub fn new(api_key: &str, base_url: &str, model_id: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model_id: model_id.trim_matches('/').to_string(),
            http: Client::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/{}", self.base_url, self.model_id)
    }
}

#[async_trait]
impl ObjectDetector for RoboflowClient {
    async fn predict(&self, image: &[u8]) -> Result<Vec<Detection>, ProviderError> {
        let body = base64::engine::general_purpose::STANDARD.encode(image);

        let resp = self
            .http
            .post(self.endpoint())
            .query(&[
                ("api_key", self.api_key.clone()),
                ("confidence", DETECTION_CONFIDENCE.to_string()),
                ("overlap", DETECTION_OVERLAP.to_string()),
            ])
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await?;
            tracing::warn!("Roboflow error ({}): {}", status, body);
            return Err(ProviderError::Api { status, body });
        }

        let parsed: PredictionResponse = resp.json().await?;
        Ok(parsed.into_detections())
    }
}

impl PredictionResponse {
    fn into_detections(self) -> Vec<Detection> {
        self.predictions
            .into_iter()
            .map(|p| Detection {
                label: p.class,
                confidence: p.confidence.clamp(0.0, 1.0),
            })
            .collect()
    }
}

//! Ingredient detection over sampled frames.
//!
//! Two interchangeable strategies share one output contract: a list of
//! `{label, confidence}` records with one entry per distinct label.

mod object_detection;
mod vision_language;

pub use object_detection::ObjectDetectionStrategy;
pub use vision_language::{VisionLanguageStrategy, parse_ingredient_list};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{DetectionError, PipelineError};
use crate::frames::Frame;

/// One raw observation from one frame
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub label: String,
    pub confidence: f64,
}

/// Aggregated result, unique per label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientRecord {
    #[serde(rename = "class")]
    pub label: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DetectionStrategy {
    ObjectDetection,
    #[default]
    VisionLanguage,
}

impl DetectionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionStrategy::ObjectDetection => "object_detection",
            DetectionStrategy::VisionLanguage => "vision_language",
        }
    }
}

impl fmt::Display for DetectionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DetectionStrategy {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "object_detection" => Ok(DetectionStrategy::ObjectDetection),
            "vision_language" => Ok(DetectionStrategy::VisionLanguage),
            other => Err(PipelineError::UnknownStrategy(other.to_string())),
        }
    }
}

#[async_trait]
pub trait IngredientDetector: Send + Sync {
    async fn detect(&self, frames: &[Frame]) -> Result<Vec<IngredientRecord>, DetectionError>;
}

/// Trim and lowercase a label. Only applied when normalization is enabled.
pub fn normalize_label(label: &str) -> String {
    label.trim().to_lowercase()
}

/// Label -> best confidence, kept in order of first appearance
#[derive(Debug, Default)]
pub struct IngredientMerger {
    normalize: bool,
    records: Vec<IngredientRecord>,
    positions: HashMap<String, usize>,
}

impl IngredientMerger {
    pub fn new(normalize: bool) -> Self {
        Self {
            normalize,
            ..Self::default()
        }
    }

    pub fn observe(&mut self, label: &str, confidence: f64) {
        let label = if self.normalize {
            normalize_label(label)
        } else {
            label.to_string()
        };

        match self.positions.get(&label) {
            Some(&i) => {
                let record = &mut self.records[i];
                if confidence > record.confidence {
                    record.confidence = confidence;
                }
            }
            None => {
                self.positions.insert(label.clone(), self.records.len());
                self.records.push(IngredientRecord { label, confidence });
            }
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<IngredientRecord> {
        self.records
    }
}

/// Merge per-frame detections (in frame order): max confidence per label,
/// first-seen order.
pub fn merge_detections<I>(per_frame: I, normalize: bool) -> Vec<IngredientRecord>
where
    I: IntoIterator<Item = Vec<Detection>>,
{
    let mut merger = IngredientMerger::new(normalize);
    for detections in per_frame {
        for d in detections {
            merger.observe(&d.label, d.confidence);
        }
    }
    merger.into_records()
}

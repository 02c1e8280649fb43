use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt, stream};
use std::sync::Arc;

use super::{IngredientDetector, IngredientMerger, IngredientRecord};
use crate::constants::{VISION_INSTRUCTION, VISION_LANGUAGE_CONFIDENCE};
use crate::error::{DetectionError, ProviderError};
use crate::frames::Frame;
use crate::services::chat::{ChatMessage, ChatModel};

/// Asks a multimodal chat model to list the ingredients in every frame.
/// The model gives no scores, so every label gets the same fixed confidence.
pub struct VisionLanguageStrategy {
    model: Arc<dyn ChatModel>,
    concurrency: usize,
    normalize: bool,
}

impl VisionLanguageStrategy {
    pub fn new(model: Arc<dyn ChatModel>, concurrency: usize, normalize: bool) -> Self {
        Self {
            model,
            concurrency: concurrency.max(1),
            normalize,
        }
    }
}

#[async_trait]
impl IngredientDetector for VisionLanguageStrategy {
    async fn detect(&self, frames: &[Frame]) -> Result<Vec<IngredientRecord>, DetectionError> {
        let replies: Vec<String> = stream::iter(frames.iter().map(|f| (f.index, f.data.clone())).collect::<Vec<_>>())
            .map(|(index, data)| {
                let model = Arc::clone(&self.model);
                async move {
                    let reply = model
                        .complete(vec![ChatMessage::user_with_png(VISION_INSTRUCTION, &data)])
                        .await?;
                    tracing::debug!("Frame {}: {:?}", index, reply);
                    Ok::<_, ProviderError>(reply)
                }
            })
            .buffered(self.concurrency)
            .try_collect()
            .await
            .map_err(|e| {
                tracing::error!("Vision-language detection failed: {}", e);
                DetectionError(e)
            })?;

        // Labels accumulate across all frames; records are built once at the end
        let mut labels = IngredientMerger::new(self.normalize);
        for reply in &replies {
            for label in parse_ingredient_list(reply) {
                labels.observe(&label, VISION_LANGUAGE_CONFIDENCE);
            }
        }

        tracing::info!(
            "Vision-language detection found {} ingredients across {} frames",
            labels.len(),
            frames.len()
        );
        Ok(labels.into_records())
    }
}

/// "tomato, onion , ,garlic" -> ["tomato", "onion", "garlic"]
pub fn parse_ingredient_list(reply: &str) -> Vec<String> {
    reply
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

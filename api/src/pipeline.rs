//! Pipeline orchestration: video -> frames -> ingredients, and ingredients -> recipes.

use std::sync::Arc;

use crate::constants::SAMPLE_FPS;
use crate::detection::{DetectionStrategy, IngredientDetector, IngredientRecord};
use crate::error::PipelineError;
use crate::frames::{FrameDecoder, sample_frames};
use crate::recipes::{RecipeGenerator, RecipeResult};
use crate::storage::Workspace;

pub struct Pipeline {
    decoder: Arc<dyn FrameDecoder>,
    object_detection: Arc<dyn IngredientDetector>,
    vision_language: Arc<dyn IngredientDetector>,
    recipes: RecipeGenerator,
}

impl Pipeline {
    pub fn new(
        decoder: Arc<dyn FrameDecoder>,
        object_detection: Arc<dyn IngredientDetector>,
        vision_language: Arc<dyn IngredientDetector>,
        recipes: RecipeGenerator,
    ) -> Self {
        Self {
            decoder,
            object_detection,
            vision_language,
            recipes,
        }
    }

    fn detector(&self, strategy: DetectionStrategy) -> &dyn IngredientDetector {
        match strategy {
            DetectionStrategy::ObjectDetection => self.object_detection.as_ref(),
            DetectionStrategy::VisionLanguage => self.vision_language.as_ref(),
        }
    }

    /// Sample the video and detect its ingredients.
    /// The workspace holding the video and frames is removed before this returns,
    /// whatever the outcome.
    pub async fn process_video(
        &self,
        video: &[u8],
        filename: &str,
        strategy: DetectionStrategy,
    ) -> Result<Vec<IngredientRecord>, PipelineError> {
        let workspace = Workspace::create().await?;
        tracing::info!(
            "Processing {} ({} bytes) with {} in {:?}",
            filename,
            video.len(),
            strategy,
            workspace.path()
        );

        let input_path = workspace.write_video(filename, video).await?;
        let frames = sample_frames(
            self.decoder.as_ref(),
            &input_path,
            SAMPLE_FPS,
            workspace.frames_dir(),
        )
        .await?;

        let records = self.detector(strategy).detect(&frames).await?;
        Ok(records)
    }

    pub async fn get_recipes(&self, labels: &[String]) -> Result<RecipeResult, PipelineError> {
        Ok(self.recipes.generate(labels).await?)
    }
}

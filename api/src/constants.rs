//! Application constants

/// Frames sampled per second of video
pub const SAMPLE_FPS: u32 = 1;

/// Maximum upload size for videos (200 MB)
pub const MAX_VIDEO_UPLOAD_SIZE: usize = 200 * 1024 * 1024;

/// Object detection confidence threshold, in percent
pub const DETECTION_CONFIDENCE: u32 = 40;

/// Object detection overlap (IoU) threshold for NMS, in percent
pub const DETECTION_OVERLAP: u32 = 30;

/// Confidence assigned to every label from the vision-language strategy.
/// The chat model does not report one.
pub const VISION_LANGUAGE_CONFIDENCE: f64 = 0.70;

/// Instruction sent with every frame to the vision-language model
pub const VISION_INSTRUCTION: &str = "Identify the food ingredients visible in this image. \
Respond only with a comma-separated list of ingredient names.";

/// Placeholder replaced by the ingredient list in the recipe prompt template
pub const INGREDIENTS_PLACEHOLDER: &str = "[List of ingredients]";

/// File name prefix ffmpeg writes sampled frames with
pub const FRAME_FILE_PREFIX: &str = "frame_";

//! Process configuration, read once from the environment at startup

use std::env;
use std::path::PathBuf;

use crate::error::ConfigError;

const DEFAULT_PORT: u16 = 3003;
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_RECIPE_MODEL: &str = "gpt-4o";
const DEFAULT_VISION_MODEL: &str = "gpt-4o";
const DEFAULT_ROBOFLOW_BASE_URL: &str = "https://detect.roboflow.com";
const DEFAULT_ROBOFLOW_MODEL_ID: &str = "food-ingredients-detection/1";
const DEFAULT_PROMPT_TEMPLATE_PATH: &str = "prompts/recipes.txt";
const DEFAULT_FFMPEG_THREADS: usize = 1;
const DEFAULT_DETECTION_CONCURRENCY: usize = 4;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub recipe_model: String,
    pub vision_model: String,
    pub roboflow_api_key: String,
    pub roboflow_base_url: String,
    pub roboflow_model_id: String,
    pub prompt_template_path: PathBuf,
    pub ffmpeg_threads: usize,
    pub detection_concurrency: usize,
    pub normalize_labels: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(key))
        };
        let or_default = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        Ok(Self {
            port: positive(lookup("PORT")).unwrap_or(DEFAULT_PORT),
            openai_api_key: required("OPENAI_API_KEY")?,
            openai_base_url: or_default("OPENAI_BASE_URL", DEFAULT_OPENAI_BASE_URL),
            recipe_model: or_default("RECIPE_MODEL", DEFAULT_RECIPE_MODEL),
            vision_model: or_default("VISION_MODEL", DEFAULT_VISION_MODEL),
            roboflow_api_key: required("ROBOFLOW_API_KEY")?,
            roboflow_base_url: or_default("ROBOFLOW_BASE_URL", DEFAULT_ROBOFLOW_BASE_URL),
            roboflow_model_id: or_default("ROBOFLOW_MODEL_ID", DEFAULT_ROBOFLOW_MODEL_ID),
            prompt_template_path: or_default("PROMPT_TEMPLATE_PATH", DEFAULT_PROMPT_TEMPLATE_PATH)
                .into(),
            ffmpeg_threads: positive(lookup("FFMPEG_THREADS")).unwrap_or(DEFAULT_FFMPEG_THREADS),
            detection_concurrency: positive(lookup("DETECTION_CONCURRENCY"))
                .unwrap_or(DEFAULT_DETECTION_CONCURRENCY),
            normalize_labels: lookup("NORMALIZE_LABELS")
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        })
    }
}

/// Parse a positive number, ignoring junk and zero
fn positive<T>(value: Option<String>) -> Option<T>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    value
        .and_then(|s| s.trim().parse().ok())
        .filter(|v| *v > T::default())
}

//! Recipe generation
//!
//! Renders the ingredient list into the prompt template, asks the language
//! model for recipes and pulls a JSON payload out of the free-text reply.
//! Replies that don't contain usable JSON are returned as plain text.

use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, LazyLock};

use crate::constants::INGREDIENTS_PLACEHOLDER;
use crate::error::{ConfigError, GenerationError};
use crate::services::chat::{ChatMessage, ChatModel};

/// ```json fence holding an object or array
static JSON_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```json\s*(\{.*?\}|\[.*?\])\s*```").expect("valid json fence regex")
});

/// Any ``` fence, with or without a language tag
static ANY_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:[\w+-]+)?\s*(.*?)```").expect("valid fence regex")
});

/// What the model gave back: parsed JSON, or its reply verbatim
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RecipeResult {
    Structured(Value),
    Text(String),
}

impl RecipeResult {
    pub fn is_structured(&self) -> bool {
        matches!(self, RecipeResult::Structured(_))
    }
}

/// Find the JSON payload in a completion.
///
/// Candidate is the first ```json fence with an object or array, else the
/// trimmed body of the first fence of any kind, else the whole text. A
/// candidate that parses to an object or array is returned structured;
/// anything else returns the completion unchanged.
pub fn extract_recipe_payload(completion: &str) -> RecipeResult {
    let candidate = if let Some(caps) = JSON_FENCE.captures(completion) {
        caps.get(1).map_or("", |m| m.as_str())
    } else if let Some(caps) = ANY_FENCE.captures(completion) {
        caps.get(1).map_or("", |m| m.as_str()).trim()
    } else {
        completion
    };

    match serde_json::from_str::<Value>(candidate) {
        Ok(value @ (Value::Array(_) | Value::Object(_))) => RecipeResult::Structured(value),
        Ok(_) | Err(_) => RecipeResult::Text(completion.to_string()),
    }
}

/// Prompt text with a single ingredient-list placeholder
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    text: String,
}

impl PromptTemplate {
    pub fn new(text: impl Into<String>) -> Result<Self, ConfigError> {
        let text = text.into();
        let found = text.matches(INGREDIENTS_PLACEHOLDER).count();
        if found != 1 {
            return Err(ConfigError::TemplatePlaceholder {
                placeholder: INGREDIENTS_PLACEHOLDER,
                found,
            });
        }
        Ok(Self { text })
    }

    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::TemplateRead {
                path: path.display().to_string(),
                source,
            })?;
        Self::new(text)
    }

    /// Substitute the comma-joined labels, caller order preserved
    pub fn render(&self, labels: &[String]) -> String {
        self.text.replacen(INGREDIENTS_PLACEHOLDER, &labels.join(", "), 1)
    }
}

pub struct RecipeGenerator {
    template: PromptTemplate,
    model: Arc<dyn ChatModel>,
}

impl RecipeGenerator {
    pub fn new(template: PromptTemplate, model: Arc<dyn ChatModel>) -> Self {
        Self { template, model }
    }

    pub async fn generate(&self, labels: &[String]) -> Result<RecipeResult, GenerationError> {
        let prompt = self.template.render(labels);

        let completion = self
            .model
            .complete(vec![ChatMessage::user(prompt)])
            .await
            .map_err(|e| {
                tracing::error!("Recipe generation failed: {}", e);
                GenerationError(e)
            })?;

        let result = extract_recipe_payload(&completion);
        if result.is_structured() {
            tracing::info!("Generated recipes for {} ingredients", labels.len());
        } else {
            tracing::warn!(
                "Recipe reply for {} ingredients was not JSON, returning raw text",
                labels.len()
            );
        }
        Ok(result)
    }
}

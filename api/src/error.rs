//! Error taxonomy for the detection and recipe pipelines

use axum::http::StatusCode;
use thiserror::Error;

/// Failure talking to a remote capability (Roboflow, chat completions)
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("provider returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("provider response had no content")]
    EmptyResponse,
}

/// The decoder exited with a failure status
#[derive(Debug, Error)]
#[error("frame extraction failed ({status}): {stderr}")]
pub struct DecodeError {
    pub status: String,
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Error)]
#[error("ingredient detection failed: {0}")]
pub struct DetectionError(#[from] pub ProviderError);

#[derive(Debug, Error)]
#[error("recipe generation failed: {0}")]
pub struct GenerationError(#[from] pub ProviderError);

/// Everything a pipeline invocation can fail with
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Detection(#[from] DetectionError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error("unknown detection strategy: {0}")]
    UnknownStrategy(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            PipelineError::Decode(_) => StatusCode::UNPROCESSABLE_ENTITY,
            PipelineError::Detection(_) | PipelineError::Generation(_) => StatusCode::BAD_GATEWAY,
            PipelineError::UnknownStrategy(_) => StatusCode::BAD_REQUEST,
            PipelineError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Startup configuration problems
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("failed to read prompt template {path}: {source}")]
    TemplateRead {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("prompt template must contain {placeholder} exactly once, found {found}")]
    TemplatePlaceholder {
        placeholder: &'static str,
        found: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let decode = PipelineError::from(DecodeError {
            status: "exit status: 1".into(),
            stdout: String::new(),
            stderr: "moov atom not found".into(),
        });
        assert_eq!(decode.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(decode.to_string().contains("moov atom not found"));

        let detection = PipelineError::from(DetectionError(ProviderError::EmptyResponse));
        assert_eq!(detection.status_code(), StatusCode::BAD_GATEWAY);

        let generation = PipelineError::from(GenerationError(ProviderError::Api {
            status: 429,
            body: "quota".into(),
        }));
        assert_eq!(generation.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            generation.to_string(),
            "recipe generation failed: provider returned 429: quota"
        );

        let unknown = PipelineError::UnknownStrategy("yolo".into());
        assert_eq!(unknown.status_code(), StatusCode::BAD_REQUEST);
    }
}

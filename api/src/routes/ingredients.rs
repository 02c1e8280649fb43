//! Video upload and ingredient detection (/upload)

use axum::{
    Json, Router,
    extract::{Multipart, Query, State},
    http::StatusCode,
    routing::post,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::AppState;
use crate::detection::{DetectionStrategy, IngredientRecord};
use crate::services::error::LogErr;

const VIDEO_FIELD: &str = "video";
const DEFAULT_FILENAME: &str = "upload.mp4";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/upload", post(upload_video))
}

#[derive(Deserialize)]
struct UploadQuery {
    strategy: Option<String>,
}

#[derive(Serialize)]
struct UploadResponse {
    message: String,
    filename: String,
    ingredients: Vec<IngredientRecord>,
}

/// Failure body; ingredients is always present and empty
#[derive(Serialize)]
struct UploadFailure {
    error: String,
    ingredients: Vec<IngredientRecord>,
}

type UploadError = (StatusCode, Json<UploadFailure>);

fn failure(status: StatusCode, error: impl Into<String>) -> UploadError {
    (
        status,
        Json(UploadFailure {
            error: error.into(),
            ingredients: Vec::new(),
        }),
    )
}

/// POST /upload - Detect ingredients in an uploaded video
/// Accepts multipart form data with a "video" file field.
/// Optional ?strategy=object_detection|vision_language (default vision_language)
async fn upload_video(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UploadQuery>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, UploadError> {
    let strategy = match query.strategy.as_deref().map(str::trim) {
        Some(s) if !s.is_empty() => s
            .parse::<DetectionStrategy>()
            .map_err(|e| failure(e.status_code(), e.to_string()))?,
        _ => DetectionStrategy::default(),
    };

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .log_status("Multipart field error", StatusCode::BAD_REQUEST)
        .map_err(|status| failure(status, "Malformed multipart body"))?
    {
        if field.name() != Some(VIDEO_FIELD) {
            continue;
        }

        let filename = field
            .file_name()
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_FILENAME)
            .to_string();
        let data = field
            .bytes()
            .await
            .log_status("Failed to read video bytes", StatusCode::BAD_REQUEST)
            .map_err(|status| failure(status, "Failed to read uploaded video"))?;

        upload = Some((filename, data));
        break;
    }

    let Some((filename, data)) = upload else {
        return Err(failure(StatusCode::BAD_REQUEST, "No video file provided"));
    };
    if data.is_empty() {
        return Err(failure(StatusCode::BAD_REQUEST, "Uploaded video is empty"));
    }

    match state.pipeline.process_video(&data, &filename, strategy).await {
        Ok(ingredients) => {
            tracing::info!(
                "Detected {} ingredients in {} using {}",
                ingredients.len(),
                filename,
                strategy
            );
            Ok(Json(UploadResponse {
                message: "Video processed successfully".to_string(),
                filename,
                ingredients,
            }))
        }
        Err(e) => {
            tracing::error!("Failed to process {}: {}", filename, e);
            Err(failure(e.status_code(), e.to_string()))
        }
    }
}

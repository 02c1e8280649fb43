//! Recipe suggestions (/recipes)

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::AppState;
use crate::recipes::RecipeResult;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/recipes", post(generate_recipes))
}

#[derive(Deserialize)]
struct RecipeRequest {
    #[serde(default)]
    ingredients: Vec<String>,
}

/// `recipes` is either the model's JSON or its raw reply as a string
#[derive(Serialize)]
struct RecipeResponse {
    recipes: RecipeResult,
}

#[derive(Serialize)]
struct RecipeFailure {
    error: String,
}

/// POST /recipes - Suggest recipes for a list of ingredient names
async fn generate_recipes(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RecipeRequest>,
) -> Result<Json<RecipeResponse>, (StatusCode, Json<RecipeFailure>)> {
    match state.pipeline.get_recipes(&req.ingredients).await {
        Ok(recipes) => Ok(Json(RecipeResponse { recipes })),
        Err(e) => {
            tracing::error!("Recipe request failed: {}", e);
            Err((
                e.status_code(),
                Json(RecipeFailure {
                    error: e.to_string(),
                }),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::json;
    use tower::ServiceExt;

    use crate::error::{GenerationError, PipelineError, ProviderError};
    use crate::frames::tests::FakeDecoder;
    use crate::pipeline::Pipeline;
    use crate::pipeline::tests::{build_pipeline, scripted_detector};
    use crate::recipes::tests::TEMPLATE;
    use crate::recipes::{PromptTemplate, RecipeGenerator};
    use crate::routes::app;
    use crate::routes::tests::body_json;
    use crate::services::chat::{ChatMessage, ChatModel};

    fn recipes_request(body: serde_json::Value) -> Request<Body> {
        Request::post("/recipes")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn state_with_reply(reply: &str) -> Arc<AppState> {
        Arc::new(AppState {
            pipeline: build_pipeline(
                Arc::new(FakeDecoder { seconds: 0 }),
                scripted_detector(),
                scripted_detector(),
                reply,
            ),
        })
    }

    #[tokio::test]
    async fn test_structured_recipes() {
        let reply = "Here you go:\n```json\n[{\"name\": \"Egg fried rice\"}]\n```";
        let resp = app(state_with_reply(reply))
            .oneshot(recipes_request(json!({ "ingredients": ["egg", "rice"] })))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            body_json(resp).await,
            json!({ "recipes": [{ "name": "Egg fried rice" }] })
        );
    }

    #[tokio::test]
    async fn test_text_fallback_uses_same_field() {
        let reply = "Make an omelette.";
        let resp = app(state_with_reply(reply))
            .oneshot(recipes_request(json!({ "ingredients": ["egg"] })))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await, json!({ "recipes": "Make an omelette." }));
    }

    struct Offline;

    #[async_trait::async_trait]
    impl ChatModel for Offline {
        async fn complete(&self, _messages: Vec<ChatMessage>) -> Result<String, ProviderError> {
            Err(ProviderError::Api {
                status: 401,
                body: "invalid api key".into(),
            })
        }
    }

    #[tokio::test]
    async fn test_generation_failure() {
        let state = Arc::new(AppState {
            pipeline: Pipeline::new(
                Arc::new(FakeDecoder { seconds: 0 }),
                scripted_detector(),
                scripted_detector(),
                RecipeGenerator::new(PromptTemplate::new(TEMPLATE).unwrap(), Arc::new(Offline)),
            ),
        });

        let resp = app(state)
            .oneshot(recipes_request(json!({ "ingredients": ["egg"] })))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        let expected = PipelineError::from(GenerationError(ProviderError::Api {
            status: 401,
            body: "invalid api key".into(),
        }))
        .to_string();
        assert_eq!(body_json(resp).await, json!({ "error": expected }));
    }
}

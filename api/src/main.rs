use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use pantry::AppState;
use pantry::config::Config;
use pantry::detection::{ObjectDetectionStrategy, VisionLanguageStrategy};
use pantry::frames::FfmpegDecoder;
use pantry::pipeline::Pipeline;
use pantry::recipes::{PromptTemplate, RecipeGenerator};
use pantry::routes;
use pantry::services::chat::OpenAiClient;
use pantry::services::roboflow::RoboflowClient;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env().unwrap_or_else(|e| panic!("Invalid configuration: {}", e));

    // Loaded once; every recipe request renders from this copy
    let template = PromptTemplate::load(&config.prompt_template_path)
        .await
        .unwrap_or_else(|e| panic!("Failed to load prompt template: {}", e));

    let recipe_model = OpenAiClient::new(
        &config.openai_api_key,
        &config.openai_base_url,
        &config.recipe_model,
    );
    let vision_model = OpenAiClient::new(
        &config.openai_api_key,
        &config.openai_base_url,
        &config.vision_model,
    );
    let roboflow = RoboflowClient::new(
        &config.roboflow_api_key,
        &config.roboflow_base_url,
        &config.roboflow_model_id,
    );

    tracing::info!(
        "Models: recipes={} vision={} detection={}",
        recipe_model.model(),
        vision_model.model(),
        config.roboflow_model_id
    );

    let pipeline = Pipeline::new(
        Arc::new(FfmpegDecoder::new(config.ffmpeg_threads)),
        Arc::new(ObjectDetectionStrategy::new(
            Arc::new(roboflow),
            config.detection_concurrency,
            config.normalize_labels,
        )),
        Arc::new(VisionLanguageStrategy::new(
            Arc::new(vision_model),
            config.detection_concurrency,
            config.normalize_labels,
        )),
        RecipeGenerator::new(template, Arc::new(recipe_model)),
    );

    let state = Arc::new(AppState { pipeline });
    let app = routes::app(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| panic!("Failed to bind to {}: {}", addr, e));

    tracing::info!("Listening on http://{}", addr);
    axum::serve(listener, app).await.expect("Server failed");
}

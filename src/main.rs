use anyhow::Result;
use flash_banana::ai::{GeminiChatClient, GeminiImageEditClient};
use flash_banana::image::PreviewGenerator;
use flash_banana::models::Config;
use flash_banana::pipeline::{Pipeline, PipelineServices};
use flash_banana::server::{self, rate_limit::ClientRateLimiter, AppState};
use flash_banana::storage::Storage;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flash_banana=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting flash-banana");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let storage = Arc::new(Storage::new(&config.storage_dir)?);
    info!("Storage directory: {}", config.storage_dir.display());

    // Reuse one HTTP connection pool across provider clients and downloads.
    let http = reqwest::Client::new();

    let chat = GeminiChatClient::new_with_client(
        config.gemini_api_key.clone(),
        config.chat_model.clone(),
        http.clone(),
    );
    let editor = GeminiImageEditClient::new_with_client(
        config.gemini_api_key.clone(),
        config.image_model.clone(),
        http.clone(),
    );
    info!(
        "Chat model: {}, image model: {}",
        config.chat_model, config.image_model
    );

    let pipeline = Pipeline::with_services(
        PipelineServices {
            chat: Box::new(chat),
            editor: Box::new(editor),
            preview: Box::new(PreviewGenerator::new()),
        },
        storage.clone(),
    );

    let state = AppState {
        pipeline: Arc::new(pipeline),
        storage,
        limiter: Arc::new(ClientRateLimiter::new(config.rate_limit_per_minute)),
        http,
        max_upload_bytes: config.max_upload_bytes(),
    };

    match server::serve(state, config.port).await {
        Ok(_) => Ok(()),
        Err(e) => {
            error!("Server error: {}", e);
            std::process::exit(1);
        }
    }
}

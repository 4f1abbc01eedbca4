//! HTTP surface: routing, upload handling, and cross-cutting middleware
//!
//! Exposes the health and processing endpoints, serves persisted files
//! statically, and applies the upload gate, rate limit, CORS, and
//! baseline security headers around the request pipeline.

pub mod rate_limit;

use crate::ai::mime;
use crate::models::{HealthResponse, ProcessResponse, StagedUpload};
use crate::pipeline::Pipeline;
use crate::storage::Storage;
use crate::{Error, Result};
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use rate_limit::ClientRateLimiter;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);
const DOWNLOAD_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub storage: Arc<Storage>,
    pub limiter: Arc<ClientRateLimiter>,
    pub http: reqwest::Client,
    pub max_upload_bytes: u64,
}

pub fn router(state: AppState) -> Router {
    // Leave headroom over the image limit for multipart framing and the
    // prompt field; the per-file limit is enforced while reading.
    let body_limit = (state.max_upload_bytes as usize).saturating_add(1024 * 1024);

    Router::new()
        .route("/health", get(health_handler))
        .route("/process", post(process_handler))
        .nest_service("/storage", ServeDir::new(state.storage.root()))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            rate_limit::enforce,
        ))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// Binds the listener and serves until the process exits.
pub async fn serve(state: AppState, port: u16) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);

    axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        ts: Utc::now().timestamp_millis(),
    })
}

async fn process_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> std::result::Result<Json<ProcessResponse>, Error> {
    let mut staged: Option<StagedUpload> = None;
    let mut prompt: Option<String> = None;
    let mut image_url: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("image") => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await?;

                // Browsers submit an empty part when no file was chosen.
                if data.is_empty() {
                    continue;
                }

                let extension =
                    upload_extension(file_name.as_deref(), content_type.as_deref())
                        .ok_or_else(|| {
                            Error::Validation(
                                "Unsupported image type: expected jpg, jpeg, png, or webp"
                                    .to_string(),
                            )
                        })?;

                if data.len() as u64 > state.max_upload_bytes {
                    return Err(Error::Validation(format!(
                        "Image exceeds the {} byte upload limit",
                        state.max_upload_bytes
                    )));
                }

                staged = Some(state.storage.stage_upload(&data, &extension).await?);
            }
            Some("prompt") => prompt = Some(field.text().await?),
            Some("image_url") => image_url = Some(field.text().await?),
            _ => {}
        }
    }

    if staged.is_none() {
        let remote = image_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty());
        if let Some(url) = remote {
            let (data, content_type) = fetch_remote_image(&state.http, url).await?;
            let extension = mime::extension_for_mime(&content_type).ok_or_else(|| {
                Error::Validation(format!(
                    "Downloaded image has unsupported type: {}",
                    content_type
                ))
            })?;
            staged = Some(state.storage.stage_upload(&data, extension).await?);
        }
    }

    let response = state.pipeline.process(staged, prompt).await?;
    Ok(Json(response))
}

/// Validates and normalizes the extension of an uploaded file.
fn upload_extension(file_name: Option<&str>, content_type: Option<&str>) -> Option<String> {
    if let Some(extension) = file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
    {
        let extension = extension.to_ascii_lowercase();
        return mime::extension_allowed(&extension).then_some(extension);
    }

    content_type
        .and_then(mime::extension_for_mime)
        .map(str::to_string)
}

/// Downloads a source image when the client supplies `image_url` instead
/// of a file upload. Fetch problems are the client's fault, not ours.
async fn fetch_remote_image(
    client: &reqwest::Client,
    url: &str,
) -> Result<(Vec<u8>, String)> {
    let response = client
        .get(url)
        .timeout(DOWNLOAD_TIMEOUT)
        .header(header::USER_AGENT, DOWNLOAD_USER_AGENT)
        .send()
        .await
        .map_err(|e| Error::Validation(format!("Error downloading image: {}", e)))?;

    if !response.status().is_success() {
        return Err(Error::Validation(format!(
            "Failed to download image: {}",
            response.status()
        )));
    }

    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("image/jpeg")
        .to_string();

    let data = response
        .bytes()
        .await
        .map_err(|e| Error::Validation(format!("Error downloading image: {}", e)))?
        .to_vec();

    if data.is_empty() {
        return Err(Error::Validation("Downloaded image is empty".to_string()));
    }

    Ok((data, content_type))
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::Validation(message) => (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": message })),
            )
                .into_response(),
            Error::Multipart(e) => (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response(),
            other => {
                tracing::error!("Request failed: {}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({
                        "error": "Processing failed",
                        "message": other.to_string(),
                    })),
                )
                    .into_response()
            }
        }
    }
}

//! Data models and structures
//!
//! Request/response payloads for the HTTP API, the staged-upload handle
//! passed through the pipeline, and environment-driven configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Successful payload for `POST /process`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessResponse {
    pub success: bool,
    pub parsed: String,
    pub image_url: String,
    pub preview_url: String,
}

/// Payload for `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub ts: i64,
}

/// A source image written into storage, awaiting the edit pipeline.
///
/// `filename` is unique per request; `path` points inside the storage root.
#[derive(Debug, Clone)]
pub struct StagedUpload {
    pub filename: String,
    pub path: PathBuf,
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub storage_dir: PathBuf,
    pub max_upload_mb: u64,
    pub gemini_api_key: String,
    pub chat_model: String,
    pub image_model: String,
    pub rate_limit_per_minute: u32,
}

impl Config {
    pub fn from_env() -> crate::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            port: parse_env("PORT", 3000)?,
            storage_dir: PathBuf::from(
                std::env::var("STORAGE_DIR").unwrap_or_else(|_| "./storage".to_string()),
            ),
            max_upload_mb: parse_env("MAX_UPLOAD_MB", 8)?,
            gemini_api_key: std::env::var("GEMINI_API_KEY")
                .map_err(|_| crate::Error::Config("GEMINI_API_KEY not set".to_string()))?,
            chat_model: std::env::var("CHAT_MODEL")
                .unwrap_or_else(|_| "gemini-2.5-flash".to_string()),
            image_model: std::env::var("IMAGE_MODEL")
                .unwrap_or_else(|_| "gemini-2.5-flash-image".to_string()),
            rate_limit_per_minute: parse_env("RATE_LIMIT_PER_MINUTE", 60)?,
        })
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_mb * 1024 * 1024
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> crate::Result<T> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| crate::Error::Config(format!("Invalid {}: {}", name, raw))),
        Err(_) => Ok(default),
    }
}

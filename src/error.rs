//! Error handling and custom error types
//!
//! Provides unified error handling across the application using thiserror.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Multipart error: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),

    #[error("AI provider error: {0}")]
    AiProvider(String),

    #[error("{0}")]
    Validation(String),

    #[error("Image edit failed: {0}")]
    EditFailed(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invariant violation: {0}")]
    Invariant(String),
}

pub type Result<T> = std::result::Result<T, Error>;

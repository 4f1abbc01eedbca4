//! AI service integration for instruction interpretation and image editing
//!
//! Provides interfaces to Gemini's generateContent API for refining
//! free-text edit instructions and applying them to uploaded images.

pub mod gemini;
pub mod mime;
pub mod mock;

pub use gemini::{GeminiChatClient, GeminiImageEditClient};
pub use mock::{MockChatClient, MockImageEditClient};

use crate::Result;
use async_trait::async_trait;

/// Outcome of a text interpretation call.
///
/// A failed provider call degrades to the caller's original instruction
/// instead of failing the request; callers must match on the variant
/// rather than inspect a nullable field.
#[derive(Debug, Clone, PartialEq)]
pub enum Interpretation {
    Full(String),
    Degraded { text: String, error: String },
}

impl Interpretation {
    pub fn text(&self) -> &str {
        match self {
            Interpretation::Full(text) => text,
            Interpretation::Degraded { text, .. } => text,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Interpretation::Degraded { .. })
    }
}

#[async_trait]
pub trait ChatService: Send + Sync {
    async fn interpret_instruction(&self, instruction: &str) -> Result<String>;
}

#[async_trait]
pub trait ImageEditService: Send + Sync {
    async fn edit_image(&self, image_bytes: &[u8], instruction: &str) -> Result<Vec<u8>>;
}

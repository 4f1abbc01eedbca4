//! Request orchestration for a single `/process` call
//!
//! Sequences validation, preview generation, instruction interpretation,
//! the image edit, and output persistence. Steps run strictly in order;
//! a degraded interpretation continues with the original prompt, while a
//! failed edit fails the request.

use crate::ai::{ChatService, ImageEditService, Interpretation};
use crate::image::PreviewService;
use crate::models::{ProcessResponse, StagedUpload};
use crate::storage::Storage;
use crate::{Error, Result};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Coordinates the per-request edit sequence against injected services.
pub struct Pipeline {
    chat: Box<dyn ChatService>,
    editor: Box<dyn ImageEditService>,
    preview: Box<dyn PreviewService>,
    storage: Arc<Storage>,
}

/// Injectable service bundle used to construct [`Pipeline`].
pub struct PipelineServices {
    pub chat: Box<dyn ChatService>,
    pub editor: Box<dyn ImageEditService>,
    pub preview: Box<dyn PreviewService>,
}

impl Pipeline {
    pub fn with_services(services: PipelineServices, storage: Arc<Storage>) -> Self {
        Self {
            chat: services.chat,
            editor: services.editor,
            preview: services.preview,
            storage,
        }
    }

    /// Runs the full edit sequence for one request.
    pub async fn process(
        &self,
        upload: Option<StagedUpload>,
        prompt: Option<String>,
    ) -> Result<ProcessResponse> {
        let (upload, prompt) = self.validate(upload, prompt).await?;

        let (preview_name, preview_dest) = self.storage.preview_path(&upload);
        self.preview
            .generate_preview(&upload.path, &preview_dest)
            .await?;
        info!("Generated preview {}", preview_name);

        let interpretation = self.interpret(&prompt).await;

        let source = tokio::fs::read(&upload.path).await?;
        let edited = self
            .editor
            .edit_image(&source, interpretation.text())
            .await
            .map_err(|e| {
                error!("Image edit failed: {}", e);
                Error::EditFailed(e.to_string())
            })?;

        let output_name = self.storage.write_output(&edited).await?;
        info!(
            "Persisted edit output {} ({} bytes)",
            output_name,
            edited.len()
        );

        Ok(ProcessResponse {
            success: true,
            parsed: interpretation.text().to_string(),
            image_url: self.storage.url_for(&output_name),
            preview_url: self.storage.url_for(&preview_name),
        })
    }

    /// Requires both a staged upload and a non-empty trimmed prompt.
    ///
    /// A staged file from a rejected request is removed before the error
    /// is returned, so validation failures leave nothing behind.
    async fn validate(
        &self,
        upload: Option<StagedUpload>,
        prompt: Option<String>,
    ) -> Result<(StagedUpload, String)> {
        let prompt = prompt
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());

        match (upload, prompt) {
            (Some(upload), Some(prompt)) => Ok((upload, prompt)),
            (upload, _) => {
                if let Some(upload) = upload {
                    if let Err(e) = self.storage.delete(&upload).await {
                        warn!(
                            "Failed to remove rejected upload {}: {}",
                            upload.filename, e
                        );
                    }
                }
                Err(Error::Validation(
                    "Both an image and a prompt are required".to_string(),
                ))
            }
        }
    }

    async fn interpret(&self, prompt: &str) -> Interpretation {
        match self.chat.interpret_instruction(prompt).await {
            Ok(text) => Interpretation::Full(text),
            Err(e) => {
                warn!("Interpretation degraded, using original prompt: {}", e);
                Interpretation::Degraded {
                    text: prompt.to_string(),
                    error: e.to_string(),
                }
            }
        }
    }
}

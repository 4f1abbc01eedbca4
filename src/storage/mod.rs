//! Filesystem-backed storage for uploads, previews, and edit outputs
//!
//! All artifacts live in one flat directory served statically under
//! `/storage`. Filenames carry a millisecond timestamp plus a UUID so
//! concurrent requests never collide; the directory is append-only apart
//! from cleanup of uploads rejected during validation.

use crate::models::StagedUpload;
use crate::Result;
use chrono::Utc;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Route prefix under which the storage directory is served.
pub const PUBLIC_ROUTE: &str = "/storage";

pub struct Storage {
    root: PathBuf,
}

impl Storage {
    /// Opens (and creates, if absent) the storage directory.
    pub fn new(root: &Path) -> Result<Self> {
        std::fs::create_dir_all(root)?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn unique_stem() -> String {
        format!("{}-{}", Utc::now().timestamp_millis(), Uuid::new_v4())
    }

    /// Writes an uploaded source image under a fresh unique name,
    /// preserving the original extension.
    pub async fn stage_upload(&self, data: &[u8], extension: &str) -> Result<StagedUpload> {
        let filename = format!(
            "{}.{}",
            Self::unique_stem(),
            extension.to_ascii_lowercase()
        );
        let path = self.root.join(&filename);
        tokio::fs::write(&path, data).await?;

        Ok(StagedUpload { filename, path })
    }

    /// Derives the preview filename and path for a staged upload.
    pub fn preview_path(&self, upload: &StagedUpload) -> (String, PathBuf) {
        let filename = format!("preview-{}.webp", upload.filename);
        let path = self.root.join(&filename);
        (filename, path)
    }

    /// Persists edited-image bytes under a fresh output name.
    pub async fn write_output(&self, data: &[u8]) -> Result<String> {
        let filename = format!("out-{}.png", Self::unique_stem());
        tokio::fs::write(self.root.join(&filename), data).await?;
        Ok(filename)
    }

    /// Removes a staged upload rejected during validation.
    pub async fn delete(&self, upload: &StagedUpload) -> Result<()> {
        tokio::fs::remove_file(&upload.path).await?;
        Ok(())
    }

    /// Public URL for a stored filename.
    pub fn url_for(&self, filename: &str) -> String {
        format!("{}/{}", PUBLIC_ROUTE, filename)
    }
}

//! Preview image generation
//!
//! Derives a resized, web-optimized WebP copy of each staged upload for
//! lightweight delivery alongside the edit result.

pub mod mock;
pub mod processor;

pub use mock::MockPreviewGenerator;
pub use processor::PreviewGenerator;

use crate::Result;
use async_trait::async_trait;
use std::path::Path;

/// Maximum preview width in pixels. Wider sources are scaled down with
/// their aspect ratio preserved; narrower sources keep their size.
pub const MAX_PREVIEW_WIDTH: u32 = 1024;

#[async_trait]
pub trait PreviewService: Send + Sync {
    async fn generate_preview(&self, source: &Path, dest: &Path) -> Result<()>;
}

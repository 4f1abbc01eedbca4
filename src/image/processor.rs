use super::{PreviewService, MAX_PREVIEW_WIDTH};
use crate::{Error, Result};
use async_trait::async_trait;
use image::{imageops::FilterType, ImageFormat};
use std::path::{Path, PathBuf};

pub struct PreviewGenerator;

impl PreviewGenerator {
    pub fn new() -> Self {
        Self
    }

    fn render_preview_sync(source: PathBuf, dest: PathBuf) -> Result<()> {
        let img = image::open(&source)?;

        let preview = if img.width() > MAX_PREVIEW_WIDTH {
            // Height bound is unconstrained; width drives the scale factor.
            img.resize(MAX_PREVIEW_WIDTH, u32::MAX, FilterType::Lanczos3)
        } else {
            img
        };

        preview.save_with_format(&dest, ImageFormat::WebP)?;
        Ok(())
    }
}

impl Default for PreviewGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PreviewService for PreviewGenerator {
    async fn generate_preview(&self, source: &Path, dest: &Path) -> Result<()> {
        let source = source.to_path_buf();
        let dest = dest.to_path_buf();

        tokio::task::spawn_blocking(move || Self::render_preview_sync(source, dest))
            .await
            .map_err(|e| Error::Invariant(format!("Preview task join error: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_test_image(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 40, 40, 255]));
        let path = dir.join(name);
        img.save_with_format(&path, ImageFormat::Png).unwrap();
        path
    }

    #[tokio::test]
    async fn test_wide_image_is_scaled_to_max_width() {
        let dir = TempDir::new().unwrap();
        let source = write_test_image(dir.path(), "wide.png", 2048, 512);
        let dest = dir.path().join("preview.webp");

        PreviewGenerator::new()
            .generate_preview(&source, &dest)
            .await
            .unwrap();

        let preview = image::open(&dest).unwrap();
        assert_eq!(preview.width(), 1024);
        assert_eq!(preview.height(), 256);
    }

    #[tokio::test]
    async fn test_small_image_is_not_upscaled() {
        let dir = TempDir::new().unwrap();
        let source = write_test_image(dir.path(), "small.png", 320, 200);
        let dest = dir.path().join("preview.webp");

        PreviewGenerator::new()
            .generate_preview(&source, &dest)
            .await
            .unwrap();

        let preview = image::open(&dest).unwrap();
        assert_eq!(preview.width(), 320);
        assert_eq!(preview.height(), 200);
    }

    #[tokio::test]
    async fn test_preview_is_webp_encoded() {
        let dir = TempDir::new().unwrap();
        let source = write_test_image(dir.path(), "photo.png", 64, 64);
        let dest = dir.path().join("preview.webp");

        PreviewGenerator::new()
            .generate_preview(&source, &dest)
            .await
            .unwrap();

        let bytes = std::fs::read(&dest).unwrap();
        assert_eq!(&bytes[..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WEBP");
    }

    #[tokio::test]
    async fn test_unreadable_source_is_an_error() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("missing.png");
        let dest = dir.path().join("preview.webp");

        let result = PreviewGenerator::new().generate_preview(&source, &dest).await;
        assert!(result.is_err());
        assert!(!dest.exists());
    }
}

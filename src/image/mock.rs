use super::PreviewService;
use crate::{Error, Result};
use async_trait::async_trait;
use std::path::Path;
use std::sync::{Arc, Mutex};

pub struct MockPreviewGenerator {
    call_count: Arc<Mutex<usize>>,
    should_fail: Arc<Mutex<bool>>,
}

impl MockPreviewGenerator {
    pub fn new() -> Self {
        Self {
            call_count: Arc::new(Mutex::new(0)),
            should_fail: Arc::new(Mutex::new(false)),
        }
    }

    pub fn with_failure(self, should_fail: bool) -> Self {
        *self.should_fail.lock().unwrap() = should_fail;
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

impl Default for MockPreviewGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PreviewService for MockPreviewGenerator {
    async fn generate_preview(&self, _source: &Path, dest: &Path) -> Result<()> {
        if *self.should_fail.lock().unwrap() {
            return Err(Error::Image(image::ImageError::IoError(
                std::io::Error::other("Mock preview failure"),
            )));
        }

        *self.call_count.lock().unwrap() += 1;

        tokio::fs::write(dest, b"mock-preview").await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_mock_writes_preview_file() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("preview-test.webp");

        let generator = MockPreviewGenerator::new();
        generator
            .generate_preview(Path::new("/nonexistent"), &dest)
            .await
            .unwrap();

        assert!(dest.exists());
        assert_eq!(generator.get_call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_with_failure() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("preview-test.webp");

        let generator = MockPreviewGenerator::new().with_failure(true);
        let result = generator.generate_preview(Path::new("/nonexistent"), &dest).await;

        assert!(result.is_err());
        assert_eq!(generator.get_call_count(), 0);
    }
}

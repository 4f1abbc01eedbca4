use super::{ChatService, ImageEditService};
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// A 1x1 valid PNG used as the default edited-image payload.
const TINY_PNG: [u8; 69] = [
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, // PNG signature
    0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52, // IHDR chunk
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, // 1x1 pixel
    0x08, 0x02, 0x00, 0x00, 0x00, 0x90, 0x77, 0x53, 0xDE, 0x00, 0x00, 0x00, 0x0C, 0x49, 0x44,
    0x41, // IDAT chunk
    0x54, 0x08, 0x99, 0x63, 0xF8, 0xCF, 0xC0, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0xE2, 0x25,
    0x00, 0xBC, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, // IEND chunk
    0x44, 0xAE, 0x42, 0x60, 0x82,
];

#[derive(Clone)]
pub struct MockChatClient {
    responses: Arc<Mutex<Vec<String>>>,
    call_count: Arc<Mutex<usize>>,
    should_fail: Arc<Mutex<bool>>,
}

impl MockChatClient {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
            should_fail: Arc::new(Mutex::new(false)),
        }
    }

    pub fn with_response(self, response: String) -> Self {
        self.responses.lock().unwrap().push(response);
        self
    }

    pub fn with_failure(self, should_fail: bool) -> Self {
        *self.should_fail.lock().unwrap() = should_fail;
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

impl Default for MockChatClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatService for MockChatClient {
    async fn interpret_instruction(&self, instruction: &str) -> Result<String> {
        if *self.should_fail.lock().unwrap() {
            return Err(Error::AiProvider("Mock chat failure".to_string()));
        }

        let mut count = self.call_count.lock().unwrap();
        *count += 1;

        let responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(format!("Apply the following edit: {}", instruction))
        } else {
            let index = (*count - 1) % responses.len();
            Ok(responses[index].clone())
        }
    }
}

#[derive(Clone)]
pub struct MockImageEditClient {
    responses: Arc<Mutex<Vec<Vec<u8>>>>,
    call_count: Arc<Mutex<usize>>,
    should_fail: Arc<Mutex<bool>>,
}

impl MockImageEditClient {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
            should_fail: Arc::new(Mutex::new(false)),
        }
    }

    pub fn with_image_response(self, response: Vec<u8>) -> Self {
        self.responses.lock().unwrap().push(response);
        self
    }

    pub fn with_failure(self, should_fail: bool) -> Self {
        *self.should_fail.lock().unwrap() = should_fail;
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

impl Default for MockImageEditClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageEditService for MockImageEditClient {
    async fn edit_image(&self, _image_bytes: &[u8], _instruction: &str) -> Result<Vec<u8>> {
        if *self.should_fail.lock().unwrap() {
            return Err(Error::AiProvider("Mock image edit failure".to_string()));
        }

        let mut count = self.call_count.lock().unwrap();
        *count += 1;

        let responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(TINY_PNG.to_vec())
        } else {
            let index = (*count - 1) % responses.len();
            Ok(responses[index].clone())
        }
    }
}

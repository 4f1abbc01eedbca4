use super::client::GeminiHttpClient;
use super::types::{Content, GenerateContentResponse, InlineData, Part};
use crate::ai::{mime, ImageEditService};
use crate::{Error, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Serialize)]
struct EditRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: EditGenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EditGenerationConfig {
    response_modalities: Vec<String>,
}

/// Applies an edit instruction to a source image through Gemini's image models.
pub struct GeminiImageEditClient {
    http: GeminiHttpClient,
}

impl GeminiImageEditClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self::new_with_client(api_key, model, reqwest::Client::new())
    }

    pub fn new_with_client(api_key: String, model: String, client: reqwest::Client) -> Self {
        Self {
            // Image generation is slow; allow well beyond the chat timeout.
            http: GeminiHttpClient::new_with_client(
                api_key,
                model,
                Duration::from_secs(120),
                client,
            ),
        }
    }
}

#[cfg(test)]
super::impl_with_gemini_base_url!(GeminiImageEditClient);

#[async_trait]
impl ImageEditService for GeminiImageEditClient {
    async fn edit_image(&self, image_bytes: &[u8], instruction: &str) -> Result<Vec<u8>> {
        tracing::debug!(
            "Sending image ({} bytes) to Gemini for editing",
            image_bytes.len()
        );

        use base64::Engine as _;
        let base64_image = base64::engine::general_purpose::STANDARD.encode(image_bytes);

        let request = EditRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: mime::detect_image_mime(image_bytes).to_string(),
                            data: base64_image,
                        },
                    },
                    Part::Text {
                        text: instruction.to_string(),
                    },
                ],
            }],
            generation_config: EditGenerationConfig {
                response_modalities: vec!["IMAGE".to_string()],
            },
        };

        let response: GenerateContentResponse = self.http.generate_content(&request).await?;

        let edited = response
            .candidates
            .first()
            .and_then(|c| {
                c.content.parts.iter().find_map(|p| match p {
                    Part::InlineData { inline_data } => Some(inline_data),
                    _ => None,
                })
            })
            .ok_or_else(|| Error::AiProvider("No image data in Gemini response".to_string()))?;

        tracing::debug!("Gemini returned image with mime_type: {}", edited.mime_type);

        base64::engine::general_purpose::STANDARD
            .decode(&edited.data)
            .map_err(|e| Error::AiProvider(format!("Failed to decode Gemini base64 image: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::gemini::test_support;
    use wiremock::matchers::body_string_contains;
    use wiremock::{MockServer, ResponseTemplate};

    const DEFAULT_MODEL: &str = "gemini-2.5-flash-image";

    fn make_client(server: &MockServer, api_key: &str, model: &str) -> GeminiImageEditClient {
        GeminiImageEditClient::new(api_key.to_string(), model.to_string())
            .with_base_url(server.uri())
    }

    #[tokio::test]
    async fn test_edit_image_parses_inline_data() {
        let server = MockServer::start().await;

        use base64::Engine as _;
        let edited_image = vec![0x89, 0x50, 0x4E, 0x47];
        let b64 = base64::engine::general_purpose::STANDARD.encode(&edited_image);

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{
                    "content": {
                        "parts": [{
                            "inlineData": {
                                "mimeType": "image/png",
                                "data": b64
                            }
                        }]
                    }
                }]
            })))
            .mount(&server)
            .await;

        let client = make_client(&server, "key", DEFAULT_MODEL);

        let result = client
            .edit_image(&[0xFF, 0xD8, 0xFF, 0xE0], "add a red hat")
            .await
            .unwrap();
        assert_eq!(result, edited_image);
    }

    #[tokio::test]
    async fn test_request_carries_source_image_and_instruction() {
        let server = MockServer::start().await;

        use base64::Engine as _;
        let source = [0xFF, 0xD8, 0xFF, 0xE0];
        let source_b64 = base64::engine::general_purpose::STANDARD.encode(source);
        let reply_b64 = base64::engine::general_purpose::STANDARD.encode([0x00]);

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .and(body_string_contains(source_b64.as_str()))
            .and(body_string_contains("\"image/jpeg\""))
            .and(body_string_contains("add a red hat"))
            .and(body_string_contains("\"responseModalities\":[\"IMAGE\"]"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{
                    "content": {
                        "parts": [{
                            "inlineData": { "mimeType": "image/png", "data": reply_b64 }
                        }]
                    }
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = make_client(&server, "key", DEFAULT_MODEL);

        client.edit_image(&source, "add a red hat").await.unwrap();
    }

    #[tokio::test]
    async fn test_api_error_returns_ai_provider_error() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
            .mount(&server)
            .await;

        let client = make_client(&server, "key", DEFAULT_MODEL);

        let err = client
            .edit_image(&[0x89, 0x50], "brighten")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AiProvider(_)));
    }

    #[tokio::test]
    async fn test_edit_image_rejects_missing_inline_data() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{
                    "content": { "parts": [{ "text": "no image here" }] }
                }]
            })))
            .mount(&server)
            .await;

        let client = make_client(&server, "key", DEFAULT_MODEL);
        let err = client
            .edit_image(&[0x89, 0x50], "brighten")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AiProvider(_)));
    }

    #[tokio::test]
    async fn test_edit_image_rejects_invalid_base64() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{
                    "content": {
                        "parts": [{
                            "inlineData": {
                                "mimeType": "image/png",
                                "data": "!!!invalid-base64!!!"
                            }
                        }]
                    }
                }]
            })))
            .mount(&server)
            .await;

        let client = make_client(&server, "key", DEFAULT_MODEL);
        let err = client
            .edit_image(&[0x89, 0x50], "brighten")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AiProvider(_)));
    }
}

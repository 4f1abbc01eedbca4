use super::client::GeminiHttpClient;
use super::types::{Content, GenerateContentResponse, Part};
use crate::ai::ChatService;
use crate::{prompts, Error, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Serialize)]
struct InterpretRequest {
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: Option<InterpretGenerationConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InterpretGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

/// Refines free-text edit instructions through Gemini's chat models.
pub struct GeminiChatClient {
    http: GeminiHttpClient,
}

impl GeminiChatClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self::new_with_client(api_key, model, reqwest::Client::new())
    }

    pub fn new_with_client(api_key: String, model: String, client: reqwest::Client) -> Self {
        Self {
            http: GeminiHttpClient::new_with_client(
                api_key,
                model,
                Duration::from_secs(30),
                client,
            ),
        }
    }

    fn extract_text(response: &GenerateContentResponse) -> Option<String> {
        response.candidates.first().and_then(|c| {
            c.content.parts.iter().find_map(|p| match p {
                Part::Text { text } => Some(text.clone()),
                Part::InlineData { .. } => None,
            })
        })
    }
}

#[cfg(test)]
super::impl_with_gemini_base_url!(GeminiChatClient);

#[async_trait]
impl ChatService for GeminiChatClient {
    async fn interpret_instruction(&self, instruction: &str) -> Result<String> {
        let request = InterpretRequest {
            system_instruction: Some(Content {
                role: None,
                parts: vec![Part::Text {
                    text: prompts::INTERPRET_SYSTEM.to_string(),
                }],
            }),
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part::Text {
                    text: prompts::render(
                        prompts::INTERPRET_USER,
                        &[("instruction", instruction)],
                    ),
                }],
            }],
            generation_config: Some(InterpretGenerationConfig {
                temperature: Some(0.7),
                max_output_tokens: Some(2048),
            }),
        };

        let response: GenerateContentResponse = self.http.generate_content(&request).await?;

        Self::extract_text(&response)
            .map(|text| text.trim().to_string())
            .ok_or_else(|| Error::AiProvider("No text in Gemini chat response".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::gemini::test_support;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const DEFAULT_MODEL: &str = "gemini-2.5-flash";

    fn make_client(server: &MockServer, api_key: &str, model: &str) -> GeminiChatClient {
        GeminiChatClient::new(api_key.to_string(), model.to_string()).with_base_url(server.uri())
    }

    #[tokio::test]
    async fn test_interpret_instruction_parses_response() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{
                    "content": {
                        "parts": [{ "text": "Replace the sky with a purple sunset" }]
                    }
                }]
            })))
            .mount(&server)
            .await;

        let client = make_client(&server, "test-key", DEFAULT_MODEL);

        let parsed = client
            .interpret_instruction("make the sky purple")
            .await
            .unwrap();
        assert_eq!(parsed, "Replace the sky with a purple sunset");
    }

    #[tokio::test]
    async fn test_interpret_instruction_trims_whitespace() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{
                    "content": {
                        "parts": [{ "text": "Brighten the foreground\n" }]
                    }
                }]
            })))
            .mount(&server)
            .await;

        let client = make_client(&server, "test-key", DEFAULT_MODEL);

        let parsed = client.interpret_instruction("brighten it").await.unwrap();
        assert_eq!(parsed, "Brighten the foreground");
    }

    #[tokio::test]
    async fn test_api_error_returns_ai_provider_error() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let client = make_client(&server, "bad-key", DEFAULT_MODEL);

        let err = client
            .interpret_instruction("make it pop")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AiProvider(_)));
    }

    #[tokio::test]
    async fn test_empty_candidates_are_rejected() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": []
            })))
            .mount(&server)
            .await;

        let client = make_client(&server, "test-key", DEFAULT_MODEL);
        let err = client.interpret_instruction("crop it").await.unwrap_err();
        assert!(matches!(err, Error::AiProvider(_)));
    }

    #[tokio::test]
    async fn test_models_prefix_is_stripped_from_model_id() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{
                    "content": {
                        "parts": [{ "text": "instruction" }]
                    }
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = make_client(&server, "test-key", "models/gemini-2.5-flash");

        client.interpret_instruction("resize").await.unwrap();
    }
}

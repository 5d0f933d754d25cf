// OpenRouter chat-completions client.
//
// OpenRouter speaks the OpenAI chat format: messages go in as-is and the
// answer comes back at `choices[0].message.content`. Some models also return
// their reasoning at `choices[0].message.reasoning`.

use crate::core::ai::{
    models::{AiConfig, AiMessage, AiProviderResponse},
    AiProvider,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::error::Error;

pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [AiMessage],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    reasoning: Option<String>,
}

pub struct OpenRouterClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenRouterClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, OPENROUTER_BASE_URL.to_string())
    }

    /// Point the client somewhere else (a proxy, or a local test server).
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn build_request<'a>(messages: &'a [AiMessage], config: &'a AiConfig) -> ChatRequest<'a> {
        ChatRequest {
            model: &config.model,
            messages,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            top_p: config.top_p,
        }
    }

    fn parse_response(response: ChatResponse) -> Result<AiProviderResponse, Box<dyn Error + Send + Sync>> {
        let message = response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or("OpenRouter response had no choices")?;

        let content = message
            .content
            .ok_or("Failed to parse response content")?;

        Ok(AiProviderResponse {
            content,
            thinking: message.reasoning.filter(|r| !r.trim().is_empty()),
        })
    }
}

#[async_trait]
impl AiProvider for OpenRouterClient {
    async fn chat_complete(
        &self,
        messages: &[AiMessage],
        config: &AiConfig,
    ) -> Result<AiProviderResponse, Box<dyn Error + Send + Sync>> {
        let url = format!("{}/chat/completions", self.base_url);
        let payload = Self::build_request(messages, config);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await?;
            return Err(format!("OpenRouter API error: {} - {}", status, text).into());
        }

        let parsed: ChatResponse = response.json().await?;
        let result = Self::parse_response(parsed)?;

        tracing::debug!(
            "OpenRouter response received: {} chars content, {} chars reasoning",
            result.content.len(),
            result.thinking.as_ref().map(|t| t.len()).unwrap_or(0)
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization_skips_unset_fields() {
        let messages = vec![AiMessage::user("hi")];
        let config = AiConfig {
            model: "test/model".to_string(),
            temperature: 0.2,
            max_tokens: None,
            top_p: None,
        };

        let json = serde_json::to_value(OpenRouterClient::build_request(&messages, &config)).unwrap();
        assert_eq!(json["model"], "test/model");
        assert_eq!(json["messages"][0]["role"], "user");
        assert!(json.get("max_tokens").is_none());
        assert!(json.get("top_p").is_none());
    }

    #[test]
    fn test_parse_response_with_reasoning() {
        let raw = r#"{"choices":[{"message":{"content":"Werk!","reasoning":"short and sweet"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        let response = OpenRouterClient::parse_response(parsed).unwrap();

        assert_eq!(response.content, "Werk!");
        assert_eq!(response.thinking.as_deref(), Some("short and sweet"));
    }

    #[test]
    fn test_parse_response_without_choices_fails() {
        let parsed: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(OpenRouterClient::parse_response(parsed).is_err());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = OpenRouterClient::with_base_url("k".to_string(), "http://localhost:9/v1/".to_string());
        assert_eq!(client.base_url, "http://localhost:9/v1");
    }
}

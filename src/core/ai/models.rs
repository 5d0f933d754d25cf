use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiMessage {
    pub role: String,
    pub content: String,
}

impl AiMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AiConfig {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f32>,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            model: "deepseek/deepseek-chat-v3.1:free".to_string(),
            temperature: 0.7,
            max_tokens: Some(300),
            top_p: Some(1.0),
        }
    }
}

/// Response from an AI provider, containing the main content and optional thinking.
#[derive(Debug, Clone, Default)]
pub struct AiProviderResponse {
    /// The main response content from the model.
    pub content: String,

    /// Optional reasoning returned by models that expose it.
    pub thinking: Option<String>,
}

/// Who wrote the content being enhanced. Goes into the prompt so suggestions
/// keep the author's voice.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorContext {
    pub display_name: String,
    #[serde(default)]
    pub bio: Option<String>,
    /// Preferred tone, e.g. "playful" or "formal"
    #[serde(default)]
    pub tone: Option<String>,
}

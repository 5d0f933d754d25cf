// Content enhancement - caption and hashtag suggestions from a text-completion API.
//
// Each call builds one prompt from the content and the author's context, sends
// it to the provider once, and tidies the answer. No state, no retries.

use super::models::{AiConfig, AiMessage, AiProviderResponse, AuthorContext};
use async_trait::async_trait;
use std::error::Error;
use thiserror::Error as ThisError;

/// Upper bound on suggested hashtags per request.
const MAX_HASHTAGS: usize = 5;

const DEFAULT_SYSTEM_PROMPT: &str = "You help members of an online ballroom community \
polish their posts. Keep the author's voice, keep it short, never add content that was \
not implied by the original.";

#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Sends a chat completion request to the AI provider.
    async fn chat_complete(
        &self,
        messages: &[AiMessage],
        config: &AiConfig,
    ) -> Result<AiProviderResponse, Box<dyn Error + Send + Sync>>;
}

// Blanket implementation for Box<dyn AiProvider>
// so the composition root can choose a provider at runtime.
#[async_trait]
impl AiProvider for Box<dyn AiProvider> {
    async fn chat_complete(
        &self,
        messages: &[AiMessage],
        config: &AiConfig,
    ) -> Result<AiProviderResponse, Box<dyn Error + Send + Sync>> {
        (**self).chat_complete(messages, config).await
    }
}

#[derive(Debug, ThisError)]
pub enum EnhancementError {
    #[error("Nothing to enhance: content is empty")]
    EmptyContent,

    #[error("AI provider error: {0}")]
    Provider(String),

    #[error("AI provider returned an empty answer")]
    EmptyAnswer,
}

pub struct EnhancementService<P: AiProvider> {
    provider: P,
    system_prompt: String,
    config: AiConfig,
}

impl<P: AiProvider> EnhancementService<P> {
    pub fn new(provider: P, config: AiConfig) -> Self {
        Self::with_system_prompt(provider, DEFAULT_SYSTEM_PROMPT.to_string(), config)
    }

    pub fn with_system_prompt(provider: P, system_prompt: String, config: AiConfig) -> Self {
        Self {
            provider,
            system_prompt,
            config,
        }
    }

    /// Rewrite a caption so it reads better, in the author's voice.
    pub async fn enhance_caption(
        &self,
        content: &str,
        author: &AuthorContext,
    ) -> Result<String, EnhancementError> {
        let content = non_empty(content)?;
        let prompt = format!(
            "{}\nRewrite the caption below so it is clear and engaging. \
             Reply with the caption only.\n\nCaption:\n{}",
            describe_author(author),
            content
        );

        self.complete(prompt).await
    }

    /// Suggest up to five hashtags for a piece of content.
    pub async fn suggest_hashtags(
        &self,
        content: &str,
        author: &AuthorContext,
    ) -> Result<Vec<String>, EnhancementError> {
        let content = non_empty(content)?;
        let prompt = format!(
            "{}\nSuggest up to {} hashtags for the post below. \
             Reply with the hashtags only, separated by spaces.\n\nPost:\n{}",
            describe_author(author),
            MAX_HASHTAGS,
            content
        );

        let answer = self.complete(prompt).await?;
        Ok(parse_hashtags(&answer))
    }

    async fn complete(&self, prompt: String) -> Result<String, EnhancementError> {
        let messages = [AiMessage::system(self.system_prompt.clone()), AiMessage::user(prompt)];

        let response = self
            .provider
            .chat_complete(&messages, &self.config)
            .await
            .map_err(|e| EnhancementError::Provider(e.to_string()))?;

        let answer = tidy_answer(&response.content);
        if answer.is_empty() {
            return Err(EnhancementError::EmptyAnswer);
        }
        Ok(answer)
    }
}

fn non_empty(content: &str) -> Result<&str, EnhancementError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        Err(EnhancementError::EmptyContent)
    } else {
        Ok(trimmed)
    }
}

fn describe_author(author: &AuthorContext) -> String {
    let mut description = format!("Author: {}.", author.display_name);
    if let Some(bio) = author.bio.as_deref().filter(|b| !b.trim().is_empty()) {
        description.push_str(&format!(" Bio: {}.", bio.trim()));
    }
    if let Some(tone) = author.tone.as_deref().filter(|t| !t.trim().is_empty()) {
        description.push_str(&format!(" Preferred tone: {}.", tone.trim()));
    }
    description
}

/// Pull the answer out of `<answer>` tags if present, then drop surrounding
/// whitespace and one layer of wrapping quotes.
fn tidy_answer(content: &str) -> String {
    let mut answer = content;

    if let (Some(start), Some(end)) = (content.find("<answer>"), content.find("</answer>")) {
        if end > start {
            answer = &content[start + "<answer>".len()..end];
        }
    }

    let answer = answer.trim();
    let unquoted = ['"', '\'', '“']
        .iter()
        .find_map(|q| {
            let closing = if *q == '“' { '”' } else { *q };
            answer
                .strip_prefix(*q)
                .and_then(|rest| rest.strip_suffix(closing))
        })
        .unwrap_or(answer);

    unquoted.trim().to_string()
}

fn parse_hashtags(answer: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for raw in answer.split(|c: char| c.is_whitespace() || c == ',') {
        let word: String = raw
            .trim_start_matches('#')
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == '_')
            .collect();
        if word.is_empty() {
            continue;
        }
        let tag = format!("#{}", word);
        if !tags.iter().any(|t| t.eq_ignore_ascii_case(&tag)) {
            tags.push(tag);
        }
        if tags.len() == MAX_HASHTAGS {
            break;
        }
    }
    tags
}

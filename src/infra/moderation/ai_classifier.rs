// AI risk classifier - asks a text-completion model to score content.
//
// Used when no dedicated moderation API is configured. The model is told to
// answer with a JSON object; we take the first `{...}` block in the answer and
// run it through the same parser as the HTTP classifier.

use super::http_classifier::parse_scores;
use crate::core::ai::{AiConfig, AiMessage, AiProvider};
use crate::core::moderation::{
    ContentSubmission, ModerationError, RiskClassifier, RiskScoreVector,
};
use async_trait::async_trait;

const SCORING_PROMPT: &str = "You are a content safety classifier. Score the user's content \
for each category with a number between 0 and 1. Reply with a single JSON object and nothing \
else, using exactly these keys: toxicity, hate_speech, violence, sexual_content.";

pub struct AiRiskClassifier<P: AiProvider> {
    provider: P,
    config: AiConfig,
}

impl<P: AiProvider> AiRiskClassifier<P> {
    pub fn new(provider: P, config: AiConfig) -> Self {
        Self { provider, config }
    }
}

/// The first complete `{ ... }` object in a model answer.
///
/// Braces inside JSON strings are skipped so `{"note": "}"}` stays whole.
fn extract_json_object(answer: &str) -> Option<&str> {
    let start = answer.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in answer[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&answer[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

#[async_trait]
impl<P: AiProvider> RiskClassifier for AiRiskClassifier<P> {
    async fn classify(
        &self,
        submission: &ContentSubmission,
    ) -> Result<RiskScoreVector, ModerationError> {
        let messages = [
            AiMessage::system(SCORING_PROMPT),
            AiMessage::user(format!(
                "Content type: {}\n\n{}",
                submission.content_type, submission.body
            )),
        ];

        let response = self
            .provider
            .chat_complete(&messages, &self.config)
            .await
            .map_err(|e| ModerationError::Classifier(e.to_string()))?;

        let json = extract_json_object(&response.content).ok_or_else(|| {
            ModerationError::Classifier("model answer contained no JSON object".to_string())
        })?;
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| ModerationError::Classifier(format!("model answer is not JSON: {}", e)))?;

        parse_scores(&value)
    }
}

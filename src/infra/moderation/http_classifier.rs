// HTTP risk classifier - asks a moderation-scoring API for category scores.
//
// Request:  POST <url>  {"content": "...", "content_type": "post"}
// Response: either the scores object itself, or `{"scores": {...}}`.
// Field names may be snake_case or camelCase; they are normalised here so the
// policy only ever sees a `RiskScoreVector`.

use crate::core::moderation::{
    ContentSubmission, ModerationError, RiskCategory, RiskClassifier, RiskScoreVector,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Serialize)]
struct ClassifyRequest<'a> {
    content: &'a str,
    content_type: &'a str,
}

/// Turn a classifier JSON payload into a score vector.
///
/// Fails if the payload carries none of the known categories, or if a known
/// category is not a number: an unreadable score is not the same as zero.
pub fn parse_scores(payload: &Value) -> Result<RiskScoreVector, ModerationError> {
    let scores = match payload.get("scores") {
        Some(inner) if inner.is_object() => inner,
        _ => payload,
    };

    let object = scores.as_object().ok_or_else(|| {
        ModerationError::Classifier("classifier response is not a JSON object".to_string())
    })?;

    let mut has_known_category = false;
    for (name, value) in object {
        if RiskCategory::from_field_name(name).is_none() {
            continue;
        }
        if !value.is_number() {
            return Err(ModerationError::Classifier(format!(
                "classifier score for {} is not a number: {}",
                name, value
            )));
        }
        has_known_category = true;
    }
    if !has_known_category {
        return Err(ModerationError::Classifier(
            "classifier response has no known risk categories".to_string(),
        ));
    }

    serde_json::from_value(scores.clone())
        .map_err(|e| ModerationError::Classifier(format!("invalid scores: {}", e)))
}

pub struct HttpRiskClassifier {
    client: Client,
    url: String,
    api_key: Option<String>,
}

impl HttpRiskClassifier {
    pub fn new(
        url: String,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ModerationError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ModerationError::Config(e.to_string()))?;

        Ok(Self {
            client,
            url,
            api_key,
        })
    }
}

#[async_trait]
impl RiskClassifier for HttpRiskClassifier {
    async fn classify(
        &self,
        submission: &ContentSubmission,
    ) -> Result<RiskScoreVector, ModerationError> {
        let payload = ClassifyRequest {
            content: &submission.body,
            content_type: submission.content_type.as_str(),
        };

        let mut request = self.client.post(&self.url).json(&payload);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        let response = request
            .send()
            .await
            .map_err(|e| ModerationError::Classifier(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ModerationError::Classifier(format!(
                "moderation API error: {} - {}",
                status, text
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ModerationError::Classifier(e.to_string()))?;

        parse_scores(&body)
    }
}

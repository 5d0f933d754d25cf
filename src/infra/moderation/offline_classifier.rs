// Classifier used when nothing is configured. Every call reports the
// classifier as unavailable, so content is held for review instead of being
// scored as zero.

use crate::core::moderation::{ContentSubmission, ModerationError, RiskClassifier, RiskScoreVector};
use async_trait::async_trait;

pub struct OfflineClassifier;

#[async_trait]
impl RiskClassifier for OfflineClassifier {
    async fn classify(
        &self,
        _submission: &ContentSubmission,
    ) -> Result<RiskScoreVector, ModerationError> {
        Err(ModerationError::Classifier(
            "no moderation classifier configured".to_string(),
        ))
    }
}

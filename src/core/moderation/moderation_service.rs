// Moderation service - the caller side of the decision policy.
//
// This service handles:
// - Asking a classifier for risk scores
// - Falling back to "pending review" when the classifier is unavailable
// - Persisting the decision next to the content it belongs to
// - Review queue and dashboard counts for admins
//
// NO HTTP or database code here - classifiers and stores are ports.

use super::moderation_models::{
    ContentSubmission, ModerationDecision, ModerationRecord, ModerationVerdict, RiskLevel,
    RiskScoreVector,
};
use super::moderation_policy::{classifier_unavailable, risk_level, ModerationPolicy};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum ModerationError {
    #[error("Classifier error: {0}")]
    Classifier(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

// ============================================================================
// PORTS
// ============================================================================

/// Something that can score content for risk.
#[async_trait]
pub trait RiskClassifier: Send + Sync {
    /// Score a content item. Field-name normalisation happens in here, so the
    /// returned vector is ready for the policy.
    async fn classify(
        &self,
        submission: &ContentSubmission,
    ) -> Result<RiskScoreVector, ModerationError>;
}

// Lets the composition root pick a classifier at runtime.
#[async_trait]
impl RiskClassifier for Box<dyn RiskClassifier> {
    async fn classify(
        &self,
        submission: &ContentSubmission,
    ) -> Result<RiskScoreVector, ModerationError> {
        (**self).classify(submission).await
    }
}

/// Trait for persisting moderation decisions alongside content.
#[async_trait]
pub trait DecisionStore: Send + Sync {
    /// Append a decision. Older decisions for the same content are kept.
    async fn save_decision(&self, record: &ModerationRecord) -> Result<(), ModerationError>;

    /// Most recent decision for a content item.
    async fn latest_decision(
        &self,
        content_id: &str,
    ) -> Result<Option<ModerationRecord>, ModerationError>;

    /// Content whose latest decision needs a human (pending review or flagged),
    /// newest first.
    async fn review_queue(&self, limit: usize) -> Result<Vec<ModerationRecord>, ModerationError>;

    /// How many content items currently sit at each verdict (latest decision only).
    async fn verdict_counts(&self) -> Result<HashMap<ModerationVerdict, u64>, ModerationError>;
}

// ============================================================================
// DASHBOARD SUMMARY
// ============================================================================

/// Counts for the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationSummary {
    pub approved: u64,
    pub pending_review: u64,
    pub flagged: u64,
    pub rejected: u64,
}

impl ModerationSummary {
    pub fn from_counts(counts: &HashMap<ModerationVerdict, u64>) -> Self {
        let get = |v: ModerationVerdict| counts.get(&v).copied().unwrap_or(0);
        Self {
            approved: get(ModerationVerdict::Approved),
            pending_review: get(ModerationVerdict::PendingReview),
            flagged: get(ModerationVerdict::Flagged),
            rejected: get(ModerationVerdict::Rejected),
        }
    }

    /// Count one more item at `verdict`.
    pub fn record(&mut self, verdict: ModerationVerdict) {
        match verdict {
            ModerationVerdict::Approved => self.approved += 1,
            ModerationVerdict::PendingReview => self.pending_review += 1,
            ModerationVerdict::Flagged => self.flagged += 1,
            ModerationVerdict::Rejected => self.rejected += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.approved + self.pending_review + self.flagged + self.rejected
    }

    pub fn needs_review(&self) -> u64 {
        self.pending_review + self.flagged
    }
}

// ============================================================================
// CORE SERVICE
// ============================================================================

pub struct ModerationService<C: RiskClassifier, S: DecisionStore> {
    classifier: C,
    store: S,
    policy: ModerationPolicy,
}

impl<C: RiskClassifier, S: DecisionStore> ModerationService<C, S> {
    /// Create a service using the standard threshold table.
    pub fn new(classifier: C, store: S) -> Self {
        Self::with_policy(classifier, store, ModerationPolicy::default())
    }

    pub fn with_policy(classifier: C, store: S, policy: ModerationPolicy) -> Self {
        Self {
            classifier,
            store,
            policy,
        }
    }

    /// Score and decide without persisting anything.
    ///
    /// A classifier failure never turns into fabricated zero scores; it
    /// produces the fixed "automated check unavailable" decision instead.
    pub async fn evaluate(
        &self,
        submission: &ContentSubmission,
    ) -> (ModerationDecision, Option<RiskLevel>) {
        match self.classifier.classify(submission).await {
            Ok(scores) => {
                let decision = self
                    .policy
                    .decide(&scores, Some(&submission.content_type));
                (decision, Some(risk_level(&scores)))
            }
            Err(e) => {
                tracing::warn!(
                    content_id = %submission.content_id,
                    error = %e,
                    "Classifier unavailable, holding content for review"
                );
                (classifier_unavailable(), None)
            }
        }
    }

    /// Moderate a content item and persist the decision.
    ///
    /// # Arguments
    /// * `submission` - The content to check
    /// * `actor_id` - Who triggered the check, recorded for audit
    pub async fn moderate(
        &self,
        submission: &ContentSubmission,
        actor_id: Option<&str>,
    ) -> Result<ModerationRecord, ModerationError> {
        let (decision, risk_level) = self.evaluate(submission).await;

        let record = ModerationRecord {
            content_id: submission.content_id.clone(),
            content_type: submission.content_type.clone(),
            actor_id: actor_id.map(str::to_string),
            decision,
            risk_level,
        };

        self.store.save_decision(&record).await?;

        tracing::info!(
            content_id = %record.content_id,
            content_type = %record.content_type,
            actor_id = actor_id.unwrap_or("system"),
            verdict = record.decision.verdict().as_str(),
            reasons = ?record.decision.reasons(),
            "Moderation decision recorded"
        );

        Ok(record)
    }

    /// Moderate several items independently. Results come back in input order
    /// and one failure does not stop the rest.
    pub async fn moderate_batch(
        &self,
        submissions: &[ContentSubmission],
        actor_id: Option<&str>,
    ) -> Vec<Result<ModerationRecord, ModerationError>> {
        let mut results = Vec::with_capacity(submissions.len());
        for submission in submissions {
            let result = self.moderate(submission, actor_id).await;
            if let Err(e) = &result {
                tracing::error!(
                    content_id = %submission.content_id,
                    "Failed to moderate content: {}",
                    e
                );
            }
            results.push(result);
        }
        results
    }

    /// Latest decision for one content item.
    pub async fn latest_decision(
        &self,
        content_id: &str,
    ) -> Result<Option<ModerationRecord>, ModerationError> {
        self.store.latest_decision(content_id).await
    }

    /// Items waiting for a moderator.
    pub async fn review_queue(
        &self,
        limit: usize,
    ) -> Result<Vec<ModerationRecord>, ModerationError> {
        self.store.review_queue(limit).await
    }

    /// Counts for the admin dashboard.
    pub async fn dashboard_summary(&self) -> Result<ModerationSummary, ModerationError> {
        let counts = self.store.verdict_counts().await?;
        Ok(ModerationSummary::from_counts(&counts))
    }
}

// ============================================================================
// TESTS
// ============================================================================

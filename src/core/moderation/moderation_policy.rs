// Moderation policy - maps a risk-score vector to a verdict.
//
// This is the single place the threshold table lives. The admin dashboard,
// the author-facing notices and the batch job all call into here instead of
// carrying their own copies of the numbers.
//
// Pure and synchronous: no I/O, no shared state, safe to call from anywhere.

use super::moderation_models::{
    ContentType, ModerationDecision, ModerationVerdict, RiskCategory, RiskLevel, RiskScoreVector,
    ThresholdTier, AUTOMATED_CHECK_UNAVAILABLE,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Scores above this count as a high display risk level.
const RISK_LEVEL_HIGH: f64 = 0.7;
/// Scores above this count as a medium display risk level.
const RISK_LEVEL_MEDIUM: f64 = 0.4;

// ============================================================================
// THRESHOLD TABLE
// ============================================================================

/// Per-category thresholds for one tier. A category triggers when its score is
/// strictly greater than its threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CategoryThresholds {
    pub toxicity: f64,
    pub hate_speech: f64,
    pub violence: f64,
    pub sexual_content: f64,
}

impl CategoryThresholds {
    pub fn threshold(&self, category: RiskCategory) -> f64 {
        match category {
            RiskCategory::Toxicity => self.toxicity,
            RiskCategory::HateSpeech => self.hate_speech,
            RiskCategory::Violence => self.violence,
            RiskCategory::SexualContent => self.sexual_content,
        }
    }

    /// Categories over threshold, in canonical category order.
    fn triggered(&self, scores: &RiskScoreVector) -> Vec<RiskCategory> {
        RiskCategory::ALL
            .into_iter()
            .filter(|c| scores.score(*c) > self.threshold(*c))
            .collect()
    }
}

/// The full decision table: one row per tier.
///
/// Toxicity and sexual content get a higher bar than hate speech and violence.
/// That asymmetry is product policy; keep the numbers exactly as they are.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdTable {
    pub high: CategoryThresholds,
    pub medium: CategoryThresholds,
    pub low: CategoryThresholds,
}

impl ThresholdTable {
    pub const fn standard() -> Self {
        Self {
            high: CategoryThresholds {
                toxicity: 0.8,
                hate_speech: 0.7,
                violence: 0.7,
                sexual_content: 0.8,
            },
            medium: CategoryThresholds {
                toxicity: 0.6,
                hate_speech: 0.5,
                violence: 0.5,
                sexual_content: 0.6,
            },
            low: CategoryThresholds {
                toxicity: 0.3,
                hate_speech: 0.2,
                violence: 0.2,
                sexual_content: 0.3,
            },
        }
    }

    pub fn tier(&self, tier: ThresholdTier) -> &CategoryThresholds {
        match tier {
            ThresholdTier::High => &self.high,
            ThresholdTier::Medium => &self.medium,
            ThresholdTier::Low => &self.low,
        }
    }
}

impl Default for ThresholdTable {
    fn default() -> Self {
        Self::standard()
    }
}

// ============================================================================
// POLICY
// ============================================================================

/// Threshold table plus optional per-content-type variants.
///
/// Any divergence from the standard table has to be registered here as a
/// named override; there is no other way to get different numbers.
#[derive(Debug, Clone, Default)]
pub struct ModerationPolicy {
    default_table: ThresholdTable,
    overrides: HashMap<ContentType, ThresholdTable>,
}

impl ModerationPolicy {
    pub fn new(default_table: ThresholdTable) -> Self {
        Self {
            default_table,
            overrides: HashMap::new(),
        }
    }

    /// Register a threshold table for one content type.
    pub fn with_override(mut self, content_type: ContentType, table: ThresholdTable) -> Self {
        self.overrides.insert(content_type, table);
        self
    }

    /// Table that applies to `content_type`. Unknown or un-overridden types get the default.
    pub fn table_for(&self, content_type: Option<&ContentType>) -> &ThresholdTable {
        content_type
            .and_then(|ct| self.overrides.get(ct))
            .unwrap_or(&self.default_table)
    }

    /// Decide on a content item, stamped with the current time.
    pub fn decide(
        &self,
        scores: &RiskScoreVector,
        content_type: Option<&ContentType>,
    ) -> ModerationDecision {
        self.decide_at(scores, content_type, Utc::now())
    }

    /// Decide on a content item with an explicit evaluation time.
    ///
    /// Scores are clamped first. Tiers are checked from most to least severe
    /// and the first one with any triggering category wins; every triggering
    /// category in that tier contributes one reason, in canonical order.
    pub fn decide_at(
        &self,
        scores: &RiskScoreVector,
        content_type: Option<&ContentType>,
        evaluated_at: DateTime<Utc>,
    ) -> ModerationDecision {
        let scores = scores.clamped();
        let table = self.table_for(content_type);

        for tier in ThresholdTier::PRIORITY {
            let triggered = table.tier(tier).triggered(&scores);
            if !triggered.is_empty() {
                let reasons = triggered
                    .into_iter()
                    .map(|category| tier.reason_for(category))
                    .collect();
                return ModerationDecision::held(tier.verdict(), reasons, evaluated_at);
            }
        }

        ModerationDecision::approved(evaluated_at)
    }
}

/// Decide with the standard policy.
pub fn decide(scores: &RiskScoreVector, content_type: Option<&ContentType>) -> ModerationDecision {
    ModerationPolicy::default().decide(scores, content_type)
}

/// Fixed decision for when the classifier could not be reached.
///
/// Unscored content must neither go public unreviewed nor be taken down
/// without evidence, so it waits for review.
pub fn classifier_unavailable() -> ModerationDecision {
    classifier_unavailable_at(Utc::now())
}

pub fn classifier_unavailable_at(evaluated_at: DateTime<Utc>) -> ModerationDecision {
    ModerationDecision::held(
        ModerationVerdict::PendingReview,
        vec![AUTOMATED_CHECK_UNAVAILABLE.to_string()],
        evaluated_at,
    )
}

/// Display-only risk summary from the highest present score.
pub fn risk_level(scores: &RiskScoreVector) -> RiskLevel {
    let max = scores.max_score();
    if max > RISK_LEVEL_HIGH {
        RiskLevel::High
    } else if max > RISK_LEVEL_MEDIUM {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(t: f64, h: f64, v: f64, s: f64) -> RiskScoreVector {
        RiskScoreVector::new(t, h, v, s)
    }

    fn fixed_time() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_low_scores_are_approved() {
        let decision = decide(&scores(0.1, 0.1, 0.1, 0.1), None);
        assert_eq!(decision.verdict(), ModerationVerdict::Approved);
        assert!(decision.reasons().is_empty());
    }

    #[test]
    fn test_mild_toxicity_pending_review() {
        let decision = decide(&scores(0.35, 0.0, 0.0, 0.0), None);
        assert_eq!(decision.verdict(), ModerationVerdict::PendingReview);
        assert_eq!(decision.reasons(), ["toxicity-low"]);
    }

    #[test]
    fn test_medium_hate_speech_flagged() {
        let decision = decide(&scores(0.0, 0.55, 0.0, 0.0), None);
        assert_eq!(decision.verdict(), ModerationVerdict::Flagged);
        assert_eq!(decision.reasons(), ["hate-speech-medium"]);
    }

    #[test]
    fn test_hate_speech_over_high_bar_rejected() {
        let decision = decide(&scores(0.0, 0.75, 0.0, 0.0), None);
        assert_eq!(decision.verdict(), ModerationVerdict::Rejected);
        assert_eq!(decision.reasons(), ["hate-speech-high"]);
    }

    #[test]
    fn test_everything_high_lists_all_categories_in_order() {
        let decision = decide(&scores(0.9, 0.9, 0.9, 0.9), None);
        assert_eq!(decision.verdict(), ModerationVerdict::Rejected);
        assert_eq!(
            decision.reasons(),
            [
                "toxicity-high",
                "hate-speech-high",
                "violence-high",
                "sexual-content-high"
            ]
        );
    }

    #[test]
    fn test_asymmetric_thresholds() {
        // 0.75 rejects hate speech and violence but only flags toxicity and sexual content.
        assert_eq!(
            decide(&scores(0.75, 0.0, 0.0, 0.0), None).verdict(),
            ModerationVerdict::Flagged
        );
        assert_eq!(
            decide(&scores(0.0, 0.0, 0.75, 0.0), None).verdict(),
            ModerationVerdict::Rejected
        );
        assert_eq!(
            decide(&scores(0.0, 0.0, 0.0, 0.75), None).verdict(),
            ModerationVerdict::Flagged
        );
        // 0.25 is pending review for violence, approved for toxicity.
        assert_eq!(
            decide(&scores(0.25, 0.0, 0.0, 0.0), None).verdict(),
            ModerationVerdict::Approved
        );
        assert_eq!(
            decide(&scores(0.0, 0.0, 0.25, 0.0), None).verdict(),
            ModerationVerdict::PendingReview
        );
    }

    #[test]
    fn test_thresholds_are_strict() {
        assert_eq!(
            decide(&scores(0.8, 0.0, 0.0, 0.0), None).verdict(),
            ModerationVerdict::Flagged
        );
        assert_eq!(
            decide(&scores(0.0, 0.2, 0.0, 0.0), None).verdict(),
            ModerationVerdict::Approved
        );
    }

    #[test]
    fn test_highest_tier_wins_and_only_its_reasons_are_listed() {
        // Toxicity hits the high tier, violence only the low tier.
        let decision = decide(&scores(0.85, 0.0, 0.25, 0.0), None);
        assert_eq!(decision.verdict(), ModerationVerdict::Rejected);
        assert_eq!(decision.reasons(), ["toxicity-high"]);
    }

    #[test]
    fn test_reason_order_ignores_input_key_order() {
        let a: RiskScoreVector =
            serde_json::from_str(r#"{"hateSpeech":0.9,"toxicity":0.85}"#).unwrap();
        let b: RiskScoreVector =
            serde_json::from_str(r#"{"toxicity":0.85,"hateSpeech":0.9}"#).unwrap();

        let da = decide(&a, None);
        let db = decide(&b, None);
        assert_eq!(da.reasons(), ["toxicity-high", "hate-speech-high"]);
        assert!(da.same_outcome(&db));
    }

    #[test]
    fn test_out_of_range_scores_are_clamped() {
        let policy = ModerationPolicy::default();
        let now = fixed_time();

        assert_eq!(
            policy.decide_at(&scores(1.5, 0.0, 0.0, 0.0), None, now),
            policy.decide_at(&scores(1.0, 0.0, 0.0, 0.0), None, now)
        );
        assert_eq!(
            policy.decide_at(&scores(-0.2, 0.0, 0.0, 0.0), None, now),
            policy.decide_at(&scores(0.0, 0.0, 0.0, 0.0), None, now)
        );
    }

    #[test]
    fn test_non_finite_scores_are_clamped() {
        let decision = decide(&scores(f64::NAN, f64::INFINITY, f64::NEG_INFINITY, 0.0), None);
        // NaN -> 0, +inf -> 1, -inf -> 0
        assert_eq!(decision.verdict(), ModerationVerdict::Rejected);
        assert_eq!(decision.reasons(), ["hate-speech-high"]);
    }

    #[test]
    fn test_unknown_categories_do_not_affect_verdict() {
        let decision = decide(&scores(0.0, 0.0, 0.0, 0.0).with_extra("self_harm", 0.99), None);
        assert_eq!(decision.verdict(), ModerationVerdict::Approved);
    }

    #[test]
    fn test_decisions_are_deterministic() {
        let policy = ModerationPolicy::default();
        let input = scores(0.65, 0.3, 0.55, 0.1);
        let first = policy.decide_at(&input, None, fixed_time());
        for _ in 0..10 {
            assert_eq!(policy.decide_at(&input, None, fixed_time()), first);
        }
    }

    #[test]
    fn test_monotonic_in_every_category() {
        let steps: Vec<f64> = (0..=20).map(|i| i as f64 * 0.05).collect();
        let bases = [
            scores(0.0, 0.0, 0.0, 0.0),
            scores(0.35, 0.1, 0.25, 0.0),
            scores(0.1, 0.55, 0.0, 0.65),
        ];

        for base in &bases {
            for category in RiskCategory::ALL {
                let mut previous = ModerationVerdict::Approved;
                for step in &steps {
                    let mut input = base.clone();
                    match category {
                        RiskCategory::Toxicity => input.toxicity = *step,
                        RiskCategory::HateSpeech => input.hate_speech = *step,
                        RiskCategory::Violence => input.violence = *step,
                        RiskCategory::SexualContent => input.sexual_content = *step,
                    }
                    let verdict = decide(&input, None).verdict();
                    if *step >= base.score(category) {
                        assert!(
                            verdict >= previous,
                            "{:?} went from {:?} to {:?} at {}",
                            category,
                            previous,
                            verdict,
                            step
                        );
                        previous = verdict;
                    }
                }
            }
        }
    }

    #[test]
    fn test_fallback_decision() {
        let decision = classifier_unavailable();
        assert_eq!(decision.verdict(), ModerationVerdict::PendingReview);
        assert_eq!(decision.reasons(), [AUTOMATED_CHECK_UNAVAILABLE]);
    }

    #[test]
    fn test_unknown_content_type_uses_default_table() {
        let policy = ModerationPolicy::default();
        let other = ContentType::Other("livestream".to_string());
        let input = scores(0.0, 0.55, 0.0, 0.0);
        let now = fixed_time();

        assert_eq!(
            policy.decide_at(&input, Some(&other), now),
            policy.decide_at(&input, None, now)
        );
    }

    #[test]
    fn test_content_type_override() {
        let mut strict = ThresholdTable::standard();
        strict.high.toxicity = 0.5;
        let policy = ModerationPolicy::default().with_override(ContentType::Profile, strict);
        let input = scores(0.55, 0.0, 0.0, 0.0);

        assert_eq!(
            policy.decide(&input, Some(&ContentType::Profile)).verdict(),
            ModerationVerdict::Rejected
        );
        assert_eq!(
            policy.decide(&input, Some(&ContentType::Post)).verdict(),
            ModerationVerdict::PendingReview
        );
    }

    #[test]
    fn test_risk_level_buckets() {
        assert_eq!(risk_level(&scores(0.1, 0.2, 0.0, 0.4)), RiskLevel::Low);
        assert_eq!(risk_level(&scores(0.41, 0.0, 0.0, 0.0)), RiskLevel::Medium);
        assert_eq!(risk_level(&scores(0.0, 0.0, 0.71, 0.0)), RiskLevel::High);
        assert_eq!(risk_level(&scores(0.0, 0.0, 0.0, 0.0).with_extra("spam", 0.9)), RiskLevel::High);
    }

    #[test]
    fn test_risk_level_independent_of_verdict() {
        // Toxicity 0.75 is "high" for display but only flagged by the table.
        let input = scores(0.75, 0.0, 0.0, 0.0);
        assert_eq!(risk_level(&input), RiskLevel::High);
        assert_eq!(decide(&input, None).verdict(), ModerationVerdict::Flagged);
    }
}

// Moderation domain models - data structures for the content moderation pipeline.
//
// These are pure domain types with no I/O. The classifier adapters in infra
// build a `RiskScoreVector`, the policy turns it into a `ModerationDecision`,
// and whoever owns the content row persists it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::convert::Infallible;
use std::str::FromStr;

/// Reason used when no risk scores could be obtained for a content item.
pub const AUTOMATED_CHECK_UNAVAILABLE: &str = "automated-check-unavailable";

// ============================================================================
// RISK CATEGORIES & SCORES
// ============================================================================

/// The risk categories the decision table knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RiskCategory {
    Toxicity,
    HateSpeech,
    Violence,
    SexualContent,
}

impl RiskCategory {
    /// Canonical category order. Reasons are always emitted in this order.
    pub const ALL: [RiskCategory; 4] = [
        RiskCategory::Toxicity,
        RiskCategory::HateSpeech,
        RiskCategory::Violence,
        RiskCategory::SexualContent,
    ];

    /// Kebab-case tag used as the prefix of reason strings.
    pub fn tag(&self) -> &'static str {
        match self {
            RiskCategory::Toxicity => "toxicity",
            RiskCategory::HateSpeech => "hate-speech",
            RiskCategory::Violence => "violence",
            RiskCategory::SexualContent => "sexual-content",
        }
    }

    /// Human-readable label for notices and dashboards.
    pub fn label(&self) -> &'static str {
        match self {
            RiskCategory::Toxicity => "Toxicity",
            RiskCategory::HateSpeech => "Hate speech",
            RiskCategory::Violence => "Violence",
            RiskCategory::SexualContent => "Sexual content",
        }
    }

    /// Map an upstream field name onto a known category.
    ///
    /// Accepts snake_case, camelCase and kebab-case spellings
    /// (`hate_speech`, `hateSpeech`, `hate-speech`).
    pub fn from_field_name(name: &str) -> Option<RiskCategory> {
        let normalized: String = name
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "toxicity" => Some(RiskCategory::Toxicity),
            "hatespeech" => Some(RiskCategory::HateSpeech),
            "violence" => Some(RiskCategory::Violence),
            "sexualcontent" => Some(RiskCategory::SexualContent),
            _ => None,
        }
    }
}

impl std::fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// Clamp a raw classifier score into [0, 1].
///
/// NaN counts as "no signal" (0). Infinities go to the nearest bound.
pub fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}

/// Per-category scores produced by an external classifier.
///
/// Unknown categories are kept in `extra` so they survive a round trip and
/// count towards `max_score`, but the decision table never looks at them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    rename_all = "camelCase",
    from = "BTreeMap<String, serde_json::Value>"
)]
pub struct RiskScoreVector {
    pub toxicity: f64,
    pub hate_speech: f64,
    pub violence: f64,
    pub sexual_content: f64,
    #[serde(flatten)]
    pub extra: BTreeMap<String, f64>,
}

impl RiskScoreVector {
    pub fn new(toxicity: f64, hate_speech: f64, violence: f64, sexual_content: f64) -> Self {
        Self {
            toxicity,
            hate_speech,
            violence,
            sexual_content,
            extra: BTreeMap::new(),
        }
    }

    /// Attach an additional named category score.
    pub fn with_extra(mut self, name: impl Into<String>, score: f64) -> Self {
        self.extra.insert(name.into(), score);
        self
    }

    pub fn score(&self, category: RiskCategory) -> f64 {
        match category {
            RiskCategory::Toxicity => self.toxicity,
            RiskCategory::HateSpeech => self.hate_speech,
            RiskCategory::Violence => self.violence,
            RiskCategory::SexualContent => self.sexual_content,
        }
    }

    fn set_score(&mut self, category: RiskCategory, value: f64) {
        match category {
            RiskCategory::Toxicity => self.toxicity = value,
            RiskCategory::HateSpeech => self.hate_speech = value,
            RiskCategory::Violence => self.violence = value,
            RiskCategory::SexualContent => self.sexual_content = value,
        }
    }

    /// Copy of this vector with every score forced into [0, 1].
    pub fn clamped(&self) -> Self {
        Self {
            toxicity: clamp_score(self.toxicity),
            hate_speech: clamp_score(self.hate_speech),
            violence: clamp_score(self.violence),
            sexual_content: clamp_score(self.sexual_content),
            extra: self
                .extra
                .iter()
                .map(|(name, score)| (name.clone(), clamp_score(*score)))
                .collect(),
        }
    }

    /// Highest clamped score across all present categories, extras included.
    pub fn max_score(&self) -> f64 {
        let clamped = self.clamped();
        RiskCategory::ALL
            .iter()
            .map(|c| clamped.score(*c))
            .chain(clamped.extra.values().copied())
            .fold(0.0, f64::max)
    }
}

impl From<BTreeMap<String, serde_json::Value>> for RiskScoreVector {
    fn from(raw: BTreeMap<String, serde_json::Value>) -> Self {
        let mut scores = RiskScoreVector::default();
        let mut seen = BTreeSet::new();
        for (name, value) in raw {
            // Non-numeric fields (e.g. a `flagged: true`) are not scores.
            let Some(score) = value.as_f64() else {
                continue;
            };
            match RiskCategory::from_field_name(&name) {
                // Same category under two spellings: keep the riskier score.
                Some(category) if !seen.insert(category) => {
                    let current = scores.score(category);
                    scores.set_score(category, clamp_score(current).max(clamp_score(score)));
                }
                Some(category) => scores.set_score(category, score),
                None => {
                    scores.extra.insert(name, score);
                }
            }
        }
        scores
    }
}

// ============================================================================
// CONTENT TYPES
// ============================================================================

/// What kind of content is being moderated.
///
/// Reserved for per-type threshold overrides. Unknown tags parse to `Other`
/// and get the default table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ContentType {
    Post,
    Comment,
    Document,
    Profile,
    Other(String),
}

impl ContentType {
    pub fn as_str(&self) -> &str {
        match self {
            ContentType::Post => "post",
            ContentType::Comment => "comment",
            ContentType::Document => "document",
            ContentType::Profile => "profile",
            ContentType::Other(tag) => tag,
        }
    }
}

impl FromStr for ContentType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "post" => ContentType::Post,
            "comment" => ContentType::Comment,
            "document" => ContentType::Document,
            "profile" => ContentType::Profile,
            _ => ContentType::Other(s.to_string()),
        })
    }
}

impl From<String> for ContentType {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(content_type) => content_type,
            Err(never) => match never {},
        }
    }
}

impl From<ContentType> for String {
    fn from(content_type: ContentType) -> Self {
        content_type.as_str().to_string()
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// VERDICTS & DECISIONS
// ============================================================================

/// Outcome of a moderation check.
///
/// Variant order is the severity order: `Approved < PendingReview < Flagged < Rejected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationVerdict {
    /// Content may be published immediately
    Approved,
    /// Low risk but not auto-approved; queued for an optional human look
    PendingReview,
    /// Held back from default visibility pending human review
    Flagged,
    /// Must not be published; the author is told it was removed
    Rejected,
}

impl ModerationVerdict {
    pub const ALL: [ModerationVerdict; 4] = [
        ModerationVerdict::Approved,
        ModerationVerdict::PendingReview,
        ModerationVerdict::Flagged,
        ModerationVerdict::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationVerdict::Approved => "approved",
            ModerationVerdict::PendingReview => "pending_review",
            ModerationVerdict::Flagged => "flagged",
            ModerationVerdict::Rejected => "rejected",
        }
    }

    /// Whether a human should look at content with this verdict.
    pub fn needs_review(&self) -> bool {
        matches!(
            self,
            ModerationVerdict::PendingReview | ModerationVerdict::Flagged
        )
    }
}

impl std::fmt::Display for ModerationVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModerationVerdict::Approved => write!(f, "Approved"),
            ModerationVerdict::PendingReview => write!(f, "Pending Review"),
            ModerationVerdict::Flagged => write!(f, "Flagged"),
            ModerationVerdict::Rejected => write!(f, "Rejected"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown moderation tag: {0}")]
pub struct UnknownTag(pub String);

impl FromStr for ModerationVerdict {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModerationVerdict::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| UnknownTag(s.to_string()))
    }
}

/// Rows of the decision table, highest severity first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThresholdTier {
    High,
    Medium,
    Low,
}

impl ThresholdTier {
    /// Evaluation order: first tier that triggers wins.
    pub const PRIORITY: [ThresholdTier; 3] =
        [ThresholdTier::High, ThresholdTier::Medium, ThresholdTier::Low];

    pub fn tag(&self) -> &'static str {
        match self {
            ThresholdTier::High => "high",
            ThresholdTier::Medium => "medium",
            ThresholdTier::Low => "low",
        }
    }

    pub fn verdict(&self) -> ModerationVerdict {
        match self {
            ThresholdTier::High => ModerationVerdict::Rejected,
            ThresholdTier::Medium => ModerationVerdict::Flagged,
            ThresholdTier::Low => ModerationVerdict::PendingReview,
        }
    }

    /// Reason string for a category that crossed this tier, e.g. `hate-speech-high`.
    pub fn reason_for(&self, category: RiskCategory) -> String {
        format!("{}-{}", category.tag(), self.tag())
    }
}

/// Result of one moderation check.
///
/// Immutable once built. `reasons` is empty exactly when the verdict is
/// `Approved`; the constructors are the only way in so that holds.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationDecision {
    verdict: ModerationVerdict,
    reasons: Vec<String>,
    evaluated_at: DateTime<Utc>,
}

impl ModerationDecision {
    pub(crate) fn approved(evaluated_at: DateTime<Utc>) -> Self {
        Self {
            verdict: ModerationVerdict::Approved,
            reasons: Vec::new(),
            evaluated_at,
        }
    }

    /// Non-approved decision. Callers must pass at least one reason.
    pub(crate) fn held(
        verdict: ModerationVerdict,
        reasons: Vec<String>,
        evaluated_at: DateTime<Utc>,
    ) -> Self {
        debug_assert!(verdict != ModerationVerdict::Approved);
        debug_assert!(!reasons.is_empty());
        Self {
            verdict,
            reasons,
            evaluated_at,
        }
    }

    /// Rebuild a decision loaded from storage.
    ///
    /// Returns `None` if the stored row breaks the reasons/verdict invariant.
    pub(crate) fn restore(
        verdict: ModerationVerdict,
        reasons: Vec<String>,
        evaluated_at: DateTime<Utc>,
    ) -> Option<Self> {
        if reasons.is_empty() != (verdict == ModerationVerdict::Approved) {
            return None;
        }
        Some(Self {
            verdict,
            reasons,
            evaluated_at,
        })
    }

    pub fn verdict(&self) -> ModerationVerdict {
        self.verdict
    }

    pub fn reasons(&self) -> &[String] {
        &self.reasons
    }

    pub fn evaluated_at(&self) -> DateTime<Utc> {
        self.evaluated_at
    }

    /// Same verdict and reasons, ignoring when the decision was made.
    pub fn same_outcome(&self, other: &ModerationDecision) -> bool {
        self.verdict == other.verdict && self.reasons == other.reasons
    }
}

/// Coarse risk summary for display. Never used to pick a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl FromStr for RiskLevel {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            other => Err(UnknownTag(other.to_string())),
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "Low"),
            RiskLevel::Medium => write!(f, "Medium"),
            RiskLevel::High => write!(f, "High"),
        }
    }
}

// ============================================================================
// CALLER-SIDE RECORDS
// ============================================================================

/// A content item submitted for moderation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentSubmission {
    pub content_id: String,
    #[serde(default = "default_content_type")]
    pub content_type: ContentType,
    #[serde(default)]
    pub author_id: Option<String>,
    pub body: String,
}

fn default_content_type() -> ContentType {
    ContentType::Post
}

/// What gets persisted alongside the content row.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationRecord {
    pub content_id: String,
    pub content_type: ContentType,
    /// Who triggered the check (for audit)
    pub actor_id: Option<String>,
    pub decision: ModerationDecision,
    /// Absent when no scores were available
    pub risk_level: Option<RiskLevel>,
}

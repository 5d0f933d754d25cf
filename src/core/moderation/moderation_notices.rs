// Author-facing notices for moderation outcomes.
//
// The messaging layer shows these to authors whose content was held back or
// removed. Reason tags come straight from `ModerationDecision::reasons`.

use super::moderation_models::{
    ModerationDecision, ModerationVerdict, RiskCategory, ThresholdTier,
    AUTOMATED_CHECK_UNAVAILABLE,
};
use serde::Serialize;

/// Message to send to an author about their content.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorNotice {
    pub verdict: ModerationVerdict,
    pub title: String,
    pub body: String,
}

/// Turn a reason tag into readable text.
///
/// `hate-speech-high` becomes "Hate speech (high risk)". Tags we don't
/// recognise are returned as-is.
pub fn describe_reason(reason: &str) -> String {
    if reason == AUTOMATED_CHECK_UNAVAILABLE {
        return "Automated check unavailable".to_string();
    }

    for category in RiskCategory::ALL {
        for tier in ThresholdTier::PRIORITY {
            if tier.reason_for(category) == reason {
                return format!("{} ({} risk)", category.label(), tier.tag());
            }
        }
    }

    reason.to_string()
}

/// Build a notice for the author, if the outcome warrants one.
///
/// Only `Rejected` and `Flagged` outcomes notify the author.
pub fn author_notice(decision: &ModerationDecision) -> Option<AuthorNotice> {
    let (title, intro) = match decision.verdict() {
        ModerationVerdict::Rejected => (
            "Your content was removed",
            "Your content was removed because it did not meet our community guidelines.",
        ),
        ModerationVerdict::Flagged => (
            "Your content is under review",
            "Your content is hidden while a moderator reviews it.",
        ),
        ModerationVerdict::Approved | ModerationVerdict::PendingReview => return None,
    };

    let details: Vec<String> = decision
        .reasons()
        .iter()
        .map(|r| format!("- {}", describe_reason(r)))
        .collect();

    let body = if details.is_empty() {
        intro.to_string()
    } else {
        format!("{}\n\nReasons:\n{}", intro, details.join("\n"))
    };

    Some(AuthorNotice {
        verdict: decision.verdict(),
        title: title.to_string(),
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::moderation::{classifier_unavailable, decide, RiskScoreVector};

    #[test]
    fn test_describe_known_reason() {
        assert_eq!(describe_reason("hate-speech-high"), "Hate speech (high risk)");
        assert_eq!(describe_reason("toxicity-low"), "Toxicity (low risk)");
        assert_eq!(
            describe_reason("sexual-content-medium"),
            "Sexual content (medium risk)"
        );
    }

    #[test]
    fn test_describe_unknown_reason_verbatim() {
        assert_eq!(describe_reason("spam-wave"), "spam-wave");
    }

    #[test]
    fn test_no_notice_for_approved_or_pending() {
        let approved = decide(&RiskScoreVector::default(), None);
        assert!(author_notice(&approved).is_none());
        assert!(author_notice(&classifier_unavailable()).is_none());
    }

    #[test]
    fn test_rejected_notice_lists_reasons() {
        let decision = decide(&RiskScoreVector::new(0.9, 0.0, 0.8, 0.0), None);
        let notice = author_notice(&decision).unwrap();

        assert_eq!(notice.verdict, ModerationVerdict::Rejected);
        assert_eq!(notice.title, "Your content was removed");
        assert!(notice.body.contains("- Toxicity (high risk)\n- Violence (high risk)"));
    }

    #[test]
    fn test_flagged_notice() {
        let decision = decide(&RiskScoreVector::new(0.0, 0.6, 0.0, 0.0), None);
        let notice = author_notice(&decision).unwrap();
        assert_eq!(notice.verdict, ModerationVerdict::Flagged);
        assert!(notice.body.contains("Hate speech (medium risk)"));
    }
}

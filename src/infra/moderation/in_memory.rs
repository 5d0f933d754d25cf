// In-memory implementation of DecisionStore.
//
// Handy for tests and for running the batch job without a database. Data is
// lost when the process exits.

use crate::core::moderation::{DecisionStore, ModerationError, ModerationRecord, ModerationVerdict};
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// A saved record plus the order it was written in.
#[derive(Clone, Debug)]
struct StoredRecord {
    sequence: u64,
    record: ModerationRecord,
}

/// Keeps every decision per content id. DashMap lets concurrent moderation
/// calls write without a global lock.
pub struct InMemoryDecisionStore {
    /// Maps content_id -> decisions, oldest first
    data: DashMap<String, Vec<StoredRecord>>,
    next_sequence: AtomicU64,
}

impl InMemoryDecisionStore {
    pub fn new() -> Self {
        Self {
            data: DashMap::new(),
            next_sequence: AtomicU64::new(0),
        }
    }

    fn latest_records(&self) -> Vec<StoredRecord> {
        self.data
            .iter()
            .filter_map(|entry| entry.value().last().cloned())
            .collect()
    }
}

impl Default for InMemoryDecisionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DecisionStore for InMemoryDecisionStore {
    async fn save_decision(&self, record: &ModerationRecord) -> Result<(), ModerationError> {
        let sequence = self.next_sequence.fetch_add(1, Ordering::SeqCst);
        self.data
            .entry(record.content_id.clone())
            .or_default()
            .push(StoredRecord {
                sequence,
                record: record.clone(),
            });
        Ok(())
    }

    async fn latest_decision(
        &self,
        content_id: &str,
    ) -> Result<Option<ModerationRecord>, ModerationError> {
        Ok(self
            .data
            .get(content_id)
            .and_then(|records| records.last().map(|s| s.record.clone())))
    }

    async fn review_queue(&self, limit: usize) -> Result<Vec<ModerationRecord>, ModerationError> {
        let mut pending: Vec<StoredRecord> = self
            .latest_records()
            .into_iter()
            .filter(|s| s.record.decision.verdict().needs_review())
            .collect();

        // Newest first
        pending.sort_by(|a, b| b.sequence.cmp(&a.sequence));

        Ok(pending
            .into_iter()
            .take(limit)
            .map(|s| s.record)
            .collect())
    }

    async fn verdict_counts(&self) -> Result<HashMap<ModerationVerdict, u64>, ModerationError> {
        let mut counts = HashMap::new();
        for stored in self.latest_records() {
            *counts.entry(stored.record.decision.verdict()).or_insert(0) += 1;
        }
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::moderation::{decide, ContentType, RiskScoreVector};

    fn record(content_id: &str, scores: RiskScoreVector) -> ModerationRecord {
        ModerationRecord {
            content_id: content_id.to_string(),
            content_type: ContentType::Post,
            actor_id: None,
            decision: decide(&scores, None),
            risk_level: None,
        }
    }

    #[tokio::test]
    async fn test_latest_decision_wins() {
        let store = InMemoryDecisionStore::new();
        store
            .save_decision(&record("p", RiskScoreVector::new(0.0, 0.6, 0.0, 0.0)))
            .await
            .unwrap();
        store
            .save_decision(&record("p", RiskScoreVector::default()))
            .await
            .unwrap();

        let latest = store.latest_decision("p").await.unwrap().unwrap();
        assert_eq!(latest.decision.verdict(), ModerationVerdict::Approved);
        assert!(store.review_queue(5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_review_queue_newest_first() {
        let store = InMemoryDecisionStore::new();
        for (id, tox) in [("first", 0.35), ("second", 0.65), ("third", 0.4)] {
            store
                .save_decision(&record(id, RiskScoreVector::new(tox, 0.0, 0.0, 0.0)))
                .await
                .unwrap();
        }

        let queue = store.review_queue(2).await.unwrap();
        let ids: Vec<_> = queue.iter().map(|r| r.content_id.as_str()).collect();
        assert_eq!(ids, ["third", "second"]);

        let counts = store.verdict_counts().await.unwrap();
        assert_eq!(counts.get(&ModerationVerdict::PendingReview), Some(&2));
        assert_eq!(counts.get(&ModerationVerdict::Flagged), Some(&1));
    }
}

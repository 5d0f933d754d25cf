// SQLite-backed decision store.
//
// Tables:
// - moderation_decisions: one row per moderation check, append-only.
//   The latest row per content_id is the current decision.

use crate::core::moderation::{
    ContentType, DecisionStore, ModerationDecision, ModerationError, ModerationRecord,
    ModerationVerdict, RiskLevel,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use std::collections::HashMap;
use std::path::Path;

fn storage_err(e: impl std::fmt::Display) -> ModerationError {
    ModerationError::Storage(e.to_string())
}

pub struct SqliteDecisionStore {
    pool: Pool<Sqlite>,
}

impl SqliteDecisionStore {
    /// Open (creating if needed) a database file and run migrations.
    pub async fn new(database_url: &str) -> Result<Self, ModerationError> {
        // Ensure the file exists if it's a file path
        let path_str = database_url.trim_start_matches("sqlite://");
        if !database_url.contains(":memory:") && !Path::new(path_str).exists() {
            if let Some(parent) = Path::new(path_str).parent() {
                std::fs::create_dir_all(parent).map_err(storage_err)?;
            }
            std::fs::File::create(path_str).map_err(storage_err)?;
        }

        let conn_str = if database_url.starts_with("sqlite:") {
            database_url.to_string()
        } else {
            format!("sqlite://{}", database_url)
        };

        let pool = SqlitePoolOptions::new()
            .connect(&conn_str)
            .await
            .map_err(storage_err)?;

        let store = Self::from_pool(pool);
        store.migrate().await?;
        Ok(store)
    }

    pub fn from_pool(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Run database migrations to create required tables.
    pub async fn migrate(&self) -> Result<(), ModerationError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS moderation_decisions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                content_id TEXT NOT NULL,
                content_type TEXT NOT NULL,
                actor_id TEXT,
                verdict TEXT NOT NULL,
                reasons TEXT NOT NULL DEFAULT '[]',
                risk_level TEXT,
                evaluated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_moderation_decisions_content
                ON moderation_decisions(content_id, id);
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(())
    }

    fn record_from_row(row: &SqliteRow) -> Result<ModerationRecord, ModerationError> {
        let content_id: String = row.get("content_id");
        let content_type: String = row.get("content_type");
        let actor_id: Option<String> = row.get("actor_id");
        let verdict_str: String = row.get("verdict");
        let reasons_json: String = row.get("reasons");
        let risk_level_str: Option<String> = row.get("risk_level");
        let evaluated_at_str: String = row.get("evaluated_at");

        let verdict: ModerationVerdict = verdict_str.parse().map_err(storage_err)?;
        let reasons: Vec<String> = serde_json::from_str(&reasons_json).map_err(storage_err)?;
        let risk_level = risk_level_str
            .map(|s| s.parse::<RiskLevel>())
            .transpose()
            .map_err(storage_err)?;
        let evaluated_at = DateTime::parse_from_rfc3339(&evaluated_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(storage_err)?;

        let decision = ModerationDecision::restore(verdict, reasons, evaluated_at).ok_or_else(|| {
            ModerationError::Storage(format!(
                "stored decision for {} has reasons inconsistent with verdict {}",
                content_id,
                verdict.as_str()
            ))
        })?;

        Ok(ModerationRecord {
            content_id,
            content_type: ContentType::from(content_type),
            actor_id,
            decision,
            risk_level,
        })
    }
}

#[async_trait]
impl DecisionStore for SqliteDecisionStore {
    async fn save_decision(&self, record: &ModerationRecord) -> Result<(), ModerationError> {
        let reasons = serde_json::to_string(record.decision.reasons()).map_err(storage_err)?;

        sqlx::query(
            r#"
            INSERT INTO moderation_decisions
                (content_id, content_type, actor_id, verdict, reasons, risk_level, evaluated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.content_id)
        .bind(record.content_type.as_str())
        .bind(record.actor_id.as_deref())
        .bind(record.decision.verdict().as_str())
        .bind(reasons)
        .bind(record.risk_level.map(|r| r.as_str()))
        .bind(record.decision.evaluated_at().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;
        Ok(())
    }

    async fn latest_decision(
        &self,
        content_id: &str,
    ) -> Result<Option<ModerationRecord>, ModerationError> {
        let row = sqlx::query(
            r#"
            SELECT content_id, content_type, actor_id, verdict, reasons, risk_level, evaluated_at
            FROM moderation_decisions
            WHERE content_id = ?
            ORDER BY id DESC
            LIMIT 1
            "#,
        )
        .bind(content_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_err)?;

        row.as_ref().map(Self::record_from_row).transpose()
    }

    async fn review_queue(&self, limit: usize) -> Result<Vec<ModerationRecord>, ModerationError> {
        let rows = sqlx::query(
            r#"
            SELECT d.content_id, d.content_type, d.actor_id, d.verdict, d.reasons,
                   d.risk_level, d.evaluated_at
            FROM moderation_decisions d
            JOIN (
                SELECT content_id, MAX(id) AS max_id
                FROM moderation_decisions
                GROUP BY content_id
            ) latest ON d.id = latest.max_id
            WHERE d.verdict IN ('pending_review', 'flagged')
            ORDER BY d.id DESC
            LIMIT ?
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;

        rows.iter().map(Self::record_from_row).collect()
    }

    async fn verdict_counts(&self) -> Result<HashMap<ModerationVerdict, u64>, ModerationError> {
        let rows = sqlx::query(
            r#"
            SELECT d.verdict AS verdict, COUNT(*) AS total
            FROM moderation_decisions d
            JOIN (
                SELECT content_id, MAX(id) AS max_id
                FROM moderation_decisions
                GROUP BY content_id
            ) latest ON d.id = latest.max_id
            GROUP BY d.verdict
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;

        let mut counts = HashMap::new();
        for row in rows {
            let verdict_str: String = row.get("verdict");
            let total: i64 = row.get("total");
            let verdict: ModerationVerdict = verdict_str.parse().map_err(storage_err)?;
            counts.insert(verdict, total as u64);
        }
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::moderation::{classifier_unavailable, ModerationPolicy, RiskScoreVector};

    async fn open_store(dir: &tempfile::TempDir) -> SqliteDecisionStore {
        let path = dir.path().join("moderation.db");
        SqliteDecisionStore::new(path.to_str().unwrap()).await.unwrap()
    }

    fn record(content_id: &str, scores: RiskScoreVector) -> ModerationRecord {
        ModerationRecord {
            content_id: content_id.to_string(),
            content_type: ContentType::Comment,
            actor_id: Some("admin-1".to_string()),
            decision: ModerationPolicy::default().decide(&scores, None),
            risk_level: Some(crate::core::moderation::risk_level(&scores)),
        }
    }

    #[tokio::test]
    async fn test_save_and_load_latest() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir).await;

        store
            .save_decision(&record("c1", RiskScoreVector::new(0.0, 0.0, 0.0, 0.0)))
            .await
            .unwrap();
        store
            .save_decision(&record("c1", RiskScoreVector::new(0.9, 0.75, 0.0, 0.0)))
            .await
            .unwrap();

        let latest = store.latest_decision("c1").await.unwrap().unwrap();
        assert_eq!(latest.decision.verdict(), ModerationVerdict::Rejected);
        assert_eq!(latest.decision.reasons(), ["toxicity-high", "hate-speech-high"]);
        assert_eq!(latest.content_type, ContentType::Comment);
        assert_eq!(latest.actor_id.as_deref(), Some("admin-1"));
        assert_eq!(latest.risk_level, Some(RiskLevel::High));

        assert!(store.latest_decision("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fallback_decision_persists_without_risk_level() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir).await;

        let fallback = ModerationRecord {
            content_id: "d1".to_string(),
            content_type: ContentType::Document,
            actor_id: None,
            decision: classifier_unavailable(),
            risk_level: None,
        };
        store.save_decision(&fallback).await.unwrap();

        let loaded = store.latest_decision("d1").await.unwrap().unwrap();
        assert!(loaded.decision.same_outcome(&fallback.decision));
        assert_eq!(loaded.risk_level, None);
        assert_eq!(loaded.actor_id, None);
    }

    #[tokio::test]
    async fn test_review_queue_uses_latest_decision_only() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir).await;

        // flagged, then re-checked and approved -> not in queue
        store
            .save_decision(&record("a", RiskScoreVector::new(0.0, 0.6, 0.0, 0.0)))
            .await
            .unwrap();
        store
            .save_decision(&record("a", RiskScoreVector::default()))
            .await
            .unwrap();
        store
            .save_decision(&record("b", RiskScoreVector::new(0.35, 0.0, 0.0, 0.0)))
            .await
            .unwrap();
        store
            .save_decision(&record("c", RiskScoreVector::new(0.0, 0.0, 0.6, 0.0)))
            .await
            .unwrap();
        store
            .save_decision(&record("d", RiskScoreVector::new(0.95, 0.0, 0.0, 0.0)))
            .await
            .unwrap();

        let queue = store.review_queue(10).await.unwrap();
        let ids: Vec<_> = queue.iter().map(|r| r.content_id.as_str()).collect();
        assert_eq!(ids, ["c", "b"]);

        let limited = store.review_queue(1).await.unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].content_id, "c");

        let counts = store.verdict_counts().await.unwrap();
        assert_eq!(counts.get(&ModerationVerdict::Approved), Some(&1));
        assert_eq!(counts.get(&ModerationVerdict::PendingReview), Some(&1));
        assert_eq!(counts.get(&ModerationVerdict::Flagged), Some(&1));
        assert_eq!(counts.get(&ModerationVerdict::Rejected), Some(&1));
    }

    #[tokio::test]
    async fn test_reopen_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = open_store(&dir).await;
            store
                .save_decision(&record("p1", RiskScoreVector::new(0.0, 0.0, 0.3, 0.0)))
                .await
                .unwrap();
        }

        let store = open_store(&dir).await;
        let loaded = store.latest_decision("p1").await.unwrap().unwrap();
        assert_eq!(loaded.decision.verdict(), ModerationVerdict::PendingReview);
        assert_eq!(loaded.decision.reasons(), ["violence-low"]);
    }
}

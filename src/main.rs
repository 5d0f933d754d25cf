// Entry point for the moderation batch job.
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Read content submissions (one JSON object per line) from stdin
// 4. Write one JSON result per submission to stdout

use haus_moderation::config::AppConfig;
use haus_moderation::core::ai::AiConfig;
use haus_moderation::core::moderation::{
    author_notice, AuthorNotice, ContentSubmission, ModerationRecord, ModerationService,
    ModerationSummary, RiskClassifier,
};
use haus_moderation::infra::ai::OpenRouterClient;
use haus_moderation::infra::moderation::{
    AiRiskClassifier, HttpRiskClassifier, OfflineClassifier, SqliteDecisionStore,
};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// One line of output for a successfully moderated submission.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ModeratedLine<'a> {
    record: &'a ModerationRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    notice: Option<AuthorNotice>,
}

/// One line of output for a submission we could not process.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FailedLine {
    line: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    content_id: Option<String>,
    error: String,
}

/// Pick a classifier: dedicated API first, then the AI model, else offline.
fn build_classifier(config: &AppConfig) -> anyhow::Result<Box<dyn RiskClassifier>> {
    if let Some(url) = &config.moderation_api_url {
        tracing::info!(url = %url, "Using HTTP moderation classifier");
        let classifier = HttpRiskClassifier::new(
            url.clone(),
            config.moderation_api_key.clone(),
            config.moderation_timeout,
        )?;
        return Ok(Box::new(classifier));
    }

    if let Some(api_key) = &config.openrouter_api_key {
        tracing::info!(model = %config.openrouter_model, "Using AI moderation classifier");
        let ai_config = AiConfig {
            model: config.openrouter_model.clone(),
            temperature: 0.0,
            max_tokens: Some(200),
            top_p: None,
        };
        let client = OpenRouterClient::new(api_key.clone());
        return Ok(Box::new(AiRiskClassifier::new(client, ai_config)));
    }

    tracing::warn!("No classifier configured; every submission will be held for review");
    Ok(Box::new(OfflineClassifier))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays clean JSON lines
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let config = AppConfig::from_env()?;
    std::fs::create_dir_all(&config.data_dir)?;

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================

    let classifier = build_classifier(&config)?;
    let store = SqliteDecisionStore::new(&config.database_url).await?;
    let service = ModerationService::new(classifier, store);
    let actor_id = config.actor_id.as_deref();

    // ========================================================================
    // BATCH LOOP
    // ========================================================================

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let mut line_number = 0usize;
    let mut run = ModerationSummary::default();
    let mut failed = 0usize;

    while let Some(line) = lines.next_line().await? {
        line_number += 1;
        if line.trim().is_empty() {
            continue;
        }

        let output = match serde_json::from_str::<ContentSubmission>(&line) {
            Ok(submission) => match service.moderate(&submission, actor_id).await {
                Ok(record) => {
                    run.record(record.decision.verdict());
                    serde_json::to_string(&ModeratedLine {
                        notice: author_notice(&record.decision),
                        record: &record,
                    })?
                }
                Err(e) => {
                    failed += 1;
                    tracing::error!(content_id = %submission.content_id, "Moderation failed: {}", e);
                    serde_json::to_string(&FailedLine {
                        line: line_number,
                        content_id: Some(submission.content_id.clone()),
                        error: e.to_string(),
                    })?
                }
            },
            Err(e) => {
                failed += 1;
                tracing::warn!(line = line_number, "Skipping malformed submission: {}", e);
                serde_json::to_string(&FailedLine {
                    line: line_number,
                    content_id: None,
                    error: format!("malformed submission: {}", e),
                })?
            }
        };

        stdout.write_all(output.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
    }
    stdout.flush().await?;

    tracing::info!(
        approved = run.approved,
        pending_review = run.pending_review,
        flagged = run.flagged,
        rejected = run.rejected,
        failed,
        "Moderation batch finished"
    );

    let totals = service.dashboard_summary().await?;
    tracing::info!(
        total = totals.total(),
        needs_review = totals.needs_review(),
        "Decision store totals"
    );

    Ok(())
}

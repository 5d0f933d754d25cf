// Runtime configuration.
//
// Everything the composition root needs is read once into `AppConfig` and
// passed into constructors. Nothing else in the crate reads the environment.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_OPENROUTER_MODEL: &str = "deepseek/deepseek-chat-v3.1:free";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Folder for runtime databases
    pub data_dir: PathBuf,
    /// SQLite database holding moderation decisions
    pub database_url: String,
    /// Moderation-scoring endpoint; when unset the AI classifier is used
    pub moderation_api_url: Option<String>,
    pub moderation_api_key: Option<String>,
    pub moderation_timeout: Duration,
    pub openrouter_api_key: Option<String>,
    pub openrouter_model: String,
    /// Recorded as the actor for decisions made by this process
    pub actor_id: Option<String>,
}

impl AppConfig {
    /// Load `.env` (if present) and read configuration from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let data_dir = PathBuf::from(get("HAUS_DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.to_string()));
        let database_url = get("HAUS_DATABASE_URL").unwrap_or_else(|| {
            data_dir.join("moderation.db").to_string_lossy().into_owned()
        });

        let moderation_timeout = match get("MODERATION_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = raw.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
                    key: "MODERATION_TIMEOUT_SECS",
                    value: raw.clone(),
                    reason: e.to_string(),
                })?;
                if secs == 0 {
                    return Err(ConfigError::Invalid {
                        key: "MODERATION_TIMEOUT_SECS",
                        value: raw,
                        reason: "must be at least 1".to_string(),
                    });
                }
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self {
            data_dir,
            database_url,
            moderation_api_url: get("MODERATION_API_URL"),
            moderation_api_key: get("MODERATION_API_KEY"),
            moderation_timeout,
            openrouter_api_key: get("OPENROUTER_API_KEY"),
            openrouter_model: get("OPENROUTER_MODEL")
                .unwrap_or_else(|| DEFAULT_OPENROUTER_MODEL.to_string()),
            actor_id: get("HAUS_ACTOR_ID"),
        })
    }
}

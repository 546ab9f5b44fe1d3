//! Figment-based configuration loader.
//!
//! Layering, lowest priority first: built-in defaults, a TOML file
//! (`embedflow.toml` or an explicit path), `EMBEDFLOW_*` environment
//! overrides (`EMBEDFLOW_SCHEDULER__TICK_INTERVAL_SECS=30`), and the
//! platform's legacy environment names (`EMBEDDING_PROGRESS_TABLE`,
//! `SCHEDULED_TASKS_TABLE`, ...) which map onto their config keys.

use std::path::{Path, PathBuf};

use embedflow_domain::error::{Error, Result};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use tracing::info;

use crate::config::data::AppConfig;
use crate::config::validation::validate_config;

/// Legacy environment names and the config keys they override.
const LEGACY_ENV_KEYS: &[(&str, &str)] = &[
    ("EMBEDDING_PROGRESS_TABLE", "pipeline.progress_table"),
    ("EMBEDDING_CHUNKS_INDEX_QUEUE", "pipeline.chunk_queue"),
    ("S3_RAG_CHUNKS_BUCKET_NAME", "pipeline.chunks_bucket"),
    ("S3_IMAGE_INPUT_BUCKET_NAME", "pipeline.image_bucket"),
    ("LLM_ENDPOINTS_SECRETS_NAME_ARN", "qa.endpoints_secret"),
    ("SCHEDULED_TASKS_TABLE", "scheduler.tasks_table"),
    ("SCHEDULED_TASKS_LOGS_BUCKET", "scheduler.logs_bucket"),
    ("AGENT_QUEUE_URL", "scheduler.agent_queue"),
];

/// Configuration loader service.
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    /// Optional explicit config file path (overrides the default name)
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a loader with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an explicit configuration file path.
    #[must_use]
    pub fn with_config_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Load and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be parsed or validation
    /// rejects a value.
    pub fn load(&self) -> Result<AppConfig> {
        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));

        match &self.config_path {
            Some(path) => {
                if !path.exists() {
                    return Err(Error::ConfigMissing(format!(
                        "Configuration file not found: {}",
                        path.display()
                    )));
                }
                figment = figment.merge(Toml::file(path));
                info!(path = %path.display(), "Configuration file loaded");
            }
            None => {
                figment = figment.merge(Toml::file("embedflow.toml"));
            }
        }

        figment = figment.merge(Env::prefixed("EMBEDFLOW_").split("__"));
        for (env_name, config_key) in LEGACY_ENV_KEYS {
            if let Ok(value) = std::env::var(env_name) {
                figment = figment.merge((*config_key, value));
            }
        }

        let mut config: AppConfig = figment
            .extract()
            .map_err(|e| Error::config(format!("failed to load configuration: {e}")))?;
        apply_postgres_env(&mut config);
        validate_config(&config)?;
        Ok(config)
    }
}

/// Assemble the Postgres URL from the platform's split `RAG_POSTGRES_DB_*`
/// variables when no URL is configured directly.
fn apply_postgres_env(config: &mut AppConfig) {
    if config.vector_store.postgres_url.is_some() {
        return;
    }
    let endpoint = std::env::var("RAG_POSTGRES_DB_WRITE_ENDPOINT").ok();
    let user = std::env::var("RAG_POSTGRES_DB_USERNAME").ok();
    let database = std::env::var("RAG_POSTGRES_DB_NAME").ok();
    let password = std::env::var("RAG_POSTGRES_DB_SECRET").ok();
    if let (Some(endpoint), Some(user), Some(database)) = (endpoint, user, database) {
        let auth = password.map_or_else(|| user.clone(), |password| format!("{user}:{password}"));
        config.vector_store.postgres_url =
            Some(format!("postgres://{auth}@{endpoint}/{database}"));
    }
}

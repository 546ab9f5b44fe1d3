//! Load-time configuration validation.

use chrono_tz::Tz;
use embedflow_domain::error::{Error, Result};

use crate::config::data::AppConfig;

/// Reject configurations that cannot run.
///
/// # Errors
///
/// Returns an error naming the offending key.
pub fn validate_config(config: &AppConfig) -> Result<()> {
    if config.pipeline.consumer_count == 0 {
        return Err(Error::ConfigInvalid {
            key: "pipeline.consumer_count".to_owned(),
            message: "must be at least 1".to_owned(),
        });
    }

    if config.scheduler.default_timezone.parse::<Tz>().is_err() {
        return Err(Error::ConfigInvalid {
            key: "scheduler.default_timezone".to_owned(),
            message: format!(
                "'{}' is not an IANA timezone",
                config.scheduler.default_timezone
            ),
        });
    }

    match config.vector_store.provider.as_str() {
        "memory" => {}
        "postgres" => {
            if config.vector_store.postgres_url.is_none() {
                return Err(Error::ConfigMissing(
                    "vector_store.postgres_url (required for the postgres backend)".to_owned(),
                ));
            }
        }
        other => {
            return Err(Error::ConfigInvalid {
                key: "vector_store.provider".to_owned(),
                message: format!("unknown backend '{other}'"),
            });
        }
    }

    if config.embedding.provider == "http" && config.embedding.endpoint.is_none() {
        return Err(Error::ConfigMissing(
            "embedding.endpoint (required for the http provider)".to_owned(),
        ));
    }
    if config.qa.provider == "http" && config.qa.endpoint.is_none() {
        return Err(Error::ConfigMissing(
            "qa.endpoint (required for the http provider)".to_owned(),
        ));
    }
    if config.embedding.dimensions == 0 {
        return Err(Error::ConfigInvalid {
            key: "embedding.dimensions".to_owned(),
            message: "must be at least 1".to_owned(),
        });
    }

    Ok(())
}

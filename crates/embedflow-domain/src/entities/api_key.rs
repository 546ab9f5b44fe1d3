//! API key records and per-document credential material.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::value_objects::UserId;

/// A platform API key as stored by the admin service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyRecord {
    /// Key identifier
    pub id: String,
    /// The key material itself
    pub api_key: String,
    /// Whether the key is active
    #[serde(default)]
    pub active: bool,
    /// Optional expiry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Whether the key is currently rate limited
    #[serde(default)]
    pub rate_limited: bool,
    /// Owning user, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<UserId>,
}

impl ApiKeyRecord {
    /// Validate the key for dispatch use at `now`.
    ///
    /// # Errors
    ///
    /// Returns a credential error when the key is inactive, expired, or
    /// rate limited.
    pub fn ensure_usable(&self, now: DateTime<Utc>) -> Result<()> {
        if !self.active {
            return Err(Error::credential(format!("API key {} is inactive", self.id)));
        }
        if self.expires_at.is_some_and(|at| at <= now) {
            return Err(Error::credential(format!("API key {} has expired", self.id)));
        }
        if self.rate_limited {
            return Err(Error::credential(format!(
                "API key {} is rate limited",
                self.id
            )));
        }
        Ok(())
    }
}

/// Account-scoped secret material resolved per document before embedding
/// work starts. The contents are opaque to the pipeline; they are handed to
/// the QA summary provider unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountSecrets {
    /// Opaque account data
    pub data: Value,
}

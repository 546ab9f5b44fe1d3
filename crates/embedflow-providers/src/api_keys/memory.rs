use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use embedflow_domain::entities::ApiKeyRecord;
use embedflow_domain::error::{Error, Result};
use embedflow_domain::ports::providers::ApiKeyResolver;

/// In-memory API key table.
#[derive(Debug, Default)]
pub struct InMemoryApiKeyResolver {
    keys: DashMap<String, ApiKeyRecord>,
}

impl InMemoryApiKeyResolver {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a key record.
    pub fn insert(&self, record: ApiKeyRecord) {
        self.keys.insert(record.id.clone(), record);
    }
}

#[async_trait]
impl ApiKeyResolver for InMemoryApiKeyResolver {
    async fn resolve(&self, api_key_id: &str) -> Result<ApiKeyRecord> {
        let record = self
            .keys
            .get(api_key_id)
            .map(|entry| entry.clone())
            .ok_or_else(|| Error::credential(format!("API key {api_key_id} not found")))?;
        record.ensure_usable(Utc::now())?;
        Ok(record)
    }
}

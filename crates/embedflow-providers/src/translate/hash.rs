use async_trait::async_trait;
use embedflow_domain::constants::keys::GLOBAL_ID_PREFIX;
use embedflow_domain::error::Result;
use embedflow_domain::ports::providers::KeyTranslator;
use embedflow_domain::utils::content_hash;

/// Content-addressed key translator: `global/<sha256(key)>`.
#[derive(Debug, Clone, Default)]
pub struct HashKeyTranslator;

impl HashKeyTranslator {
    /// Create the translator.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl KeyTranslator for HashKeyTranslator {
    async fn to_global_id(&self, key: &str) -> Result<String> {
        Ok(format!("{GLOBAL_ID_PREFIX}{}", content_hash(key)))
    }
}

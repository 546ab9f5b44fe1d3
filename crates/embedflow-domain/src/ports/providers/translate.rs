use async_trait::async_trait;

use crate::error::Result;

/// Translation of user-facing data-source keys to the content-addressed
/// global ids the progress table is keyed by.
#[async_trait]
pub trait KeyTranslator: Send + Sync {
    /// Translate one user-facing key to its global id.
    async fn to_global_id(&self, key: &str) -> Result<String>;
}

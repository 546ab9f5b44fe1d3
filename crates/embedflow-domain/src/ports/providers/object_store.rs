use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;

/// Metadata of a stored object, as returned by a head lookup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectMeta {
    /// MIME content type
    pub content_type: Option<String>,
    /// Last modification time
    pub last_modified: Option<DateTime<Utc>>,
    /// User-assigned metadata key/value pairs
    pub metadata: HashMap<String, String>,
    /// Object size in bytes
    pub size: u64,
}

/// Object store access.
///
/// Read-only for chunk payloads, write for log archives. No cross-writer
/// coordination is required; keys are never overwritten concurrently.
#[async_trait]
pub trait ObjectStoreProvider: Send + Sync {
    /// Fetch an object body.
    ///
    /// # Returns
    /// Ok(bytes), or a `NotFound` error when the object does not exist
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>>;

    /// Fetch object metadata without the body.
    ///
    /// # Returns
    /// Ok(Some(meta)), or Ok(None) when the object does not exist
    async fn head(&self, bucket: &str, key: &str) -> Result<Option<ObjectMeta>>;

    /// Store an object.
    async fn put(&self, bucket: &str, key: &str, body: Vec<u8>, content_type: &str) -> Result<()>;

    /// List object keys under a prefix.
    async fn list_keys(&self, bucket: &str, prefix: &str) -> Result<Vec<String>>;
}

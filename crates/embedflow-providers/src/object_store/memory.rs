use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use embedflow_domain::error::{Error, Result};
use embedflow_domain::ports::providers::{ObjectMeta, ObjectStoreProvider};

#[derive(Debug, Clone)]
struct StoredObject {
    body: Vec<u8>,
    content_type: String,
    last_modified: DateTime<Utc>,
    metadata: HashMap<String, String>,
}

/// In-memory object store, keyed by `(bucket, key)`.
#[derive(Debug, Default)]
pub struct InMemoryObjectStore {
    objects: DashMap<(String, String), StoredObject>,
}

impl InMemoryObjectStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an object with explicit user metadata. Seeding support for
    /// chunk payloads carrying `object_key` / `force_reprocess` markers.
    pub fn put_with_metadata(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
        metadata: HashMap<String, String>,
    ) {
        self.objects.insert(
            (bucket.to_owned(), key.to_owned()),
            StoredObject {
                body,
                content_type: content_type.to_owned(),
                last_modified: Utc::now(),
                metadata,
            },
        );
    }

    /// Backdate an object's `last_modified`. Seeding support for the image
    /// staleness heuristic.
    pub fn set_last_modified(&self, bucket: &str, key: &str, at: DateTime<Utc>) {
        if let Some(mut object) = self.objects.get_mut(&(bucket.to_owned(), key.to_owned())) {
            object.last_modified = at;
        }
    }
}

#[async_trait]
impl ObjectStoreProvider for InMemoryObjectStore {
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        self.objects
            .get(&(bucket.to_owned(), key.to_owned()))
            .map(|object| object.body.clone())
            .ok_or_else(|| Error::not_found(format!("object {bucket}/{key}")))
    }

    async fn head(&self, bucket: &str, key: &str) -> Result<Option<ObjectMeta>> {
        Ok(self
            .objects
            .get(&(bucket.to_owned(), key.to_owned()))
            .map(|object| ObjectMeta {
                content_type: Some(object.content_type.clone()),
                last_modified: Some(object.last_modified),
                metadata: object.metadata.clone(),
                size: object.body.len() as u64,
            }))
    }

    async fn put(&self, bucket: &str, key: &str, body: Vec<u8>, content_type: &str) -> Result<()> {
        self.put_with_metadata(bucket, key, body, content_type, HashMap::new());
        Ok(())
    }

    async fn list_keys(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
        let mut keys: Vec<String> = self
            .objects
            .iter()
            .filter(|entry| entry.key().0 == bucket && entry.key().1.starts_with(prefix))
            .map(|entry| entry.key().1.clone())
            .collect();
        keys.sort();
        Ok(keys)
    }
}

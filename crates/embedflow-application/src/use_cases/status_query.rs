//! Status Query Use Case
//!
//! # Overview
//! Parallel lookup of embedding status across many data sources. Text
//! sources resolve through the progress record (after translating the
//! user-facing key to its content-addressed global id); image sources
//! resolve through an object-metadata heuristic. Lookups fan out through a
//! bounded pool; a partial failure yields `null` for the affected key,
//! never a global error.
//!
//! The image staleness verdict is a health probe, not authoritative state:
//! it is recomputed per call and never persisted.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use embedflow_domain::constants::limits::{
    IMAGE_PROCESSING_WINDOW_SECS, STATUS_QUERY_CONCURRENCY,
};
use embedflow_domain::constants::mime::{is_image_mime, PROCESSED_IMAGE_CONTENT_TYPE};
use embedflow_domain::error::Result;
use embedflow_domain::ports::providers::{KeyTranslator, ObjectStoreProvider, ProgressStore};
use embedflow_domain::ports::services::{
    DataSourceRef, EmbeddingStatus, StatusMap, StatusQueryInterface,
};
use embedflow_domain::value_objects::DocumentKey;
use futures::stream::{self, StreamExt};
use tracing::{info, warn};

/// Status query service implementation.
pub struct StatusQueryService {
    progress: Arc<dyn ProgressStore>,
    object_store: Arc<dyn ObjectStoreProvider>,
    translator: Arc<dyn KeyTranslator>,
    image_bucket: String,
}

impl StatusQueryService {
    /// Create the service reading image objects from `image_bucket`.
    pub fn new(
        progress: Arc<dyn ProgressStore>,
        object_store: Arc<dyn ObjectStoreProvider>,
        translator: Arc<dyn KeyTranslator>,
        image_bucket: impl Into<String>,
    ) -> Self {
        Self {
            progress,
            object_store,
            translator,
            image_bucket: image_bucket.into(),
        }
    }

    async fn image_status(&self, key: &str) -> Option<EmbeddingStatus> {
        let meta = match self.object_store.head(&self.image_bucket, key).await {
            Ok(Some(meta)) => meta,
            Ok(None) => return Some(EmbeddingStatus::NotFound),
            Err(e) => {
                warn!(key = %key, error = %e, "Image status lookup failed");
                return None;
            }
        };

        let content_type = meta.content_type.as_deref().unwrap_or_default();
        if content_type == PROCESSED_IMAGE_CONTENT_TYPE {
            // Processed to base64 text.
            return Some(EmbeddingStatus::Completed);
        }
        if is_image_mime(content_type) {
            // Original image still present: recent upload means processing
            // is in flight, anything older has likely failed.
            let Some(last_modified) = meta.last_modified else {
                return Some(EmbeddingStatus::Failed);
            };
            let age = Utc::now()
                .signed_duration_since(last_modified)
                .num_seconds();
            if age <= IMAGE_PROCESSING_WINDOW_SECS {
                return Some(EmbeddingStatus::Processing);
            }
            warn!(key = %key, age_secs = age, "Image upload is stale, reporting failed");
            return Some(EmbeddingStatus::Failed);
        }

        warn!(key = %key, content_type = %content_type, "Unexpected image content type");
        Some(EmbeddingStatus::Failed)
    }

    async fn text_status(&self, key: &str) -> Option<EmbeddingStatus> {
        let global_id = match self.translator.to_global_id(key).await {
            Ok(global_id) => global_id,
            Err(e) => {
                warn!(key = %key, error = %e, "Key translation failed");
                return None;
            }
        };

        let record = match self
            .progress
            .get(&DocumentKey::new(global_id), false)
            .await
        {
            Ok(record) => record,
            Err(e) => {
                warn!(key = %key, error = %e, "Progress lookup failed");
                return None;
            }
        };

        let Some(record) = record else {
            return Some(EmbeddingStatus::NotFound);
        };
        if record.terminated {
            return Some(EmbeddingStatus::Terminated);
        }
        Some(
            record
                .parent_chunk_status
                .map_or(EmbeddingStatus::Starting, EmbeddingStatus::from),
        )
    }

    async fn lookup(&self, source: DataSourceRef) -> (String, Option<EmbeddingStatus>) {
        let status = if is_image_mime(&source.mime_type) {
            self.image_status(&source.key).await
        } else {
            self.text_status(&source.key).await
        };
        (source.key, status)
    }
}

#[async_trait]
impl StatusQueryInterface for StatusQueryService {
    async fn get_status(&self, sources: Vec<DataSourceRef>) -> Result<StatusMap> {
        let mut map: StatusMap = sources
            .iter()
            .filter(|source| !source.key.is_empty())
            .map(|source| (source.key.clone(), None))
            .collect();

        let results: Vec<(String, Option<EmbeddingStatus>)> = stream::iter(
            sources
                .into_iter()
                .filter(|source| !source.key.is_empty())
                .map(|source| self.lookup(source)),
        )
        .buffer_unordered(STATUS_QUERY_CONCURRENCY)
        .collect()
        .await;

        for (key, status) in results {
            map.insert(key, status);
        }

        let not_found = map
            .values()
            .filter(|status| **status == Some(EmbeddingStatus::NotFound))
            .count();
        let failed = map
            .values()
            .filter(|status| **status == Some(EmbeddingStatus::Failed))
            .count();
        info!(
            sources = map.len(),
            not_found, failed, "Status lookup complete"
        );
        Ok(map)
    }
}

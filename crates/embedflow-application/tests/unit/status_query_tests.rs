//! Status query scenarios: text path via the progress record, image path
//! via object metadata, partial failures.

use std::sync::Arc;

use chrono::{Duration, Utc};
use embedflow_application::StatusQueryService;
use embedflow_domain::entities::{ParentStatus, ProgressRecord};
use embedflow_domain::ports::providers::{KeyTranslator, ObjectStoreProvider, ProgressStore};
use embedflow_domain::ports::services::{DataSourceRef, EmbeddingStatus, StatusQueryInterface};
use embedflow_domain::value_objects::DocumentKey;
use embedflow_providers::coordination::InMemoryProgressStore;
use embedflow_providers::object_store::InMemoryObjectStore;
use embedflow_providers::translate::HashKeyTranslator;

use crate::utils::FailingKeyTranslator;

const IMAGE_BUCKET: &str = "image-input";

struct Harness {
    progress: Arc<InMemoryProgressStore>,
    objects: Arc<InMemoryObjectStore>,
    service: StatusQueryService,
}

fn harness() -> Harness {
    let progress = Arc::new(InMemoryProgressStore::new());
    let objects = Arc::new(InMemoryObjectStore::new());
    let service = StatusQueryService::new(
        Arc::clone(&progress) as Arc<dyn ProgressStore>,
        Arc::clone(&objects) as Arc<dyn ObjectStoreProvider>,
        Arc::new(HashKeyTranslator::new()),
        IMAGE_BUCKET,
    );
    Harness {
        progress,
        objects,
        service,
    }
}

fn text_source(key: &str) -> DataSourceRef {
    DataSourceRef {
        key: key.to_owned(),
        mime_type: "application/pdf".to_owned(),
    }
}

fn image_source(key: &str) -> DataSourceRef {
    DataSourceRef {
        key: key.to_owned(),
        mime_type: "image/png".to_owned(),
    }
}

/// Seed a progress record under the content-addressed global id of a
/// user-facing key.
async fn seed_progress(h: &Harness, key: &str, status: ParentStatus, terminated: bool) {
    let global_id = HashKeyTranslator::new()
        .to_global_id(key)
        .await
        .expect("global id");
    let mut record = ProgressRecord::new(Utc::now());
    record.parent_chunk_status = Some(status);
    record.terminated = terminated;
    h.progress
        .put(&DocumentKey::new(global_id), record)
        .await
        .expect("put");
}

#[tokio::test]
async fn text_statuses_resolve_through_the_progress_record() {
    let h = harness();
    seed_progress(&h, "u/doc-a.json", ParentStatus::Completed, false).await;
    seed_progress(&h, "u/doc-b.json", ParentStatus::Processing, false).await;
    seed_progress(&h, "u/doc-c.json", ParentStatus::Processing, true).await;

    let map = h
        .service
        .get_status(vec![
            text_source("u/doc-a.json"),
            text_source("u/doc-b.json"),
            text_source("u/doc-c.json"),
            text_source("u/doc-missing.json"),
        ])
        .await
        .expect("status");

    assert_eq!(map["u/doc-a.json"], Some(EmbeddingStatus::Completed));
    assert_eq!(map["u/doc-b.json"], Some(EmbeddingStatus::Processing));
    // Termination wins over the stored parent status.
    assert_eq!(map["u/doc-c.json"], Some(EmbeddingStatus::Terminated));
    assert_eq!(map["u/doc-missing.json"], Some(EmbeddingStatus::NotFound));
}

#[tokio::test]
async fn image_statuses_follow_the_content_type_heuristic() {
    let h = harness();

    // Processed to base64 text.
    h.objects
        .put(IMAGE_BUCKET, "done.png", b"data".to_vec(), "text/plain")
        .await
        .expect("put");
    // Fresh upload, still the original image type.
    h.objects
        .put(IMAGE_BUCKET, "fresh.png", b"data".to_vec(), "image/png")
        .await
        .expect("put");
    // Stale upload: older than the processing window.
    h.objects
        .put(IMAGE_BUCKET, "stale.png", b"data".to_vec(), "image/png")
        .await
        .expect("put");
    h.objects
        .set_last_modified(IMAGE_BUCKET, "stale.png", Utc::now() - Duration::minutes(10));
    // Unexpected content type.
    h.objects
        .put(IMAGE_BUCKET, "odd.png", b"data".to_vec(), "application/zip")
        .await
        .expect("put");

    let map = h
        .service
        .get_status(vec![
            image_source("done.png"),
            image_source("fresh.png"),
            image_source("stale.png"),
            image_source("odd.png"),
            image_source("missing.png"),
        ])
        .await
        .expect("status");

    assert_eq!(map["done.png"], Some(EmbeddingStatus::Completed));
    assert_eq!(map["fresh.png"], Some(EmbeddingStatus::Processing));
    assert_eq!(map["stale.png"], Some(EmbeddingStatus::Failed));
    assert_eq!(map["odd.png"], Some(EmbeddingStatus::Failed));
    assert_eq!(map["missing.png"], Some(EmbeddingStatus::NotFound));
}

#[tokio::test]
async fn partial_failures_yield_null_for_the_affected_key() {
    let progress = Arc::new(InMemoryProgressStore::new());
    let objects = Arc::new(InMemoryObjectStore::new());
    let service = StatusQueryService::new(
        Arc::clone(&progress) as Arc<dyn ProgressStore>,
        Arc::clone(&objects) as Arc<dyn ObjectStoreProvider>,
        Arc::new(FailingKeyTranslator),
        IMAGE_BUCKET,
    );

    objects
        .put(IMAGE_BUCKET, "done.png", b"data".to_vec(), "text/plain")
        .await
        .expect("put");

    let map = service
        .get_status(vec![
            text_source("u/doc-a.json"),
            image_source("done.png"),
        ])
        .await
        .expect("status");

    // Translation failed for the text key, the image key still resolved.
    assert_eq!(map["u/doc-a.json"], None);
    assert_eq!(map["done.png"], Some(EmbeddingStatus::Completed));
}

#[tokio::test]
async fn untouched_records_default_to_starting() {
    let h = harness();
    let global_id = HashKeyTranslator::new()
        .to_global_id("u/doc.json")
        .await
        .expect("global id");
    h.progress
        .put(&DocumentKey::new(global_id), ProgressRecord::new(Utc::now()))
        .await
        .expect("put");

    let map = h
        .service
        .get_status(vec![text_source("u/doc.json")])
        .await
        .expect("status");
    assert_eq!(map["u/doc.json"], Some(EmbeddingStatus::Starting));
}

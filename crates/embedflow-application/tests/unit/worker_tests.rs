//! Embedding worker scenarios: happy ingest, partial failure, redelivery,
//! termination, missing secrets, empty children.

use std::sync::Arc;

use embedflow_domain::entities::{ChildStatus, ParentStatus};
use embedflow_domain::ports::providers::ProgressStore;
use embedflow_domain::value_objects::{ChildChunkId, DocumentKey};
use embedflow_providers::embedding::{HashEmbeddingProvider, UnavailableSecretsProvider};

use crate::utils::{
    enqueue_and_receive, seed_chunk_file, seed_progress_total, Pipeline, FAIL_MARKER,
};

const DOC: &str = "docs/report.json";

fn doc_key() -> DocumentKey {
    DocumentKey::from_src(DOC)
}

#[tokio::test]
async fn happy_ingest_completes_document_with_all_rows() {
    let pipeline = Pipeline::new();
    let worker = pipeline.worker();

    seed_progress_total(&pipeline.progress, DOC, 3).await;
    for k in 1..=3 {
        seed_chunk_file(&pipeline.objects, DOC, k, &["first text", "second text"], false);
    }
    for k in 1..=3 {
        let message = enqueue_and_receive(&pipeline.queue, DOC, k).await;
        worker.process_message(message).await;
    }

    let record = pipeline
        .progress
        .get(&doc_key(), true)
        .await
        .expect("get")
        .expect("record");
    assert_eq!(record.parent_chunk_status, Some(ParentStatus::Completed));
    for k in ["1", "2", "3"] {
        assert_eq!(
            record.child_status(&ChildChunkId::from(k)),
            Some(ChildStatus::Completed)
        );
    }

    let rows = pipeline.vector.rows_for(&doc_key());
    assert_eq!(rows.len(), 6);
    for k in ["1", "2", "3"] {
        for index in [0, 1] {
            assert!(rows.iter().any(|row| {
                row.child_chunk.as_str() == k && row.embedding_index == index
            }));
        }
    }
    // Every delivery was acked.
    assert_eq!(pipeline.queue.in_flight_len(), 0);
    assert_eq!(pipeline.queue.pending_len(), 0);
}

#[tokio::test]
async fn failing_micro_chunk_fails_child_and_parent() {
    let pipeline = Pipeline::new();
    let worker = pipeline.worker();

    seed_progress_total(&pipeline.progress, DOC, 3).await;
    seed_chunk_file(&pipeline.objects, DOC, 1, &["fine text", "also fine"], false);
    seed_chunk_file(
        &pipeline.objects,
        DOC,
        2,
        &["fine text", &format!("bad {FAIL_MARKER} text")],
        false,
    );
    seed_chunk_file(&pipeline.objects, DOC, 3, &["fine text"], false);

    // Child 1 completes, child 2 fails on its second micro-chunk.
    let message = enqueue_and_receive(&pipeline.queue, DOC, 1).await;
    worker.process_message(message).await;
    let message = enqueue_and_receive(&pipeline.queue, DOC, 2).await;
    worker.process_message(message).await;

    let record = pipeline
        .progress
        .get(&doc_key(), true)
        .await
        .expect("get")
        .expect("record");
    assert_eq!(record.parent_chunk_status, Some(ParentStatus::Failed));
    assert_eq!(
        record.child_status(&ChildChunkId::from("2")),
        Some(ChildStatus::Failed)
    );
    let error = record.data.child_chunks[&ChildChunkId::from("2")]
        .error
        .clone()
        .expect("error recorded");
    assert!(error.contains("local chunk 1"));

    // Child 2 committed its first micro-chunk before failing.
    let rows = pipeline.vector.rows_for(&doc_key());
    assert_eq!(
        rows.iter()
            .filter(|row| row.child_chunk.as_str() == "2")
            .count(),
        1
    );

    // Child 3 arrives after the parent went terminal and is dropped.
    let message = enqueue_and_receive(&pipeline.queue, DOC, 3).await;
    worker.process_message(message).await;
    let record = pipeline
        .progress
        .get(&doc_key(), true)
        .await
        .expect("get")
        .expect("record");
    assert_eq!(record.parent_chunk_status, Some(ParentStatus::Failed));
    assert_eq!(record.child_status(&ChildChunkId::from("3")), None);
    assert_eq!(pipeline.queue.in_flight_len(), 0);
}

#[tokio::test]
async fn redelivered_message_leaves_state_unchanged() {
    let pipeline = Pipeline::new();
    let worker = pipeline.worker();
    seed_progress_total(&pipeline.progress, DOC, 1).await;
    seed_chunk_file(&pipeline.objects, DOC, 1, &["only text"], false);

    let message = enqueue_and_receive(&pipeline.queue, DOC, 1).await;
    worker.process_message(message).await;
    let first_record = pipeline
        .progress
        .get(&doc_key(), true)
        .await
        .expect("get")
        .expect("record");
    let first_rows = pipeline.vector.rows_for(&doc_key());

    // The same payload is delivered again (at-least-once queue).
    let message = enqueue_and_receive(&pipeline.queue, DOC, 1).await;
    worker.process_message(message).await;

    let second_record = pipeline
        .progress
        .get(&doc_key(), true)
        .await
        .expect("get")
        .expect("record");
    assert_eq!(
        second_record.parent_chunk_status,
        first_record.parent_chunk_status
    );
    assert_eq!(
        second_record.data.child_chunks[&ChildChunkId::from("1")].status,
        first_record.data.child_chunks[&ChildChunkId::from("1")].status
    );
    assert_eq!(pipeline.vector.rows_for(&doc_key()).len(), first_rows.len());
}

#[tokio::test]
async fn zero_local_chunks_complete_without_rows() {
    let pipeline = Pipeline::new();
    let worker = pipeline.worker();
    seed_progress_total(&pipeline.progress, DOC, 1).await;
    seed_chunk_file(&pipeline.objects, DOC, 1, &[], false);

    let message = enqueue_and_receive(&pipeline.queue, DOC, 1).await;
    worker.process_message(message).await;

    let record = pipeline
        .progress
        .get(&doc_key(), true)
        .await
        .expect("get")
        .expect("record");
    assert_eq!(
        record.child_status(&ChildChunkId::from("1")),
        Some(ChildStatus::Completed)
    );
    assert_eq!(record.parent_chunk_status, Some(ParentStatus::Completed));
    assert!(pipeline.vector.rows_for(&doc_key()).is_empty());
}

#[tokio::test]
async fn terminated_documents_drop_messages() {
    let pipeline = Pipeline::new();
    let worker = pipeline.worker();
    seed_chunk_file(&pipeline.objects, DOC, 1, &["text"], false);

    pipeline
        .coordinator
        .mark_terminated(&doc_key())
        .await
        .expect("terminate");

    let message = enqueue_and_receive(&pipeline.queue, DOC, 1).await;
    worker.process_message(message).await;

    assert!(pipeline.vector.rows_for(&doc_key()).is_empty());
    let record = pipeline
        .progress
        .get(&doc_key(), true)
        .await
        .expect("get")
        .expect("record");
    assert_eq!(record.child_status(&ChildChunkId::from("1")), None);
    assert_eq!(pipeline.queue.in_flight_len(), 0);
}

#[tokio::test]
async fn missing_secrets_fail_the_parent_before_any_work() {
    let pipeline = Pipeline::new();
    let worker = pipeline.worker_with(
        Arc::new(HashEmbeddingProvider::new(8)),
        Arc::new(UnavailableSecretsProvider::new()),
    );
    seed_chunk_file(&pipeline.objects, DOC, 1, &["text"], false);

    let message = enqueue_and_receive(&pipeline.queue, DOC, 1).await;
    worker.process_message(message).await;

    let record = pipeline
        .progress
        .get(&doc_key(), true)
        .await
        .expect("get")
        .expect("record");
    assert_eq!(record.parent_chunk_status, Some(ParentStatus::Failed));
    assert!(record.error_message.is_some());
    assert!(pipeline.vector.rows_for(&doc_key()).is_empty());
}

//! Reprocess planner scenarios: selective reprocess, structural change,
//! legacy rows, memoization.

use embedflow_application::CleanupDecision;
use embedflow_domain::entities::{ChildStatus, EmbeddingRow, ParentStatus};
use embedflow_domain::ports::providers::{ProgressStore, VectorStoreGateway};
use embedflow_domain::value_objects::{ChildChunkId, DocumentKey};
use serde_json::json;

use crate::utils::{
    enqueue_and_receive, seed_chunk_file, seed_progress_total, Pipeline, FAIL_MARKER,
};

const DOC: &str = "docs/report.json";

fn doc_key() -> DocumentKey {
    DocumentKey::from_src(DOC)
}

/// Drive the document to: children 1 and 3 completed, child 2 failed,
/// parent failed.
async fn ingest_with_failed_child_two(pipeline: &Pipeline) {
    seed_progress_total(&pipeline.progress, DOC, 3).await;
    seed_chunk_file(&pipeline.objects, DOC, 1, &["text one", "text two"], false);
    seed_chunk_file(
        &pipeline.objects,
        DOC,
        2,
        &["text one", &format!("{FAIL_MARKER} text")],
        false,
    );
    seed_chunk_file(&pipeline.objects, DOC, 3, &["text one", "text two"], false);

    let worker = pipeline.worker();
    for k in [1, 3, 2] {
        let message = enqueue_and_receive(&pipeline.queue, DOC, k).await;
        worker.process_message(message).await;
    }

    let record = pipeline
        .progress
        .get(&doc_key(), true)
        .await
        .expect("get")
        .expect("record");
    assert_eq!(record.parent_chunk_status, Some(ParentStatus::Failed));
}

#[tokio::test]
async fn selective_reprocess_retries_only_the_failed_child() {
    let pipeline = Pipeline::new();
    ingest_with_failed_child_two(&pipeline).await;
    let rows_before = pipeline.vector.rows_for(&doc_key());

    // Re-seed all three chunk files with the failure fixed and the force
    // flag set, then run all three messages through a fresh worker
    // process.
    seed_chunk_file(&pipeline.objects, DOC, 1, &["text one", "text two"], true);
    seed_chunk_file(&pipeline.objects, DOC, 2, &["text one", "fixed text"], true);
    seed_chunk_file(&pipeline.objects, DOC, 3, &["text one", "text two"], true);

    let worker = pipeline.worker();
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

    // Children 1 and 3 kept their original rows; child 2 was rebuilt.
    let rows_after = pipeline.vector.rows_for(&doc_key());
    assert_eq!(rows_after.len(), 6);
    for row in &rows_before {
        if row.child_chunk.as_str() != "2" {
            assert!(rows_after.contains(row));
        }
    }
    assert_eq!(
        rows_after
            .iter()
            .filter(|row| row.child_chunk.as_str() == "2")
            .count(),
        2
    );
}

#[tokio::test]
async fn structural_change_forces_full_reprocess() {
    let pipeline = Pipeline::new();

    // Clean three-chunk ingest first.
    seed_progress_total(&pipeline.progress, DOC, 3).await;
    for k in 1..=3 {
        seed_chunk_file(&pipeline.objects, DOC, k, &["text one"], false);
    }
    let worker = pipeline.worker();
    for k in 1..=3 {
        let message = enqueue_and_receive(&pipeline.queue, DOC, k).await;
        worker.process_message(message).await;
    }

    // The document is re-chunked into four children; the chunk files are
    // replaced wholesale.
    for k in 1..=4 {
        seed_chunk_file(&pipeline.objects, DOC, k, &["new text"], true);
    }

    let worker = pipeline.worker();
    for k in 1..=4 {
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
    assert_eq!(record.data.child_chunks.len(), 4);
    assert_eq!(pipeline.vector.rows_for(&doc_key()).len(), 4);
}

#[tokio::test]
async fn legacy_rows_without_chunk_ids_force_full_cleanup() {
    let pipeline = Pipeline::new();
    ingest_with_failed_child_two(&pipeline).await;

    // A legacy row with no chunk identification predates chunk tracking.
    pipeline
        .vector
        .insert(EmbeddingRow {
            src: doc_key(),
            child_chunk: ChildChunkId::from(""),
            locations: json!([]),
            orig_indexes: json!([]),
            char_index: 0,
            token_count: 1,
            embedding_index: 99,
            content: "legacy".to_owned(),
            content_vector: vec![0.0],
            qa_vector: vec![0.0],
        })
        .await
        .expect("insert");

    let decision = pipeline.planner.prepare(&doc_key()).await.expect("plan");
    assert_eq!(decision, CleanupDecision::Full);
    assert!(pipeline.vector.rows_for(&doc_key()).is_empty());

    // The record was reset to a fresh one carrying the expected count.
    let record = pipeline
        .progress
        .get(&doc_key(), true)
        .await
        .expect("get")
        .expect("record");
    assert!(record.data.child_chunks.is_empty());
    assert_eq!(record.data.total_chunks, 3);
    assert!(record.parent_chunk_status.is_none());
}

#[tokio::test]
async fn planner_runs_once_per_document_per_process() {
    let pipeline = Pipeline::new();
    ingest_with_failed_child_two(&pipeline).await;

    let first = pipeline.planner.prepare(&doc_key()).await.expect("plan");
    assert!(matches!(first, CleanupDecision::Selective(_)));

    let second = pipeline.planner.prepare(&doc_key()).await.expect("plan");
    assert_eq!(second, CleanupDecision::AlreadyPlanned);

    // After a memo reset the planner decides again.
    pipeline.planner.reset_memo();
    let third = pipeline.planner.prepare(&doc_key()).await.expect("plan");
    assert_ne!(third, CleanupDecision::AlreadyPlanned);
}

#[tokio::test]
async fn selective_cleanup_resets_failed_children_for_retry() {
    let pipeline = Pipeline::new();
    ingest_with_failed_child_two(&pipeline).await;

    let decision = pipeline.planner.prepare(&doc_key()).await.expect("plan");
    assert_eq!(
        decision,
        CleanupDecision::Selective(vec![ChildChunkId::from("2")])
    );

    let record = pipeline
        .progress
        .get(&doc_key(), true)
        .await
        .expect("get")
        .expect("record");
    assert_eq!(record.parent_chunk_status, Some(ParentStatus::Processing));
    assert!(record.error_message.is_none());
    assert_eq!(
        record.child_status(&ChildChunkId::from("2")),
        Some(ChildStatus::Starting)
    );
    assert_eq!(
        record.child_status(&ChildChunkId::from("1")),
        Some(ChildStatus::Completed)
    );
    // Only child 2's rows were deleted.
    assert!(pipeline
        .vector
        .rows_for(&doc_key())
        .iter()
        .all(|row| row.child_chunk.as_str() != "2"));
}

#[tokio::test]
async fn fresh_documents_need_no_cleanup() {
    let pipeline = Pipeline::new();
    let decision = pipeline.planner.prepare(&doc_key()).await.expect("plan");
    assert_eq!(decision, CleanupDecision::FreshDocument);
}

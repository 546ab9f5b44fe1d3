//! Progress coordinator invariants: legal transitions, eager parent
//! failure, absorbing terminal states.

use embedflow_domain::entities::{ChildStatus, ParentStatus};
use embedflow_domain::ports::providers::ProgressStore;
use embedflow_domain::value_objects::{ChildChunkId, DocumentKey};

use crate::utils::Pipeline;

fn doc() -> DocumentKey {
    DocumentKey::from_src("docs/report.json")
}

#[tokio::test]
async fn illegal_transitions_are_silent_no_ops() {
    let pipeline = Pipeline::new();
    let chunk = ChildChunkId::from("1");

    // starting → completed skips the processing stage and is ignored.
    pipeline
        .coordinator
        .update_child_status(&doc(), &chunk, ChildStatus::Starting, None)
        .await
        .expect("starting");
    pipeline
        .coordinator
        .update_child_status(&doc(), &chunk, ChildStatus::Completed, None)
        .await
        .expect("no-op");

    let status = pipeline
        .coordinator
        .child_status(&doc(), &chunk)
        .await
        .expect("status");
    assert_eq!(status, Some(ChildStatus::Starting));
}

#[tokio::test]
async fn child_failure_eagerly_fails_the_parent() {
    let pipeline = Pipeline::new();

    pipeline
        .coordinator
        .update_child_status(&doc(), &ChildChunkId::from("1"), ChildStatus::Processing, None)
        .await
        .expect("processing");
    pipeline
        .coordinator
        .fail_child(&doc(), &ChildChunkId::from("1"), "boom".to_owned())
        .await
        .expect("fail");

    let record = pipeline
        .progress
        .get(&doc(), true)
        .await
        .expect("get")
        .expect("record");
    assert_eq!(record.parent_chunk_status, Some(ParentStatus::Failed));
    assert_eq!(record.error_message.as_deref(), Some("boom"));
}

#[tokio::test]
async fn later_completions_cannot_flip_a_failed_parent() {
    let pipeline = Pipeline::new();

    pipeline
        .coordinator
        .update_child_status(&doc(), &ChildChunkId::from("1"), ChildStatus::Processing, None)
        .await
        .expect("processing");
    pipeline
        .coordinator
        .fail_child(&doc(), &ChildChunkId::from("2"), "boom".to_owned())
        .await
        .expect("fail");

    // Child 1 finishes afterwards; the aggregation must not resurrect the
    // parent.
    pipeline
        .coordinator
        .update_child_status(&doc(), &ChildChunkId::from("1"), ChildStatus::Completed, None)
        .await
        .expect("completed");
    pipeline
        .coordinator
        .update_parent_status(&doc(), None, None)
        .await
        .expect("aggregate");

    let record = pipeline
        .progress
        .get(&doc(), true)
        .await
        .expect("get")
        .expect("record");
    assert_eq!(record.parent_chunk_status, Some(ParentStatus::Failed));
}

#[tokio::test]
async fn aggregation_completes_only_when_every_child_completed() {
    let pipeline = Pipeline::new();
    for id in ["1", "2"] {
        let chunk = ChildChunkId::from(id);
        pipeline
            .coordinator
            .update_child_status(&doc(), &chunk, ChildStatus::Processing, None)
            .await
            .expect("processing");
    }

    pipeline
        .coordinator
        .update_child_status(&doc(), &ChildChunkId::from("1"), ChildStatus::Completed, None)
        .await
        .expect("completed");
    pipeline
        .coordinator
        .update_parent_status(&doc(), None, None)
        .await
        .expect("aggregate");
    let record = pipeline
        .progress
        .get(&doc(), true)
        .await
        .expect("get")
        .expect("record");
    assert_eq!(record.parent_chunk_status, Some(ParentStatus::Processing));

    pipeline
        .coordinator
        .update_child_status(&doc(), &ChildChunkId::from("2"), ChildStatus::Completed, None)
        .await
        .expect("completed");
    pipeline
        .coordinator
        .update_parent_status(&doc(), None, None)
        .await
        .expect("aggregate");
    let record = pipeline
        .progress
        .get(&doc(), true)
        .await
        .expect("get")
        .expect("record");
    assert_eq!(record.parent_chunk_status, Some(ParentStatus::Completed));
}

#[tokio::test]
async fn terminated_documents_report_terminal() {
    let pipeline = Pipeline::new();
    assert!(!pipeline.coordinator.is_terminal(&doc()).await.expect("check"));

    pipeline
        .coordinator
        .mark_terminated(&doc())
        .await
        .expect("terminate");
    assert!(pipeline.coordinator.is_terminal(&doc()).await.expect("check"));
}

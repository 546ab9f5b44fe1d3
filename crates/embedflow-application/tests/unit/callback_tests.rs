//! Callback sink scenarios: in-place log merge, claim clearing,
//! notifications, session-id reconstruction.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use embedflow_application::{DispatchedTask, SchedulerTick, TaskCallbackSink, TaskDispatcher};
use embedflow_domain::entities::{ApiKeyRecord, ExecutionStatus, ScheduledTask};
use embedflow_domain::ports::providers::{MailerProvider, QueueProvider, TaskRepository};
use embedflow_domain::value_objects::TaskKey;
use embedflow_providers::api_keys::InMemoryApiKeyResolver;
use embedflow_providers::coordination::InMemoryTaskRepository;
use embedflow_providers::mailer::LogMailer;
use embedflow_providers::object_store::InMemoryObjectStore;
use embedflow_providers::queue::InMemoryQueue;
use serde_json::json;

use crate::utils::NullEventBus;

fn utc(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .expect("valid timestamp")
        .with_timezone(&Utc)
}

struct Harness {
    repository: Arc<InMemoryTaskRepository>,
    agent_queue: Arc<InMemoryQueue>,
    mailer: Arc<LogMailer>,
    scheduler: SchedulerTick,
    sink: TaskCallbackSink,
}

fn harness() -> Harness {
    let objects = Arc::new(InMemoryObjectStore::new());
    let repository = Arc::new(InMemoryTaskRepository::new(objects, "task-logs"));
    let api_keys = Arc::new(InMemoryApiKeyResolver::new());
    api_keys.insert(ApiKeyRecord {
        id: "k1".to_owned(),
        api_key: "secret".to_owned(),
        active: true,
        expires_at: None,
        rate_limited: false,
        owner: None,
    });
    let agent_queue = Arc::new(InMemoryQueue::new());
    let mailer = Arc::new(LogMailer::new());

    let dispatcher = Arc::new(TaskDispatcher::new(
        Arc::clone(&repository) as Arc<dyn TaskRepository>,
        api_keys as Arc<dyn embedflow_domain::ports::providers::ApiKeyResolver>,
        Arc::clone(&agent_queue) as Arc<dyn QueueProvider>,
        Arc::new(NullEventBus),
    ));
    let scheduler = SchedulerTick::new(
        Arc::clone(&repository) as Arc<dyn TaskRepository>,
        dispatcher,
        Arc::new(NullEventBus),
        "America/Chicago",
    );
    let sink = TaskCallbackSink::new(
        Arc::clone(&repository) as Arc<dyn TaskRepository>,
        Arc::clone(&mailer) as Arc<dyn MailerProvider>,
        Arc::new(NullEventBus),
    );

    Harness {
        repository,
        agent_queue,
        mailer,
        scheduler,
        sink,
    }
}

fn task(notify: bool) -> ScheduledTask {
    ScheduledTask {
        user: "u@example.com".into(),
        task_id: "T".into(),
        task_name: "report refresh".to_owned(),
        description: None,
        cron_expression: Some("*/15 * * * *".to_owned()),
        time_zone: Some("America/Chicago".to_owned()),
        date_range: None,
        active: true,
        created_at: Some(utc("2025-01-01T00:00:00Z")),
        last_run_at: Some(utc("2025-01-15T17:30:00Z")),
        last_checked_at: None,
        last_check_run_id: None,
        logs: vec![],
        api_key_id: Some("k1".to_owned()),
        object_info: Some(json!({"objectId": "a1", "objectName": "Report"})),
        task_type: Some(embedflow_domain::entities::TaskType::Assistant),
        task_instructions: Some("refresh it".to_owned()),
        notify_on_completion: notify,
        notify_on_failure: notify,
        notify_email_addresses: if notify {
            vec!["ops@example.com".to_owned()]
        } else {
            vec![]
        },
    }
}

/// Dispatch the task and parse back the envelope the agent would receive.
async fn dispatch_and_take_envelope(h: &Harness) -> DispatchedTask {
    h.scheduler.run_at(utc("2025-01-15T18:00:00Z")).await;
    let message = h
        .agent_queue
        .receive(1)
        .await
        .expect("receive")
        .pop()
        .expect("message");
    let envelope: serde_json::Value = serde_json::from_str(&message.body).expect("json");
    serde_json::from_value(envelope["taskData"].clone()).expect("task data")
}

#[tokio::test]
async fn success_merges_the_running_entry_in_place() {
    let h = harness();
    h.repository.put_task(task(false)).await.expect("put");
    let dispatched = dispatch_and_take_envelope(&h).await;
    let session_id = dispatched.session_id.clone().expect("session id");

    let before = h
        .repository
        .get_task(&TaskKey::new("u@example.com", "T"))
        .await
        .expect("get")
        .expect("task");
    assert_eq!(before.logs.len(), 1);
    let start_time = before.logs[0].start_time.expect("start time");

    h.sink
        .on_success(&dispatched, json!({"output": "done"}))
        .await
        .expect("callback");

    let after = h
        .repository
        .get_task(&TaskKey::new("u@example.com", "T"))
        .await
        .expect("get")
        .expect("task");
    // Updated in place, not duplicated.
    assert_eq!(after.logs.len(), 1);
    assert_eq!(after.logs[0].execution_id, session_id);
    assert_eq!(after.logs[0].status, ExecutionStatus::Success);
    assert_eq!(after.logs[0].start_time, Some(start_time));
    assert!(after.logs[0]
        .details_key
        .as_deref()
        .expect("details key")
        .ends_with(&format!("{session_id}.json")));

    // Claim markers cleared so the next cron fire is eligible.
    assert!(after.last_checked_at.is_none());
    assert!(after.last_check_run_id.is_none());
}

#[tokio::test]
async fn failure_clears_the_claim_and_notifies() {
    let h = harness();
    h.repository.put_task(task(true)).await.expect("put");
    let dispatched = dispatch_and_take_envelope(&h).await;

    h.sink
        .on_failure(&dispatched, "agent exploded".to_owned())
        .await
        .expect("callback");

    let after = h
        .repository
        .get_task(&TaskKey::new("u@example.com", "T"))
        .await
        .expect("get")
        .expect("task");
    assert_eq!(after.logs.len(), 1);
    assert_eq!(after.logs[0].status, ExecutionStatus::Failure);
    assert!(after.last_checked_at.is_none());

    let sent = h.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "ops@example.com");
    assert!(sent[0].subject.contains("Failure"));
    assert!(sent[0].body.contains("agent exploded"));
    assert!(sent[0].body.contains("Assistant: Report"));
}

#[tokio::test]
async fn completion_notification_is_sent_when_configured() {
    let h = harness();
    h.repository.put_task(task(true)).await.expect("put");
    let dispatched = dispatch_and_take_envelope(&h).await;

    h.sink
        .on_success(&dispatched, json!({"output": "done"}))
        .await
        .expect("callback");

    let sent = h.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].subject.contains("Completion"));
}

#[tokio::test]
async fn missing_session_id_is_reconstructed_best_effort() {
    let h = harness();
    h.repository.put_task(task(false)).await.expect("put");
    let mut dispatched = dispatch_and_take_envelope(&h).await;
    dispatched.session_id = None;

    h.sink
        .on_success(&dispatched, json!({}))
        .await
        .expect("callback");

    let after = h
        .repository
        .get_task(&TaskKey::new("u@example.com", "T"))
        .await
        .expect("get")
        .expect("task");
    // A fresh entry appears (its reconstructed id differs from the
    // dispatch-time id) and it carries the task-scoped prefix.
    assert!(after
        .logs
        .iter()
        .any(|entry| entry.status == ExecutionStatus::Success
            && entry.execution_id.as_str().starts_with("scheduled-task-T-")));
}

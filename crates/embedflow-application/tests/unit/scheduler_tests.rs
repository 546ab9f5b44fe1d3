//! Scheduler scenarios: claim races, date windows, credential failures,
//! tick reports.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use embedflow_application::{SchedulerTick, TaskDispatcher};
use embedflow_domain::entities::{ApiKeyRecord, DateRange, ExecutionStatus, ScheduledTask};
use embedflow_domain::ports::providers::{QueueProvider, TaskRepository};
use embedflow_domain::value_objects::TaskKey;
use embedflow_providers::api_keys::InMemoryApiKeyResolver;
use embedflow_providers::coordination::InMemoryTaskRepository;
use embedflow_providers::object_store::InMemoryObjectStore;
use embedflow_providers::queue::InMemoryQueue;

use crate::utils::NullEventBus;

fn utc(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .expect("valid timestamp")
        .with_timezone(&Utc)
}

fn task() -> ScheduledTask {
    ScheduledTask {
        user: "u@example.com".into(),
        task_id: "T".into(),
        task_name: "report refresh".to_owned(),
        description: Some("refresh the weekly report".to_owned()),
        cron_expression: Some("*/15 * * * *".to_owned()),
        time_zone: Some("America/Chicago".to_owned()),
        date_range: None,
        active: true,
        created_at: Some(utc("2025-01-01T00:00:00Z")),
        // 11:30 CT on a January day (CST, UTC-6).
        last_run_at: Some(utc("2025-01-15T17:30:00Z")),
        last_checked_at: None,
        last_check_run_id: None,
        logs: vec![],
        api_key_id: Some("k1".to_owned()),
        object_info: Some(serde_json::json!({"objectId": "a1", "objectName": "Report"})),
        task_type: None,
        task_instructions: Some("refresh it".to_owned()),
        notify_on_completion: false,
        notify_on_failure: false,
        notify_email_addresses: vec![],
    }
}

struct Harness {
    repository: Arc<InMemoryTaskRepository>,
    api_keys: Arc<InMemoryApiKeyResolver>,
    agent_queue: Arc<InMemoryQueue>,
    scheduler: SchedulerTick,
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
    let dispatcher = Arc::new(TaskDispatcher::new(
        Arc::clone(&repository) as Arc<dyn TaskRepository>,
        Arc::clone(&api_keys) as Arc<dyn embedflow_domain::ports::providers::ApiKeyResolver>,
        Arc::clone(&agent_queue) as Arc<dyn QueueProvider>,
        Arc::new(NullEventBus),
    ));
    let scheduler = SchedulerTick::new(
        Arc::clone(&repository) as Arc<dyn TaskRepository>,
        dispatcher,
        Arc::new(NullEventBus),
        "America/Chicago",
    );
    Harness {
        repository,
        api_keys,
        agent_queue,
        scheduler,
    }
}

#[tokio::test]
async fn concurrent_ticks_claim_an_instance_exactly_once() {
    let h = harness();
    h.repository.put_task(task()).await.expect("put");

    let now = utc("2025-01-15T18:00:00Z");
    // Two scheduler processes tick at the same instant: one claim wins,
    // one queue message is produced.
    let first = h.scheduler.run_at(now).await;
    let second = h.scheduler.run_at(now).await;

    assert_eq!(first.body.tasks_count, Some(1));
    assert_eq!(first.body.successful, Some(1));
    assert_eq!(second.body.tasks_count, Some(0));
    assert_eq!(h.agent_queue.pending_len(), 1);

    let stored = h
        .repository
        .get_task(&TaskKey::new("u@example.com", "T"))
        .await
        .expect("get")
        .expect("task");
    assert_eq!(stored.last_checked_at, Some(now));
    assert!(stored.last_check_run_id.is_some());
}

#[tokio::test]
async fn dispatched_envelope_carries_task_and_credentials() {
    let h = harness();
    h.repository.put_task(task()).await.expect("put");

    h.scheduler.run_at(utc("2025-01-15T18:00:00Z")).await;

    let message = h
        .agent_queue
        .receive(1)
        .await
        .expect("receive")
        .pop()
        .expect("message");
    let envelope: serde_json::Value = serde_json::from_str(&message.body).expect("json");
    assert_eq!(envelope["source"], "scheduled-task");
    assert_eq!(envelope["taskData"]["taskId"], "T");
    assert_eq!(envelope["taskData"]["apiKey"], "secret");
    assert!(envelope["taskData"]["sessionId"]
        .as_str()
        .expect("session id")
        .starts_with("scheduled-task-T-"));

    // The dispatch recorded a running entry keyed by the session id.
    let stored = h
        .repository
        .get_task(&TaskKey::new("u@example.com", "T"))
        .await
        .expect("get")
        .expect("task");
    assert_eq!(stored.logs.len(), 1);
    assert_eq!(stored.logs[0].status, ExecutionStatus::Running);
    assert_eq!(
        stored.logs[0].execution_id.as_str(),
        envelope["taskData"]["sessionId"].as_str().expect("id")
    );
    assert!(stored.logs[0].start_time.is_some());
}

#[tokio::test]
async fn tasks_outside_their_date_range_are_skipped() {
    let h = harness();
    let mut t = task();
    t.date_range = Some(DateRange {
        start_date: Some("2025-02-01".to_owned()),
        end_date: None,
    });
    h.repository.put_task(t).await.expect("put");

    let report = h.scheduler.run_at(utc("2025-01-15T18:00:00Z")).await;
    assert_eq!(report.body.tasks_count, Some(0));
    assert_eq!(report.body.message, "No tasks to execute");
    assert_eq!(h.agent_queue.pending_len(), 0);
}

#[tokio::test]
async fn tasks_without_cron_or_base_time_are_skipped() {
    let h = harness();

    let mut no_cron = task();
    no_cron.task_id = "no-cron".into();
    no_cron.cron_expression = None;
    h.repository.put_task(no_cron).await.expect("put");

    let mut no_base = task();
    no_base.task_id = "no-base".into();
    no_base.created_at = None;
    no_base.last_run_at = None;
    h.repository.put_task(no_base).await.expect("put");

    let report = h.scheduler.run_at(utc("2025-01-15T18:00:00Z")).await;
    assert_eq!(report.body.tasks_count, Some(0));
}

#[tokio::test]
async fn inactive_tasks_are_not_scanned() {
    let h = harness();
    let mut t = task();
    t.active = false;
    h.repository.put_task(t).await.expect("put");

    let report = h.scheduler.run_at(utc("2025-01-15T18:00:00Z")).await;
    assert_eq!(report.body.tasks_count, Some(0));
}

#[tokio::test]
async fn credential_failure_records_a_failure_entry_and_keeps_the_claim() {
    let h = harness();
    h.api_keys.insert(ApiKeyRecord {
        id: "k1".to_owned(),
        api_key: "secret".to_owned(),
        active: false,
        expires_at: None,
        rate_limited: false,
        owner: None,
    });
    h.repository.put_task(task()).await.expect("put");

    let now = utc("2025-01-15T18:00:00Z");
    let report = h.scheduler.run_at(now).await;

    assert_eq!(report.body.tasks_count, Some(1));
    assert_eq!(report.body.successful, Some(0));
    assert_eq!(report.body.failed, Some(1));
    assert_eq!(h.agent_queue.pending_len(), 0);

    let stored = h
        .repository
        .get_task(&TaskKey::new("u@example.com", "T"))
        .await
        .expect("get")
        .expect("task");
    assert_eq!(stored.logs.len(), 1);
    assert_eq!(stored.logs[0].status, ExecutionStatus::Failure);
    // The claim is not released; the next cron fire retries.
    assert_eq!(stored.last_checked_at, Some(now));
}

#[tokio::test]
async fn invalid_timezone_falls_back_to_the_default() {
    let h = harness();
    let mut t = task();
    t.time_zone = Some("Not/AZone".to_owned());
    h.repository.put_task(t).await.expect("put");

    // The default is America/Chicago, so projection still finds the
    // 11:45 CT instance.
    let report = h.scheduler.run_at(utc("2025-01-15T18:00:00Z")).await;
    assert_eq!(report.body.tasks_count, Some(1));
}

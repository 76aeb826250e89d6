use std::time::Duration;

use tokio::sync::broadcast::error::TryRecvError;

use super::mock_api::{MockApi, board, task};
use super::*;
use crate::model::{NewTask, TaskStatus};
use crate::status::{ResourceStatus, StatusKind};
use crate::store::StoreEvent;

fn pipeline(api: &Arc<MockApi>) -> Pipeline {
    Pipeline::new(api.clone(), &ClientConfig::default())
}

fn new_task(board_id: i64, title: &str) -> NewTask {
    NewTask { title: title.into(), board_id, status: TaskStatus::Todo, description: String::new() }
}

/// Status transitions recorded for `resource` since `rx` subscribed.
fn drain_statuses(
    rx: &mut tokio::sync::broadcast::Receiver<StoreEvent>,
    resource: Resource,
) -> Vec<ResourceStatus> {
    let mut seen = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(StoreEvent::Status { resource: r, status }) if r == resource => seen.push(status),
            Ok(_) => {}
            Err(TryRecvError::Empty | TryRecvError::Closed) => return seen,
            Err(TryRecvError::Lagged(n)) => panic!("lagged by {n}"),
        }
    }
}

// =============================================================================
// SETTLEMENT
// =============================================================================

#[test]
fn settlement_helpers() {
    assert!(Settlement::Succeeded.is_succeeded());
    assert!(!Settlement::Superseded.is_succeeded());

    let failed = Settlement::Failed(ApiError::NotFound("Task not found".into()));
    assert!(failed.is_failed());
    assert_eq!(failed.error().map(ToString::to_string).as_deref(), Some("Task not found"));
    assert!(Settlement::Succeeded.error().is_none());
}

#[test]
fn connect_builds_http_pipeline() {
    let config = ClientConfig { api_url: "http://127.0.0.1:1/api".into(), ..ClientConfig::default() };
    assert!(Pipeline::connect(&config).is_ok());
}

// =============================================================================
// STATUS
// =============================================================================

#[tokio::test]
async fn successful_operation_emits_loading_then_succeeded() {
    let api = Arc::new(MockApi::new(vec![board(1, "Alpha", Vec::new())], 99));
    let pipeline = pipeline(&api);
    assert!(pipeline.fetch_boards().await.is_succeeded());

    let mut rx = pipeline.store().read().await.subscribe();
    assert!(pipeline.create_task(new_task(1, "Write docs")).await.is_succeeded());

    let kinds: Vec<StatusKind> =
        drain_statuses(&mut rx, Resource::TaskMutation).into_iter().map(|s| s.kind).collect();
    assert_eq!(kinds, vec![StatusKind::Loading, StatusKind::Succeeded]);
}

#[tokio::test]
async fn failed_operation_emits_loading_then_failed_once() {
    let api = Arc::new(MockApi::new(vec![board(1, "Alpha", vec![task(7, 1, "Old")])], 99));
    let pipeline = pipeline(&api);
    assert!(pipeline.fetch_boards().await.is_succeeded());
    api.fail_next("update_task_field", ApiError::NotFound("Task not found".into()));

    let mut rx = pipeline.store().read().await.subscribe();
    assert!(pipeline.edit_task_title(7, "New").await.is_failed());

    let statuses = drain_statuses(&mut rx, Resource::TaskMutation);
    assert_eq!(statuses.len(), 2);
    assert_eq!(statuses[0], ResourceStatus { kind: StatusKind::Loading, error: None });
    assert_eq!(
        statuses[1],
        ResourceStatus { kind: StatusKind::Failed, error: Some("Task not found".into()) }
    );
}

#[tokio::test]
async fn resources_are_tracked_independently() {
    let api = Arc::new(MockApi::new(vec![board(1, "Alpha", Vec::new())], 99));
    let pipeline = pipeline(&api);
    assert!(pipeline.fetch_boards().await.is_succeeded());
    assert!(pipeline.create_task(new_task(1, "")).await.is_failed());

    let store = pipeline.store();
    let store = store.read().await;
    assert_eq!(store.status(Resource::Boards).kind, StatusKind::Succeeded);
    assert_eq!(store.status(Resource::TaskMutation).kind, StatusKind::Failed);
    assert_eq!(store.status(Resource::BoardDetail).kind, StatusKind::Idle);
}

#[tokio::test(start_paused = true)]
async fn terminal_status_decays_to_idle() {
    let api = Arc::new(MockApi::new(vec![board(1, "Alpha", Vec::new())], 99));
    let pipeline = pipeline(&api);
    assert!(pipeline.fetch_boards().await.is_succeeded());

    tokio::time::sleep(Duration::from_millis(2500)).await;
    assert_eq!(pipeline.store().read().await.status(Resource::Boards).kind, StatusKind::Succeeded);

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(pipeline.store().read().await.status(Resource::Boards).kind, StatusKind::Idle);
}

#[tokio::test(start_paused = true)]
async fn new_operation_restarts_the_decay_window() {
    let api = Arc::new(MockApi::new(vec![board(1, "Alpha", Vec::new())], 99));
    let pipeline = pipeline(&api);
    assert!(pipeline.fetch_boards().await.is_succeeded());

    tokio::time::sleep(Duration::from_millis(2000)).await;
    api.fail_next("list_boards", ApiError::Transport("connection refused".into()));
    assert!(pipeline.fetch_boards().await.is_failed());

    // The first timer would have fired here.
    tokio::time::sleep(Duration::from_millis(1500)).await;
    let store = pipeline.store();
    assert_eq!(store.read().await.status(Resource::Boards).kind, StatusKind::Failed);

    tokio::time::sleep(Duration::from_millis(1600)).await;
    let status = store.read().await.status(Resource::Boards).clone();
    assert_eq!(status, ResourceStatus::default());
}

// =============================================================================
// ENTITY LOCKS
// =============================================================================

#[tokio::test]
async fn entity_locks_are_dropped_after_use() {
    let locks = EntityLocks::default();
    {
        let _a = locks.acquire(EntityKey::Task(1)).await;
        let _b = locks.acquire(EntityKey::Task(2)).await;
        assert_eq!(locks.len(), 2);
    }
    assert_eq!(locks.len(), 0);
}

#[tokio::test]
async fn entity_lock_serializes_holders() {
    let locks = EntityLocks::default();
    let first = locks.acquire(EntityKey::Board(5)).await;

    let waiter = {
        let locks = locks.clone();
        tokio::spawn(async move {
            let _guard = locks.acquire(EntityKey::Board(5)).await;
        })
    };
    tokio::task::yield_now().await;
    assert!(!waiter.is_finished());

    drop(first);
    waiter.await.expect("waiter panicked");
    assert_eq!(locks.len(), 0);
}

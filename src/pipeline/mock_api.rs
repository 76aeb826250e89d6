//! In-memory [`BoardApi`] for pipeline tests.
//!
//! Keeps a tiny fake server, records every call, can fail scripted calls, and
//! can hold responses at a gate so a test can look at optimistic state before
//! the request settles. Responses are computed when the call arrives, before
//! the gate, so a held response carries the data of that moment.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{Semaphore, watch};

use crate::api::{ApiError, BoardApi};
use crate::model::{Board, BoardId, NewTask, Task, TaskField, TaskId, TaskStatus};

#[derive(Default)]
pub(crate) struct Server {
    pub(crate) boards: Vec<Board>,
    next_id: i64,
}

impl Server {
    fn board_mut(&mut self, id: BoardId) -> Result<&mut Board, ApiError> {
        self.boards
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| ApiError::NotFound("Board not found".into()))
    }

    fn task_mut(&mut self, id: TaskId) -> Result<&mut Task, ApiError> {
        self.boards
            .iter_mut()
            .flat_map(|b| b.tasks.iter_mut())
            .find(|t| t.id == id)
            .ok_or_else(|| ApiError::NotFound("Task not found".into()))
    }

    pub(crate) fn task(&self, id: TaskId) -> Option<&Task> {
        self.boards.iter().flat_map(|b| b.tasks.iter()).find(|t| t.id == id)
    }

    fn take_task(&mut self, id: TaskId) -> Result<Task, ApiError> {
        for board in &mut self.boards {
            if let Some(pos) = board.tasks.iter().position(|t| t.id == id) {
                return Ok(board.tasks.remove(pos));
            }
        }
        Err(ApiError::NotFound("Task not found".into()))
    }

    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

pub(crate) struct MockApi {
    server: Mutex<Server>,
    failures: Mutex<HashMap<&'static str, VecDeque<ApiError>>>,
    calls: Mutex<Vec<&'static str>>,
    seen: watch::Sender<usize>,
    held: AtomicBool,
    permits: Semaphore,
}

pub(crate) fn board(id: BoardId, title: &str, tasks: Vec<Task>) -> Board {
    Board { id, title: title.into(), created_at: None, updated_at: None, tasks, is_temp: false }
}

pub(crate) fn task(id: TaskId, board_id: BoardId, title: &str) -> Task {
    Task {
        id,
        title: title.into(),
        description: String::new(),
        status: TaskStatus::Todo,
        board_id,
        created_at: None,
        updated_at: None,
        is_temp: false,
    }
}

impl MockApi {
    /// Server ids handed out by creates start after `last_id`.
    pub(crate) fn new(boards: Vec<Board>, last_id: i64) -> Self {
        let (seen, _) = watch::channel(0);
        Self {
            server: Mutex::new(Server { boards, next_id: last_id }),
            failures: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            seen,
            held: AtomicBool::new(false),
            permits: Semaphore::new(0),
        }
    }

    pub(crate) fn empty() -> Self {
        Self::new(Vec::new(), 99)
    }

    /// Fail the next call to `method` with `error`. Queued per method.
    pub(crate) fn fail_next(&self, method: &'static str, error: ApiError) {
        self.failures.lock().unwrap().entry(method).or_default().push_back(error);
    }

    pub(crate) fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub(crate) fn with_server<R>(&self, f: impl FnOnce(&mut Server) -> R) -> R {
        f(&mut *self.server.lock().unwrap())
    }

    /// Hold every later response at the gate until released.
    pub(crate) fn hold(&self) {
        self.held.store(true, Ordering::SeqCst);
    }

    /// Stop holding new responses. Already-held ones still need `release`.
    pub(crate) fn open(&self) {
        self.held.store(false, Ordering::SeqCst);
    }

    /// Let `n` held responses through, oldest first.
    pub(crate) fn release(&self, n: usize) {
        self.permits.add_permits(n);
    }

    pub(crate) async fn wait_for_calls(&self, n: usize) {
        let mut rx = self.seen.subscribe();
        rx.wait_for(|seen| *seen >= n).await.expect("mock dropped");
    }

    fn respond<T>(&self, method: &'static str, f: impl FnOnce(&mut Server) -> Result<T, ApiError>) -> Result<T, ApiError> {
        self.calls.lock().unwrap().push(method);
        let failure = self
            .failures
            .lock()
            .unwrap()
            .get_mut(method)
            .and_then(VecDeque::pop_front);
        let result = match failure {
            Some(e) => Err(e),
            None => f(&mut *self.server.lock().unwrap()),
        };
        self.seen.send_modify(|seen| *seen += 1);
        result
    }

    async fn call<T>(&self, method: &'static str, f: impl FnOnce(&mut Server) -> Result<T, ApiError>) -> Result<T, ApiError> {
        let held = self.held.load(Ordering::SeqCst);
        let result = self.respond(method, f);
        if held {
            self.permits.acquire().await.expect("gate closed").forget();
        }
        result
    }
}

#[async_trait::async_trait]
impl BoardApi for MockApi {
    async fn list_boards(&self) -> Result<Vec<Board>, ApiError> {
        self.call("list_boards", |s| Ok(s.boards.clone())).await
    }

    async fn get_board(&self, id: BoardId) -> Result<Board, ApiError> {
        self.call("get_board", |s| s.board_mut(id).map(|b| b.clone())).await
    }

    async fn create_board(&self, title: &str) -> Result<Board, ApiError> {
        self.call("create_board", |s| {
            let created = board(s.next_id(), title, Vec::new());
            s.boards.push(created.clone());
            Ok(created)
        })
        .await
    }

    async fn update_board_title(&self, id: BoardId, title: &str) -> Result<Board, ApiError> {
        self.call("update_board_title", |s| {
            let board = s.board_mut(id)?;
            board.title = title.to_owned();
            // The title endpoint answers without the task list.
            Ok(Board { tasks: Vec::new(), ..board.clone() })
        })
        .await
    }

    async fn update_board(&self, update: &Board) -> Result<Board, ApiError> {
        self.call("update_board", |s| {
            let board = s.board_mut(update.id)?;
            board.apply_header(update);
            Ok(board.clone())
        })
        .await
    }

    async fn delete_board(&self, id: BoardId) -> Result<(), ApiError> {
        self.call("delete_board", |s| {
            s.board_mut(id)?;
            s.boards.retain(|b| b.id != id);
            Ok(())
        })
        .await
    }

    async fn get_task(&self, id: TaskId) -> Result<Task, ApiError> {
        self.call("get_task", |s| s.task_mut(id).map(|t| t.clone())).await
    }

    async fn create_task(&self, new_task: &NewTask) -> Result<Task, ApiError> {
        self.call("create_task", |s| {
            let id = s.next_id();
            let board = s.board_mut(new_task.board_id)?;
            let created = Task {
                id,
                title: new_task.title.clone(),
                description: new_task.description.clone(),
                status: new_task.status,
                board_id: new_task.board_id,
                created_at: None,
                updated_at: None,
                is_temp: false,
            };
            board.tasks.push(created.clone());
            Ok(created)
        })
        .await
    }

    async fn update_task(&self, update: &Task) -> Result<Task, ApiError> {
        self.call("update_task", |s| {
            let mut task = s.take_task(update.id)?;
            task.apply_fields(update);
            let board = s.board_mut(task.board_id)?;
            board.tasks.push(task.clone());
            Ok(task)
        })
        .await
    }

    async fn update_task_field(&self, id: TaskId, field: &TaskField) -> Result<Task, ApiError> {
        self.call("update_task_field", |s| {
            let task = s.task_mut(id)?;
            field.apply_to(task);
            Ok(task.clone())
        })
        .await
    }

    async fn move_task(&self, id: TaskId, board_id: BoardId) -> Result<Task, ApiError> {
        self.call("move_task", |s| {
            s.board_mut(board_id)?;
            let mut task = s.take_task(id)?;
            task.board_id = board_id;
            s.board_mut(board_id)?.tasks.push(task.clone());
            Ok(task)
        })
        .await
    }

    async fn delete_task(&self, id: TaskId) -> Result<(), ApiError> {
        self.call("delete_task", |s| s.take_task(id).map(|_| ())).await
    }
}

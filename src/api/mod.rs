//! Remote API adapter — the REST contract the core consumes.
//!
//! DESIGN
//! ======
//! `BoardApi` is the seam between the mutation pipeline and the network.
//! `HttpBoardApi` speaks the real REST surface; tests substitute a scripted
//! implementation. Every call either yields a parsed entity or an `ApiError`
//! whose `Display` text is the message shown to the user.
//!
//! ERROR HANDLING
//! ==============
//! Non-2xx responses are classified by status (400 → validation, 404 → not
//! found, anything else → server). The `{ "error": ... }` body supplies the
//! message when present; otherwise the endpoint's fallback text is used.

pub mod http;

use crate::model::{Board, BoardId, NewTask, Task, TaskField, TaskId};

pub use http::HttpBoardApi;

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// Missing or malformed input, detected locally or reported as a 400.
    #[error("{0}")]
    Validation(String),
    /// The entity does not exist server-side.
    #[error("{0}")]
    NotFound(String),
    /// Any other non-2xx status.
    #[error("{message}")]
    Server { status: u16, message: String },
    /// The request never produced a response.
    #[error("{0}")]
    Transport(String),
    /// A 2xx response whose body could not be parsed.
    #[error("{0}")]
    Decode(String),
}

impl ApiError {
    /// Classify a non-2xx status. `message` is the server's `error` field, if any.
    #[must_use]
    pub fn from_status(status: u16, message: Option<String>, endpoint: Endpoint) -> Self {
        let message = message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| endpoint.fallback_message().to_owned());
        match status {
            400 => Self::Validation(message),
            404 => Self::NotFound(message),
            _ => Self::Server { status, message },
        }
    }

    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

// =============================================================================
// ENDPOINTS
// =============================================================================

/// Every call the adapter makes, used for fallback messages and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    ListBoards,
    GetBoard,
    CreateBoard,
    UpdateBoardTitle,
    UpdateBoard,
    DeleteBoard,
    GetTask,
    CreateTask,
    UpdateTask,
    UpdateTaskField,
    MoveTask,
    DeleteTask,
}

impl Endpoint {
    #[must_use]
    pub fn fallback_message(self) -> &'static str {
        match self {
            Self::ListBoards => "Failed to fetch boards",
            Self::GetBoard => "Failed to fetch board",
            Self::CreateBoard => "Failed to create board",
            Self::UpdateBoardTitle => "Failed to update board title",
            Self::UpdateBoard => "Failed to update board",
            Self::DeleteBoard => "Failed to delete board",
            Self::GetTask => "Failed to fetch task",
            Self::CreateTask => "Failed to create task",
            Self::UpdateTask => "Failed to update task",
            Self::UpdateTaskField => "Failed to update task field",
            Self::MoveTask => "Failed to update task board id",
            Self::DeleteTask => "Failed to delete task",
        }
    }
}

// =============================================================================
// TRAIT
// =============================================================================

/// Board/task CRUD against the remote server. Enables mocking in tests.
#[async_trait::async_trait]
pub trait BoardApi: Send + Sync {
    async fn list_boards(&self) -> Result<Vec<Board>, ApiError>;

    async fn get_board(&self, id: BoardId) -> Result<Board, ApiError>;

    async fn create_board(&self, title: &str) -> Result<Board, ApiError>;

    async fn update_board_title(&self, id: BoardId, title: &str) -> Result<Board, ApiError>;

    async fn update_board(&self, board: &Board) -> Result<Board, ApiError>;

    async fn delete_board(&self, id: BoardId) -> Result<(), ApiError>;

    async fn get_task(&self, id: TaskId) -> Result<Task, ApiError>;

    async fn create_task(&self, task: &NewTask) -> Result<Task, ApiError>;

    async fn update_task(&self, task: &Task) -> Result<Task, ApiError>;

    async fn update_task_field(&self, id: TaskId, field: &TaskField) -> Result<Task, ApiError>;

    async fn move_task(&self, id: TaskId, board_id: BoardId) -> Result<Task, ApiError>;

    async fn delete_task(&self, id: TaskId) -> Result<(), ApiError>;
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;

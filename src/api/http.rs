//! `reqwest`-backed implementation of [`BoardApi`].
//!
//! Thin wrapper over the REST routes. Status classification and body parsing
//! live in free functions so they can be exercised without a server.

use std::time::Duration;

use reqwest::Method;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{ApiError, BoardApi, Endpoint};
use crate::config::{ClientConfig, HttpTimeouts};
use crate::model::{Board, BoardId, NewTask, Task, TaskField, TaskId};

// =============================================================================
// CLIENT
// =============================================================================

#[derive(Clone)]
pub struct HttpBoardApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpBoardApi {
    /// # Errors
    ///
    /// Returns [`ApiError::Transport`] if the HTTP client cannot be constructed.
    pub fn new(base_url: &str, timeouts: HttpTimeouts) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| ApiError::Transport(format!("HTTP client build failed: {e}")))?;
        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_owned() })
    }

    /// # Errors
    ///
    /// Returns [`ApiError::Transport`] if the HTTP client cannot be constructed.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        Self::new(&config.api_url, config.timeouts)
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn execute(
        &self,
        endpoint: Endpoint,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<(u16, String), ApiError> {
        let url = format!("{}{path}", self.base_url);
        debug!(?endpoint, %method, %url, "api request");

        let request = self.http.request(method, &url);
        let request = if let Some(json) = body { request.json(&json) } else { request };

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        if !(200..300).contains(&status) {
            return Err(ApiError::from_status(status, error_message(&text), endpoint));
        }
        Ok((status, text))
    }

    async fn request<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<T, ApiError> {
        let (_, text) = self.execute(endpoint, method, path, body).await?;
        parse_body(&text)
    }

    async fn request_empty(&self, endpoint: Endpoint, method: Method, path: &str) -> Result<(), ApiError> {
        self.execute(endpoint, method, path, None).await.map(|_| ())
    }
}

// =============================================================================
// PARSING
// =============================================================================

#[derive(serde::Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// Pull the `error` field out of a failure body, if it has one.
fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body).ok().and_then(|b| b.error)
}

fn parse_body<T: DeserializeOwned>(text: &str) -> Result<T, ApiError> {
    serde_json::from_str(text).map_err(|e| ApiError::Decode(format!("malformed response: {e}")))
}

fn to_body<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::Decode(e.to_string()))
}

// =============================================================================
// TRAIT IMPL
// =============================================================================

#[async_trait::async_trait]
impl BoardApi for HttpBoardApi {
    async fn list_boards(&self) -> Result<Vec<Board>, ApiError> {
        self.request(Endpoint::ListBoards, Method::GET, "/boards", None).await
    }

    async fn get_board(&self, id: BoardId) -> Result<Board, ApiError> {
        self.request(Endpoint::GetBoard, Method::GET, &format!("/boards/{id}"), None)
            .await
    }

    async fn create_board(&self, title: &str) -> Result<Board, ApiError> {
        let body = serde_json::json!({ "title": title });
        self.request(Endpoint::CreateBoard, Method::POST, "/boards", Some(body))
            .await
    }

    async fn update_board_title(&self, id: BoardId, title: &str) -> Result<Board, ApiError> {
        let body = serde_json::json!({ "title": title });
        self.request(Endpoint::UpdateBoardTitle, Method::PATCH, &format!("/boards/{id}/title"), Some(body))
            .await
    }

    async fn update_board(&self, board: &Board) -> Result<Board, ApiError> {
        let body = to_body(board)?;
        self.request(Endpoint::UpdateBoard, Method::PATCH, &format!("/boards/{}", board.id), Some(body))
            .await
    }

    async fn delete_board(&self, id: BoardId) -> Result<(), ApiError> {
        self.request_empty(Endpoint::DeleteBoard, Method::DELETE, &format!("/boards/{id}"))
            .await
    }

    async fn get_task(&self, id: TaskId) -> Result<Task, ApiError> {
        self.request(Endpoint::GetTask, Method::GET, &format!("/tasks/{id}"), None)
            .await
    }

    async fn create_task(&self, task: &NewTask) -> Result<Task, ApiError> {
        let body = to_body(task)?;
        self.request(Endpoint::CreateTask, Method::POST, "/tasks", Some(body))
            .await
    }

    async fn update_task(&self, task: &Task) -> Result<Task, ApiError> {
        let body = to_body(task)?;
        self.request(Endpoint::UpdateTask, Method::PATCH, &format!("/tasks/{}", task.id), Some(body))
            .await
    }

    async fn update_task_field(&self, id: TaskId, field: &TaskField) -> Result<Task, ApiError> {
        let path = format!("/tasks/{id}/{}", field.path_segment());
        self.request(Endpoint::UpdateTaskField, Method::PATCH, &path, Some(field.body()))
            .await
    }

    async fn move_task(&self, id: TaskId, board_id: BoardId) -> Result<Task, ApiError> {
        let body = serde_json::json!({ "boardId": board_id });
        self.request(Endpoint::MoveTask, Method::PATCH, &format!("/tasks/{id}/board"), Some(body))
            .await
    }

    async fn delete_task(&self, id: TaskId) -> Result<(), ApiError> {
        self.request_empty(Endpoint::DeleteTask, Method::DELETE, &format!("/tasks/{id}"))
            .await
    }
}

#[cfg(test)]
#[path = "http_test.rs"]
mod tests;

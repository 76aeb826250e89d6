//! Board and task entities as they travel over the wire and live in the store.
//!
//! DESIGN
//! ======
//! Field names follow the REST contract (camelCase JSON). Server ids are
//! positive; temp ids handed out by the store are negative, so a placeholder
//! can never be mistaken for a canonical entity.

use serde::{Deserialize, Serialize};

use crate::api::ApiError;

pub type BoardId = i64;
pub type TaskId = i64;

// =============================================================================
// TASK
// =============================================================================

/// Column a task sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    pub const ALL: [Self; 3] = [Self::Todo, Self::InProgress, Self::Done];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "TODO",
            Self::InProgress => "IN_PROGRESS",
            Self::Done => "DONE",
        }
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "TODO" => Ok(Self::Todo),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "DONE" => Ok(Self::Done),
            other => Err(format!("unknown task status: {other}")),
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: TaskStatus,
    pub board_id: BoardId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_temp: bool,
}

impl Task {
    /// Copy the user-editable fields of `other` onto `self`.
    pub fn apply_fields(&mut self, other: &Task) {
        self.title.clone_from(&other.title);
        self.description.clone_from(&other.description);
        self.status = other.status;
        self.board_id = other.board_id;
    }

    #[must_use]
    pub fn same_fields(&self, other: &Task) -> bool {
        self.title == other.title
            && self.description == other.description
            && self.status == other.status
            && self.board_id == other.board_id
    }
}

/// Body of `POST /tasks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    pub board_id: BoardId,
    pub status: TaskStatus,
    pub description: String,
}

impl NewTask {
    /// Client-side mirror of the server's 400 rules for task creation.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] when the title is blank or the board id
    /// is not a real server id.
    pub fn validate(&self) -> Result<(), ApiError> {
        validate_title(&self.title)?;
        if self.board_id == 0 {
            return Err(ApiError::Validation("Board ID is required".into()));
        }
        Ok(())
    }
}

/// A single-field task edit, sent to `PATCH /tasks/:id/{field}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskField {
    Title(String),
    Status(TaskStatus),
    Description(String),
}

impl TaskField {
    /// Path segment of the field endpoint.
    #[must_use]
    pub fn path_segment(&self) -> &'static str {
        match self {
            Self::Title(_) => "title",
            Self::Status(_) => "status",
            Self::Description(_) => "description",
        }
    }

    #[must_use]
    pub fn body(&self) -> serde_json::Value {
        match self {
            Self::Title(title) => serde_json::json!({ "title": title }),
            Self::Status(status) => serde_json::json!({ "status": status }),
            Self::Description(description) => serde_json::json!({ "description": description }),
        }
    }

    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] for a blank title or an empty description.
    pub fn validate(&self) -> Result<(), ApiError> {
        match self {
            Self::Title(title) => validate_title(title),
            Self::Status(_) => Ok(()),
            Self::Description(description) => {
                if description.is_empty() {
                    Err(ApiError::Validation("Description is required".into()))
                } else {
                    Ok(())
                }
            }
        }
    }

    pub fn apply_to(&self, task: &mut Task) {
        match self {
            Self::Title(title) => task.title.clone_from(title),
            Self::Status(status) => task.status = *status,
            Self::Description(description) => task.description.clone_from(description),
        }
    }
}

// =============================================================================
// BOARD
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub id: BoardId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_temp: bool,
}

impl Board {
    /// Copy board-level fields (everything except `id` and `tasks`). Missing
    /// timestamps on `other` leave ours alone; the title endpoint omits them.
    pub fn apply_header(&mut self, other: &Board) {
        self.title.clone_from(&other.title);
        if other.created_at.is_some() {
            self.created_at.clone_from(&other.created_at);
        }
        if other.updated_at.is_some() {
            self.updated_at.clone_from(&other.updated_at);
        }
    }

    #[must_use]
    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    #[must_use]
    pub fn tasks_with_status(&self, status: TaskStatus) -> Vec<&Task> {
        self.tasks.iter().filter(|t| t.status == status).collect()
    }
}

/// # Errors
///
/// Returns [`ApiError::Validation`] when `title` is empty or whitespace.
pub fn validate_title(title: &str) -> Result<(), ApiError> {
    if title.trim().is_empty() {
        return Err(ApiError::Validation("Title is required".into()));
    }
    Ok(())
}

#[cfg(test)]
#[path = "model_test.rs"]
mod tests;

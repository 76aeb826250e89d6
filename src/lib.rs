//! Task-board client core: an optimistic mirror of remote boards and tasks.
//!
//! DESIGN
//! ======
//! The [`store::Store`] owns the board/task graph. The [`pipeline::Pipeline`]
//! is its only writer: it applies local changes first, calls the remote
//! [`api::BoardApi`], then reconciles or rolls back. [`status`] tracks request
//! state per resource and [`decay`] returns settled states to idle after a
//! quiet period.

pub mod api;
pub mod config;
pub mod decay;
pub mod model;
pub mod pipeline;
pub mod rollback;
pub mod status;
pub mod store;

pub use api::{ApiError, BoardApi, HttpBoardApi};
pub use config::ClientConfig;
pub use model::{Board, BoardId, NewTask, Task, TaskField, TaskId, TaskStatus};
pub use pipeline::{Pipeline, Settlement};
pub use status::{Resource, ResourceStatus, StatusKind};
pub use store::{SharedStore, Store, StoreEvent};

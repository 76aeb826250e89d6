//! Task operations. Every one of them reports on the task-mutation resource.

use tracing::{debug, info};
use uuid::Uuid;

use super::{Pipeline, Settlement, board_not_found, board_still_creating, task_not_found};
use crate::api::ApiError;
use crate::model::{BoardId, NewTask, Task, TaskField, TaskId, TaskStatus, validate_title};
use crate::status::Resource;
use crate::store::{EntityKey, FetchKey, Reconciled, Store};

const RESOURCE: Resource = Resource::TaskMutation;

/// A write to an existing task.
enum TaskWrite {
    Full(Task),
    Field(TaskField),
    Move(BoardId),
}

impl TaskWrite {
    fn validate(&self) -> Result<(), ApiError> {
        match self {
            Self::Full(task) => validate_title(&task.title),
            Self::Field(field) => field.validate(),
            Self::Move(_) => Ok(()),
        }
    }

    fn apply_to(&self, task: &mut Task) {
        match self {
            Self::Full(full) => task.apply_fields(full),
            Self::Field(field) => field.apply_to(task),
            Self::Move(board_id) => task.board_id = *board_id,
        }
    }

    /// Resolve a temp target board id that has since been reconciled.
    fn resolve(self, store: &Store) -> Self {
        match self {
            Self::Move(board_id) => Self::Move(store.resolve_id(board_id)),
            Self::Full(task) => Self::Full(Task { board_id: store.resolve_id(task.board_id), ..task }),
            field @ Self::Field(_) => field,
        }
    }

    /// The board the write would place the task on, if it changes boards.
    fn target_board(&self) -> Option<BoardId> {
        match self {
            Self::Move(board_id) => Some(*board_id),
            Self::Full(task) => Some(task.board_id),
            Self::Field(_) => None,
        }
    }
}

/// A move target must exist and be known to the server.
fn check_target(store: &Store, write: &TaskWrite) -> Result<(), ApiError> {
    let Some(board_id) = write.target_board() else {
        return Ok(());
    };
    match store.board(board_id) {
        None => Err(board_not_found()),
        Some(board) if board.is_temp => Err(board_still_creating()),
        Some(_) => Ok(()),
    }
}

impl Pipeline {
    // =========================================================================
    // FETCH
    // =========================================================================

    /// Refresh one task in place.
    pub async fn fetch_task(&self, id: TaskId) -> Settlement {
        let id = self.store.read().await.resolve_id(id);
        let key = FetchKey::Task(id);
        let generation = self.begin_fetch(RESOURCE, key).await;
        let result = self.api.get_task(id).await;

        let mut store = self.store.write().await;
        match result {
            Ok(task) => {
                if !store.is_current(key, generation) {
                    debug!(task_id = id, generation, "stale task discarded");
                    return self.supersede_in(&mut store, RESOURCE);
                }
                store.upsert_task(task);
                self.succeed_in(&mut store, RESOURCE)
            }
            Err(e) => self.fail_in(&mut store, RESOURCE, e),
        }
    }

    // =========================================================================
    // CREATE
    // =========================================================================

    /// Append a temp task, create it remotely and swap in the server's copy.
    pub async fn create_task(&self, new_task: NewTask) -> Settlement {
        self.begin(RESOURCE).await;
        if let Err(e) = new_task.validate() {
            return self.fail(RESOURCE, e).await;
        }

        let correlation = Uuid::new_v4();
        let (new_task, temp_id) = {
            let mut store = self.store.write().await;
            let new_task = NewTask { board_id: store.resolve_id(new_task.board_id), ..new_task };
            if store.is_temp_board(new_task.board_id) {
                return self.fail_in(&mut store, RESOURCE, board_still_creating());
            }
            let Some(temp_id) = store.insert_temp_task(&new_task, correlation) else {
                return self.fail_in(&mut store, RESOURCE, board_not_found());
            };
            (new_task, temp_id)
        };
        debug!(%correlation, temp_id, board_id = new_task.board_id, "temp task inserted");

        let canonical = match self.api.create_task(&new_task).await {
            Ok(task) => task,
            Err(e) => {
                let mut store = self.store.write().await;
                store.purge_temp(correlation);
                return self.fail_in(&mut store, RESOURCE, e);
            }
        };
        let id = canonical.id;
        let _guard = self.locks.acquire(EntityKey::Task(id)).await;

        let reconciled = {
            let mut store = self.store.write().await;
            let reconciled = store.reconcile_task(correlation, canonical.clone());
            if matches!(reconciled, Reconciled::Applied { .. }) {
                store.invalidate_fetches(&[
                    FetchKey::Boards,
                    FetchKey::Board(canonical.board_id),
                    FetchKey::Task(id),
                ]);
            }
            reconciled
        };

        match reconciled {
            Reconciled::Abandoned => {
                self.delete_orphan(EntityKey::Task(id)).await;
                self.succeed(RESOURCE).await
            }
            Reconciled::Stale => {
                debug!(task_id = id, "task create already reconciled");
                self.succeed(RESOURCE).await
            }
            Reconciled::Applied { follow_up: None } => {
                info!(task_id = id, temp_id, "task created");
                self.succeed(RESOURCE).await
            }
            Reconciled::Applied { follow_up: Some(edited) } => {
                info!(task_id = id, temp_id, "task created, sending local edits");
                let result = self.api.update_task(&edited).await;
                let mut store = self.store.write().await;
                match result {
                    Ok(updated) => {
                        store.apply_task(Task { is_temp: false, ..updated });
                        self.succeed_in(&mut store, RESOURCE)
                    }
                    Err(e) => {
                        store.apply_task(canonical);
                        self.fail_in(&mut store, RESOURCE, e)
                    }
                }
            }
        }
    }

    // =========================================================================
    // UPDATE
    // =========================================================================

    /// Send every editable field of `task` at once.
    pub async fn update_task(&self, task: &Task) -> Settlement {
        self.write_task(task.id, TaskWrite::Full(task.clone())).await
    }

    /// Edit one field through its dedicated endpoint.
    pub async fn edit_task(&self, id: TaskId, field: TaskField) -> Settlement {
        self.write_task(id, TaskWrite::Field(field)).await
    }

    pub async fn edit_task_title(&self, id: TaskId, title: &str) -> Settlement {
        self.edit_task(id, TaskField::Title(title.to_owned())).await
    }

    pub async fn edit_task_status(&self, id: TaskId, status: TaskStatus) -> Settlement {
        self.edit_task(id, TaskField::Status(status)).await
    }

    pub async fn edit_task_description(&self, id: TaskId, description: &str) -> Settlement {
        self.edit_task(id, TaskField::Description(description.to_owned())).await
    }

    /// Move a task to another board.
    pub async fn move_task(&self, id: TaskId, board_id: BoardId) -> Settlement {
        self.write_task(id, TaskWrite::Move(board_id)).await
    }

    async fn write_task(&self, id: TaskId, write: TaskWrite) -> Settlement {
        self.begin(RESOURCE).await;
        if let Err(e) = write.validate() {
            return self.fail(RESOURCE, e).await;
        }

        let (id, write) = {
            let mut store = self.store.write().await;
            let id = store.resolve_id(id);
            let write = write.resolve(&store);
            if let Err(e) = check_target(&store, &write) {
                return self.fail_in(&mut store, RESOURCE, e);
            }
            let Some(task) = store.task(id) else {
                return self.fail_in(&mut store, RESOURCE, task_not_found());
            };
            if task.is_temp {
                let mut edited = task.clone();
                write.apply_to(&mut edited);
                store.apply_task(edited);
                store.mark_temp_edited(EntityKey::Task(id));
                debug!(task_id = id, "temp task edited locally");
                return self.succeed_in(&mut store, RESOURCE);
            }
            (id, write)
        };

        let _guard = self.locks.acquire(EntityKey::Task(id)).await;
        let origin = {
            let mut store = self.store.write().await;
            // The target may have gone away while we waited for the lock.
            if let Err(e) = check_target(&store, &write) {
                return self.fail_in(&mut store, RESOURCE, e);
            }
            let Some(current) = store.snapshot_task(id) else {
                return self.fail_in(&mut store, RESOURCE, task_not_found());
            };
            let mut edited = current.clone();
            write.apply_to(&mut edited);
            store.apply_task(edited);
            current.board_id
        };

        let result = match &write {
            TaskWrite::Full(task) => self.api.update_task(&Task { id, ..task.clone() }).await,
            TaskWrite::Field(field) => self.api.update_task_field(id, field).await,
            TaskWrite::Move(board_id) => self.api.move_task(id, *board_id).await,
        };

        let mut store = self.store.write().await;
        match result {
            Ok(canonical) => {
                store.clear_task_snapshot(id);
                let destination = canonical.board_id;
                store.apply_task(Task { is_temp: false, ..canonical });
                store.invalidate_fetches(&[
                    FetchKey::Boards,
                    FetchKey::Board(origin),
                    FetchKey::Board(destination),
                    FetchKey::Task(id),
                ]);
                self.succeed_in(&mut store, RESOURCE)
            }
            Err(e) => {
                store.restore_task(id);
                debug!(task_id = id, "task edit rolled back");
                self.fail_in(&mut store, RESOURCE, e)
            }
        }
    }

    // =========================================================================
    // DELETE
    // =========================================================================

    /// Remove a task optimistically. A failed delete appends it back to its board.
    pub async fn delete_task(&self, id: TaskId) -> Settlement {
        self.begin(RESOURCE).await;

        let id = {
            let mut store = self.store.write().await;
            let id = store.resolve_id(id);
            match store.task(id).map(|t| t.is_temp) {
                None => return self.fail_in(&mut store, RESOURCE, task_not_found()),
                Some(true) => {
                    store.remove_task(id);
                    debug!(task_id = id, "temp task removed before its create settled");
                    return self.succeed_in(&mut store, RESOURCE);
                }
                Some(false) => id,
            }
        };

        let _guard = self.locks.acquire(EntityKey::Task(id)).await;
        let removed = self.store.write().await.remove_task(id);
        let Some(removed) = removed else {
            return self.fail(RESOURCE, task_not_found()).await;
        };
        let board_id = removed.board_id;

        let result = self.api.delete_task(id).await;
        let mut store = self.store.write().await;
        match result {
            Ok(()) => {
                store.invalidate_fetches(&[FetchKey::Boards, FetchKey::Board(board_id), FetchKey::Task(id)]);
                store.finish_delete(EntityKey::Task(id));
                info!(task_id = id, board_id, "task deleted");
                self.succeed_in(&mut store, RESOURCE)
            }
            Err(e) => {
                store.reinsert_task(removed);
                self.fail_in(&mut store, RESOURCE, e)
            }
        }
    }
}

#[cfg(test)]
#[path = "tasks_test.rs"]
mod tests;

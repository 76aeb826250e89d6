//! Board operations: list and detail fetches, selection, create, rename,
//! full update and delete.

use tracing::{debug, info};
use uuid::Uuid;

use super::{Pipeline, Settlement, board_not_found};
use crate::api::ApiError;
use crate::model::{Board, BoardId, validate_title};
use crate::status::Resource;
use crate::store::{EntityKey, FetchKey, Reconciled};

/// A write to an existing board.
enum BoardWrite {
    Title(String),
    Full(Board),
}

impl BoardWrite {
    fn validate(&self) -> Result<(), ApiError> {
        match self {
            Self::Title(title) => validate_title(title),
            Self::Full(board) => validate_title(&board.title),
        }
    }

    fn apply_to(&self, board: &mut Board) {
        match self {
            Self::Title(title) => board.title.clone_from(title),
            Self::Full(full) => board.apply_header(full),
        }
    }
}

impl Pipeline {
    // =========================================================================
    // FETCH
    // =========================================================================

    /// Replace the board list with the server's.
    pub async fn fetch_boards(&self) -> Settlement {
        let resource = Resource::Boards;
        let generation = self.begin_fetch(resource, FetchKey::Boards).await;
        let result = self.api.list_boards().await;

        let mut store = self.store.write().await;
        match result {
            Ok(boards) => {
                if !store.is_current(FetchKey::Boards, generation) {
                    debug!(generation, "stale board list discarded");
                    return self.supersede_in(&mut store, resource);
                }
                debug!(count = boards.len(), "board list fetched");
                store.replace_boards(boards);
                self.succeed_in(&mut store, resource)
            }
            Err(e) => self.fail_in(&mut store, resource, e),
        }
    }

    /// Refresh one board, tasks included. A temp board has nothing to load
    /// until its create settles.
    pub async fn fetch_board(&self, id: BoardId) -> Settlement {
        let resource = Resource::BoardDetail;
        let id = {
            let store = self.store.read().await;
            let id = store.resolve_id(id);
            if store.is_temp_board(id) {
                debug!(board_id = id, "temp board not fetched");
                return Settlement::Succeeded;
            }
            id
        };
        let key = FetchKey::Board(id);
        let generation = self.begin_fetch(resource, key).await;
        let result = self.api.get_board(id).await;

        let mut store = self.store.write().await;
        match result {
            Ok(board) => {
                if !store.is_current(key, generation) {
                    debug!(board_id = id, generation, "stale board detail discarded");
                    return self.supersede_in(&mut store, resource);
                }
                store.upsert_board(board);
                self.succeed_in(&mut store, resource)
            }
            Err(e) => {
                if e.is_not_found() && store.selected_id() == Some(id) {
                    store.select(None);
                }
                self.fail_in(&mut store, resource, e)
            }
        }
    }

    // =========================================================================
    // SELECTION
    // =========================================================================

    /// Make `id` the current board, then load its detail.
    pub async fn select_board(&self, id: BoardId) -> Settlement {
        let id = {
            let mut store = self.store.write().await;
            let id = store.resolve_id(id);
            store.select(Some(id));
            id
        };
        self.fetch_board(id).await
    }

    pub async fn clear_selection(&self) {
        self.store.write().await.select(None);
    }

    // =========================================================================
    // CREATE
    // =========================================================================

    /// Insert a temp board, create it remotely, reconcile, then load its detail.
    ///
    /// The returned settlement is the create's. The detail fetch that follows
    /// reports only through the board-detail status, so a created board whose
    /// detail failed to load still returns [`Settlement::Succeeded`].
    pub async fn create_board(&self, title: &str) -> Settlement {
        let resource = Resource::BoardDetail;
        self.begin(resource).await;
        if let Err(e) = validate_title(title) {
            return self.fail(resource, e).await;
        }

        let correlation = Uuid::new_v4();
        let temp_id = self.store.write().await.insert_temp_board(title, correlation);
        debug!(%correlation, temp_id, "temp board inserted");

        let canonical = match self.api.create_board(title).await {
            Ok(board) => board,
            Err(e) => {
                let mut store = self.store.write().await;
                store.purge_temp(correlation);
                return self.fail_in(&mut store, resource, e);
            }
        };
        let id = canonical.id;
        let guard = self.locks.acquire(EntityKey::Board(id)).await;

        let reconciled = {
            let mut store = self.store.write().await;
            let reconciled = store.reconcile_board(correlation, canonical.clone());
            if matches!(reconciled, Reconciled::Applied { .. }) {
                store.invalidate_fetches(&[FetchKey::Boards, FetchKey::Board(id)]);
            }
            reconciled
        };

        match reconciled {
            Reconciled::Abandoned => {
                self.delete_orphan(EntityKey::Board(id)).await;
                self.succeed(resource).await
            }
            Reconciled::Stale => {
                debug!(board_id = id, "board create already reconciled");
                self.succeed(resource).await
            }
            Reconciled::Applied { follow_up } => {
                info!(board_id = id, temp_id, "board created");
                if let Some(edited) = follow_up {
                    let result = self.api.update_board_title(id, &edited.title).await;
                    let mut store = self.store.write().await;
                    match result {
                        Ok(renamed) => {
                            store.apply_board_header(&renamed);
                        }
                        Err(e) => {
                            store.apply_board_header(&canonical);
                            return self.fail_in(&mut store, resource, e);
                        }
                    }
                }
                let settlement = self.succeed(resource).await;
                drop(guard);
                let _ = self.fetch_board(id).await;
                settlement
            }
        }
    }

    // =========================================================================
    // UPDATE
    // =========================================================================

    pub async fn rename_board(&self, id: BoardId, title: &str) -> Settlement {
        self.write_board(id, BoardWrite::Title(title.to_owned())).await
    }

    /// Send the whole board header. The task list is not touched.
    pub async fn update_board(&self, board: &Board) -> Settlement {
        self.write_board(board.id, BoardWrite::Full(board.clone())).await
    }

    async fn write_board(&self, id: BoardId, write: BoardWrite) -> Settlement {
        let resource = Resource::BoardDetail;
        self.begin(resource).await;
        if let Err(e) = write.validate() {
            return self.fail(resource, e).await;
        }

        let id = {
            let mut store = self.store.write().await;
            let id = store.resolve_id(id);
            let Some(board) = store.board(id) else {
                return self.fail_in(&mut store, resource, board_not_found());
            };
            if board.is_temp {
                let mut edited = board.clone();
                write.apply_to(&mut edited);
                store.apply_board_header(&edited);
                store.mark_temp_edited(EntityKey::Board(id));
                debug!(board_id = id, "temp board edited locally");
                return self.succeed_in(&mut store, resource);
            }
            id
        };

        let _guard = self.locks.acquire(EntityKey::Board(id)).await;
        {
            let mut store = self.store.write().await;
            let Some(mut edited) = store.snapshot_board(id) else {
                return self.fail_in(&mut store, resource, board_not_found());
            };
            write.apply_to(&mut edited);
            store.apply_board_header(&edited);
        }

        let result = match &write {
            BoardWrite::Title(title) => self.api.update_board_title(id, title).await,
            BoardWrite::Full(board) => self.api.update_board(&Board { id, ..board.clone() }).await,
        };

        let mut store = self.store.write().await;
        match result {
            Ok(canonical) => {
                store.clear_board_snapshot(id);
                store.apply_board_header(&canonical);
                store.invalidate_fetches(&[FetchKey::Boards, FetchKey::Board(id)]);
                self.succeed_in(&mut store, resource)
            }
            Err(e) => {
                store.restore_board(id);
                debug!(board_id = id, "board edit rolled back");
                self.fail_in(&mut store, resource, e)
            }
        }
    }

    // =========================================================================
    // DELETE
    // =========================================================================

    /// Remove a board optimistically. A failed delete appends it back.
    pub async fn delete_board(&self, id: BoardId) -> Settlement {
        let resource = Resource::BoardDetail;
        self.begin(resource).await;

        let id = {
            let mut store = self.store.write().await;
            let id = store.resolve_id(id);
            if store.is_temp_board(id) {
                store.remove_board(id);
                debug!(board_id = id, "temp board removed before its create settled");
                return self.succeed_in(&mut store, resource);
            }
            id
        };

        let _guard = self.locks.acquire(EntityKey::Board(id)).await;
        let removed = self.store.write().await.remove_board(id).is_some();
        if !removed {
            return self.fail(resource, board_not_found()).await;
        }

        let result = self.api.delete_board(id).await;
        let mut store = self.store.write().await;
        match result {
            Ok(()) => {
                store.invalidate_fetches(&[FetchKey::Boards, FetchKey::Board(id)]);
                store.finish_delete(EntityKey::Board(id));
                info!(board_id = id, "board deleted");
                self.succeed_in(&mut store, resource)
            }
            Err(e) => {
                store.reinsert_board(id);
                self.fail_in(&mut store, resource, e)
            }
        }
    }
}

#[cfg(test)]
#[path = "boards_test.rs"]
mod tests;

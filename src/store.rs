//! Central store — the single owner of the in-memory board/task graph.
//!
//! DESIGN
//! ======
//! Every read goes through the selectors below. Every write is a
//! `pub(crate)` method called by the mutation pipeline while it holds the
//! write guard, so outside the crate the store is read-only. Guards are never
//! held across a network await, which makes each mutation atomic relative to
//! every other.
//!
//! Bookkeeping for in-flight work lives next to the graph:
//! - pending creates, keyed by a client-generated correlation id and pointing
//!   at the temp entity they inserted
//! - in-flight deletes, so a fetch cannot resurrect an entity being removed
//! - parked boards: a board whose delete is in flight leaves the visible list
//!   but keeps receiving task work that settles meanwhile, so a failed delete
//!   puts back its current state rather than the copy taken at removal
//! - rollback snapshots for in-flight edits
//! - a generation counter per fetch key, to discard superseded responses
//!
//! TRADE-OFFS
//! ==========
//! Fetch results do not blindly replace local state. Temp entities are kept
//! (the server cannot know them yet) and entities with an edit in flight keep
//! their optimistic value; the fetched value becomes their new rollback
//! baseline instead.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use tokio::sync::{RwLock, broadcast};
use tracing::debug;
use uuid::Uuid;

use crate::config::DEFAULT_EVENT_CAPACITY;
use crate::model::{Board, BoardId, NewTask, Task, TaskId, TaskStatus};
use crate::rollback::RollbackRegistry;
use crate::status::{Resource, ResourceStatus, StatusMachine};

pub type SharedStore = Arc<RwLock<Store>>;

/// Client-generated id tying a create request to the temp entity it inserted.
pub type CorrelationId = Uuid;

/// Reconciled temp ids remembered for late callers. Oldest are forgotten first.
const MAX_ALIASES: usize = 1024;

// =============================================================================
// KEYS AND EVENTS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKey {
    Board(BoardId),
    Task(TaskId),
}

impl EntityKey {
    #[must_use]
    pub fn id(self) -> i64 {
        match self {
            Self::Board(id) | Self::Task(id) => id,
        }
    }

    fn fetch_key(self) -> FetchKey {
        match self {
            Self::Board(id) => FetchKey::Board(id),
            Self::Task(id) => FetchKey::Task(id),
        }
    }
}

/// Scope of a fetch, for stale-response detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchKey {
    Boards,
    Board(BoardId),
    Task(TaskId),
}

/// Change notifications for reactive readers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    Status { resource: Resource, status: ResourceStatus },
    Boards,
    Selection(Option<BoardId>),
}

/// Outcome of matching a create response back to its temp entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Reconciled<T> {
    /// The temp entity is gone and the canonical one is in the store.
    /// `follow_up` carries local edits made to the temp entity that the
    /// server has not seen yet.
    Applied { follow_up: Option<T> },
    /// The temp entity was deleted locally while the create was in flight.
    Abandoned,
    /// Nothing to reconcile: already applied, or the temp entity vanished.
    Stale,
}

#[derive(Debug, Clone)]
struct PendingCreate {
    key: EntityKey,
    abandoned: bool,
    edited: bool,
}

/// Which list a board currently sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shelf {
    Live,
    Parked,
}

// =============================================================================
// STORE
// =============================================================================

#[derive(Debug)]
pub struct Store {
    boards: Vec<Board>,
    selected: Option<BoardId>,
    statuses: StatusMachine,
    task_snapshots: RollbackRegistry<Task>,
    board_snapshots: RollbackRegistry<Board>,
    pending_creates: HashMap<CorrelationId, PendingCreate>,
    pending_deletes: HashSet<EntityKey>,
    /// Boards removed locally whose delete request has not settled.
    parked: Vec<Board>,
    /// Temp id → server entity, for callers still holding a temp id after reconciliation.
    aliases: HashMap<i64, EntityKey>,
    alias_order: VecDeque<i64>,
    generations: HashMap<FetchKey, u64>,
    last_temp_id: i64,
    events: broadcast::Sender<StoreEvent>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

impl Store {
    #[must_use]
    pub fn new(event_capacity: usize) -> Self {
        let (events, _) = broadcast::channel(event_capacity.max(1));
        Self {
            boards: Vec::new(),
            selected: None,
            statuses: StatusMachine::new(),
            task_snapshots: RollbackRegistry::new(),
            board_snapshots: RollbackRegistry::new(),
            pending_creates: HashMap::new(),
            pending_deletes: HashSet::new(),
            parked: Vec::new(),
            aliases: HashMap::new(),
            alias_order: VecDeque::new(),
            generations: HashMap::new(),
            last_temp_id: 0,
            events,
        }
    }

    #[must_use]
    pub fn shared(event_capacity: usize) -> SharedStore {
        Arc::new(RwLock::new(Self::new(event_capacity)))
    }

    // =========================================================================
    // SELECTORS
    // =========================================================================

    #[must_use]
    pub fn boards(&self) -> &[Board] {
        &self.boards
    }

    #[must_use]
    pub fn board(&self, id: BoardId) -> Option<&Board> {
        self.boards.iter().find(|b| b.id == id)
    }

    #[must_use]
    pub fn selected_id(&self) -> Option<BoardId> {
        self.selected
    }

    #[must_use]
    pub fn selected_board(&self) -> Option<&Board> {
        self.selected.and_then(|id| self.board(id))
    }

    /// The board a UI falls back to when nothing is selected.
    #[must_use]
    pub fn first_board_id(&self) -> Option<BoardId> {
        self.boards.first().map(|b| b.id)
    }

    #[must_use]
    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.boards.iter().flat_map(|b| b.tasks.iter()).find(|t| t.id == id)
    }

    /// One column of a board view.
    #[must_use]
    pub fn tasks_by_status(&self, board_id: BoardId, status: TaskStatus) -> Vec<&Task> {
        self.board(board_id)
            .map(|b| b.tasks_with_status(status))
            .unwrap_or_default()
    }

    /// Number of temp boards and tasks currently in the graph.
    #[must_use]
    pub fn temp_count(&self) -> usize {
        self.boards
            .iter()
            .map(|b| usize::from(b.is_temp) + b.tasks.iter().filter(|t| t.is_temp).count())
            .sum()
    }

    #[must_use]
    pub fn pending_create_count(&self) -> usize {
        self.pending_creates.len()
    }

    #[must_use]
    pub fn status(&self, resource: Resource) -> &ResourceStatus {
        self.statuses.get(resource)
    }

    #[must_use]
    pub fn has_snapshot(&self, key: EntityKey) -> bool {
        match key {
            EntityKey::Board(id) => self.board_snapshots.contains(id),
            EntityKey::Task(id) => self.task_snapshots.contains(id),
        }
    }

    #[must_use]
    pub fn is_temp_board(&self, id: BoardId) -> bool {
        self.board(id).is_some_and(|b| b.is_temp)
    }

    /// Map a temp id that has since been reconciled to its server id.
    #[must_use]
    pub fn resolve_id(&self, id: i64) -> i64 {
        self.aliases.get(&id).map_or(id, |key| key.id())
    }

    #[cfg(test)]
    pub(crate) fn alias_count(&self) -> usize {
        self.aliases.len()
    }

    #[cfg(test)]
    pub(crate) fn generation_count(&self) -> usize {
        self.generations.len()
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: StoreEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    // =========================================================================
    // STATUS
    // =========================================================================

    pub(crate) fn begin(&mut self, resource: Resource) -> u64 {
        let epoch = self.statuses.begin(resource);
        self.emit_status(resource);
        epoch
    }

    pub(crate) fn succeed(&mut self, resource: Resource) -> u64 {
        let epoch = self.statuses.succeed(resource);
        self.emit_status(resource);
        epoch
    }

    pub(crate) fn fail(&mut self, resource: Resource, message: impl Into<String>) -> u64 {
        let epoch = self.statuses.fail(resource, message);
        self.emit_status(resource);
        epoch
    }

    pub(crate) fn reset_if_current(&mut self, resource: Resource, epoch: u64) -> bool {
        let reset = self.statuses.reset_if_current(resource, epoch);
        if reset {
            self.emit_status(resource);
        }
        reset
    }

    fn emit_status(&self, resource: Resource) {
        self.emit(StoreEvent::Status { resource, status: self.statuses.get(resource).clone() });
    }

    // =========================================================================
    // GENERATIONS
    // =========================================================================

    /// Issue a new generation for `key`, superseding every earlier one.
    pub(crate) fn next_generation(&mut self, key: FetchKey) -> u64 {
        let generation = self.generations.entry(key).or_insert(0);
        *generation += 1;
        *generation
    }

    #[must_use]
    pub(crate) fn is_current(&self, key: FetchKey, generation: u64) -> bool {
        self.generations.get(&key).copied().unwrap_or(0) == generation
    }

    /// Supersede in-flight fetches that could carry data older than a write
    /// that just settled.
    pub(crate) fn invalidate_fetches(&mut self, keys: &[FetchKey]) {
        for key in keys {
            self.next_generation(*key);
        }
    }

    // =========================================================================
    // SELECTION
    // =========================================================================

    pub(crate) fn select(&mut self, id: Option<BoardId>) {
        if self.selected != id {
            self.selected = id;
            self.emit(StoreEvent::Selection(id));
        }
    }

    // =========================================================================
    // FETCH APPLICATION
    // =========================================================================

    /// Replace the board list with a fetched one.
    pub(crate) fn replace_boards(&mut self, fetched: Vec<Board>) {
        let previous = std::mem::take(&mut self.boards);
        let mut boards: Vec<Board> = fetched
            .into_iter()
            .filter_map(|board| self.absorb_board(board, &previous))
            .collect();

        for temp in previous.iter().filter(|b| b.is_temp) {
            boards.push(temp.clone());
        }
        self.boards = boards;

        if let Some(selected) = self.selected {
            if self.board(selected).is_none() {
                debug!(board_id = selected, "selected board dropped by fetch");
                self.select(None);
            }
        }
        self.emit(StoreEvent::Boards);
    }

    /// Insert or replace a single fetched board.
    pub(crate) fn upsert_board(&mut self, fetched: Board) -> bool {
        let previous = self.boards.clone();
        let Some(board) = self.absorb_board(fetched, &previous) else {
            return false;
        };

        // A task now owned by this board must not linger on another one.
        let owned: HashSet<TaskId> = board.tasks.iter().map(|t| t.id).collect();
        for other in self.boards.iter_mut().filter(|b| b.id != board.id) {
            other.tasks.retain(|t| !owned.contains(&t.id));
        }

        match self.boards.iter().position(|b| b.id == board.id) {
            Some(pos) => self.boards[pos] = board,
            None => self.boards.push(board),
        }
        self.emit(StoreEvent::Boards);
        true
    }

    /// Insert or replace a single fetched task.
    pub(crate) fn upsert_task(&mut self, fetched: Task) -> bool {
        if self.pending_deletes.contains(&EntityKey::Task(fetched.id)) {
            return false;
        }
        if self.task_snapshots.rebase(&fetched) {
            return false;
        }
        self.apply_task(Task { is_temp: false, ..fetched })
    }

    /// Fold local in-flight state into a fetched board. `None` means the board
    /// is being deleted locally and must not come back.
    fn absorb_board(&mut self, mut fetched: Board, previous: &[Board]) -> Option<Board> {
        if self.pending_deletes.contains(&EntityKey::Board(fetched.id)) {
            return None;
        }
        fetched.is_temp = false;

        if self.board_snapshots.rebase(&fetched) {
            if let Some(local) = previous.iter().find(|b| b.id == fetched.id) {
                fetched.apply_header(local);
            }
        }

        let local_tasks = || previous.iter().flat_map(|b| b.tasks.iter());
        let mut tasks = Vec::with_capacity(fetched.tasks.len());
        for task in std::mem::take(&mut fetched.tasks) {
            if self.pending_deletes.contains(&EntityKey::Task(task.id)) {
                continue;
            }
            if self.task_snapshots.rebase(&task) {
                // The optimistic copy wins, wherever it currently lives.
                match local_tasks().find(|t| t.id == task.id) {
                    Some(local) if local.board_id == fetched.id => tasks.push(local.clone()),
                    Some(_) => {}
                    None => tasks.push(task),
                }
                continue;
            }
            tasks.push(Task { is_temp: false, ..task });
        }

        for local in local_tasks().filter(|t| t.board_id == fetched.id) {
            let in_flight = local.is_temp || self.task_snapshots.contains(local.id);
            if in_flight && !tasks.iter().any(|t| t.id == local.id) {
                tasks.push(local.clone());
            }
        }

        fetched.tasks = tasks;
        Some(fetched)
    }

    // =========================================================================
    // CREATE
    // =========================================================================

    fn next_temp_id(&mut self) -> i64 {
        self.last_temp_id -= 1;
        self.last_temp_id
    }

    pub(crate) fn insert_temp_board(&mut self, title: &str, correlation: CorrelationId) -> BoardId {
        let id = self.next_temp_id();
        self.boards.push(Board {
            id,
            title: title.to_owned(),
            created_at: None,
            updated_at: None,
            tasks: Vec::new(),
            is_temp: true,
        });
        self.pending_creates
            .insert(correlation, PendingCreate { key: EntityKey::Board(id), abandoned: false, edited: false });
        self.emit(StoreEvent::Boards);
        id
    }

    /// Append a temp task to its board. `None` if the board is not in the store.
    pub(crate) fn insert_temp_task(&mut self, new_task: &NewTask, correlation: CorrelationId) -> Option<TaskId> {
        let pos = self.boards.iter().position(|b| b.id == new_task.board_id)?;
        let id = self.next_temp_id();
        self.boards[pos].tasks.push(Task {
            id,
            title: new_task.title.clone(),
            description: new_task.description.clone(),
            status: new_task.status,
            board_id: new_task.board_id,
            created_at: None,
            updated_at: None,
            is_temp: true,
        });
        self.pending_creates
            .insert(correlation, PendingCreate { key: EntityKey::Task(id), abandoned: false, edited: false });
        self.emit(StoreEvent::Boards);
        Some(id)
    }

    /// Note that a temp entity was edited locally before its create settled.
    pub(crate) fn mark_temp_edited(&mut self, key: EntityKey) -> bool {
        match self.pending_creates.values_mut().find(|p| p.key == key) {
            Some(pending) => {
                pending.edited = true;
                true
            }
            None => false,
        }
    }

    pub(crate) fn reconcile_board(&mut self, correlation: CorrelationId, canonical: Board) -> Reconciled<Board> {
        let Some(pending) = self.pending_creates.remove(&correlation) else {
            return Reconciled::Stale;
        };
        let EntityKey::Board(temp_id) = pending.key else {
            return Reconciled::Stale;
        };
        if pending.abandoned {
            return Reconciled::Abandoned;
        }
        let Some(pos) = self.boards.iter().position(|b| b.id == temp_id) else {
            return Reconciled::Stale;
        };

        let local = self.boards[pos].clone();
        let canonical = Board { is_temp: false, ..canonical };
        let follow_up = (pending.edited && local.title != canonical.title).then(|| {
            let mut edited = canonical.clone();
            edited.title.clone_from(&local.title);
            edited
        });

        let id = canonical.id;
        if self.boards.iter().any(|b| b.id == id) {
            self.boards.remove(pos);
        } else {
            // Keep showing local edits while the follow-up is in flight.
            self.boards[pos] = follow_up.clone().unwrap_or(canonical);
        }
        self.record_alias(temp_id, EntityKey::Board(id));
        if self.selected == Some(temp_id) {
            self.select(Some(id));
        }
        self.emit(StoreEvent::Boards);
        Reconciled::Applied { follow_up }
    }

    pub(crate) fn reconcile_task(&mut self, correlation: CorrelationId, canonical: Task) -> Reconciled<Task> {
        let Some(pending) = self.pending_creates.remove(&correlation) else {
            return Reconciled::Stale;
        };
        let EntityKey::Task(temp_id) = pending.key else {
            return Reconciled::Stale;
        };
        if pending.abandoned {
            return Reconciled::Abandoned;
        }
        let Some(local) = self.find_task(temp_id).cloned() else {
            return Reconciled::Stale;
        };

        let canonical = Task { is_temp: false, ..canonical };
        let follow_up = (pending.edited && !local.same_fields(&canonical)).then(|| {
            let mut edited = canonical.clone();
            edited.apply_fields(&local);
            edited
        });

        let id = canonical.id;
        if self.find_task(id).is_some() {
            self.take_task(temp_id);
        } else {
            self.swap_task(temp_id, follow_up.clone().unwrap_or(canonical));
        }
        self.record_alias(temp_id, EntityKey::Task(id));
        self.emit(StoreEvent::Boards);
        Reconciled::Applied { follow_up }
    }

    fn record_alias(&mut self, temp_id: i64, key: EntityKey) {
        if self.aliases.insert(temp_id, key).is_none() {
            self.alias_order.push_back(temp_id);
        }
        while self.alias_order.len() > MAX_ALIASES {
            if let Some(oldest) = self.alias_order.pop_front() {
                self.aliases.remove(&oldest);
            }
        }
    }

    /// Drop the temp entity of a failed create.
    pub(crate) fn purge_temp(&mut self, correlation: CorrelationId) -> bool {
        let Some(pending) = self.pending_creates.remove(&correlation) else {
            return false;
        };
        let removed = match pending.key {
            EntityKey::Board(id) => {
                let before = self.boards.len();
                self.boards.retain(|b| b.id != id);
                if self.selected == Some(id) {
                    self.select(None);
                }
                before != self.boards.len()
            }
            EntityKey::Task(id) => self.take_task(id).is_some(),
        };
        if removed {
            self.emit(StoreEvent::Boards);
        }
        removed
    }

    // =========================================================================
    // UPDATE
    // =========================================================================

    pub(crate) fn snapshot_task(&mut self, id: TaskId) -> Option<Task> {
        let current = self.task(id)?.clone();
        self.task_snapshots.snapshot(&current);
        Some(current)
    }

    pub(crate) fn snapshot_board(&mut self, id: BoardId) -> Option<Board> {
        let current = self.board(id)?.clone();
        self.board_snapshots.snapshot(&current);
        Some(current)
    }

    /// Write `task` into the graph, moving it if its board changed.
    pub(crate) fn apply_task(&mut self, task: Task) -> bool {
        let placed = self.place_task(task);
        if placed {
            self.emit(StoreEvent::Boards);
        }
        placed
    }

    /// Write board-level fields, leaving the task list alone.
    pub(crate) fn apply_board_header(&mut self, board: &Board) -> bool {
        match self.boards.iter_mut().find(|b| b.id == board.id) {
            Some(local) => {
                local.apply_header(board);
                self.emit(StoreEvent::Boards);
                true
            }
            None => false,
        }
    }

    /// Put the snapshot back and forget it.
    pub(crate) fn restore_task(&mut self, id: TaskId) -> Option<Task> {
        let snapshot = self.task_snapshots.take(id)?;
        self.apply_task(snapshot.clone());
        Some(snapshot)
    }

    pub(crate) fn restore_board(&mut self, id: BoardId) -> Option<Board> {
        let snapshot = self.board_snapshots.take(id)?;
        self.apply_board_header(&snapshot);
        Some(snapshot)
    }

    pub(crate) fn clear_task_snapshot(&mut self, id: TaskId) -> bool {
        self.task_snapshots.clear(id)
    }

    pub(crate) fn clear_board_snapshot(&mut self, id: BoardId) -> bool {
        self.board_snapshots.clear(id)
    }

    // =========================================================================
    // DELETE
    // =========================================================================

    /// Optimistically remove a board. Clears the selection if it pointed here.
    /// A server board is parked until its delete settles.
    pub(crate) fn remove_board(&mut self, id: BoardId) -> Option<Board> {
        let pos = self.boards.iter().position(|b| b.id == id)?;
        let board = self.boards.remove(pos);
        if board.is_temp {
            self.abandon(EntityKey::Board(id));
        } else {
            self.pending_deletes.insert(EntityKey::Board(id));
            self.parked.push(board.clone());
        }
        if self.selected == Some(id) {
            self.select(None);
        }
        self.emit(StoreEvent::Boards);
        Some(board)
    }

    pub(crate) fn remove_task(&mut self, id: TaskId) -> Option<Task> {
        let task = self.take_task(id)?;
        if task.is_temp {
            self.abandon(EntityKey::Task(id));
        } else {
            self.pending_deletes.insert(EntityKey::Task(id));
        }
        self.emit(StoreEvent::Boards);
        Some(task)
    }

    /// The server confirmed the delete. For a board, temp tasks still on it
    /// are abandoned so their creates clean up after themselves.
    pub(crate) fn finish_delete(&mut self, key: EntityKey) {
        self.pending_deletes.remove(&key);
        self.forget(key);
        let EntityKey::Board(id) = key else {
            return;
        };
        let Some(pos) = self.parked.iter().position(|b| b.id == id) else {
            return;
        };
        let board = self.parked.remove(pos);
        for task in &board.tasks {
            if task.is_temp {
                self.abandon(EntityKey::Task(task.id));
            } else {
                self.forget(EntityKey::Task(task.id));
            }
        }
    }

    /// Put back a board whose delete failed, including task work that settled
    /// while it was parked. Appended, not re-positioned.
    pub(crate) fn reinsert_board(&mut self, id: BoardId) -> bool {
        self.pending_deletes.remove(&EntityKey::Board(id));
        let Some(pos) = self.parked.iter().position(|b| b.id == id) else {
            return false;
        };
        let board = self.parked.remove(pos);
        if self.board(id).is_some() {
            return false;
        }
        self.boards.push(board);
        self.emit(StoreEvent::Boards);
        true
    }

    pub(crate) fn reinsert_task(&mut self, task: Task) -> bool {
        self.pending_deletes.remove(&EntityKey::Task(task.id));
        if self.find_task(task.id).is_some() {
            return false;
        }
        let Some((shelf, pos)) = self.locate_board(task.board_id) else {
            return false;
        };
        self.shelf_mut(shelf)[pos].tasks.push(task);
        self.emit(StoreEvent::Boards);
        true
    }

    /// Drop the fetch generation and aliases of an entity that no longer exists.
    fn forget(&mut self, key: EntityKey) {
        self.generations.remove(&key.fetch_key());
        self.aliases.retain(|_, target| *target != key);
        let aliases = &self.aliases;
        self.alias_order.retain(|temp_id| aliases.contains_key(temp_id));
    }

    fn abandon(&mut self, key: EntityKey) {
        if let Some(pending) = self.pending_creates.values_mut().find(|p| p.key == key) {
            pending.abandoned = true;
        }
    }

    // =========================================================================
    // TASK PLACEMENT
    // =========================================================================

    fn shelf(&self, shelf: Shelf) -> &[Board] {
        match shelf {
            Shelf::Live => &self.boards,
            Shelf::Parked => &self.parked,
        }
    }

    fn shelf_mut(&mut self, shelf: Shelf) -> &mut Vec<Board> {
        match shelf {
            Shelf::Live => &mut self.boards,
            Shelf::Parked => &mut self.parked,
        }
    }

    fn locate_board(&self, id: BoardId) -> Option<(Shelf, usize)> {
        [Shelf::Live, Shelf::Parked]
            .into_iter()
            .find_map(|shelf| self.shelf(shelf).iter().position(|b| b.id == id).map(|pos| (shelf, pos)))
    }

    fn locate_task(&self, id: TaskId) -> Option<(Shelf, usize, usize)> {
        [Shelf::Live, Shelf::Parked].into_iter().find_map(|shelf| {
            self.shelf(shelf).iter().enumerate().find_map(|(bi, board)| {
                board
                    .tasks
                    .iter()
                    .position(|t| t.id == id)
                    .map(|ti| (shelf, bi, ti))
            })
        })
    }

    /// Like [`Store::task`], but also sees tasks on parked boards.
    fn find_task(&self, id: TaskId) -> Option<&Task> {
        let (shelf, bi, ti) = self.locate_task(id)?;
        Some(&self.shelf(shelf)[bi].tasks[ti])
    }

    fn take_task(&mut self, id: TaskId) -> Option<Task> {
        let (shelf, bi, ti) = self.locate_task(id)?;
        Some(self.shelf_mut(shelf)[bi].tasks.remove(ti))
    }

    /// Replace the task `old_id` with `task`, keeping its list position when
    /// it stays on the same board.
    fn swap_task(&mut self, old_id: TaskId, task: Task) -> bool {
        let Some((shelf, bi, ti)) = self.locate_task(old_id) else {
            return false;
        };
        if self.shelf(shelf)[bi].id == task.board_id {
            self.shelf_mut(shelf)[bi].tasks[ti] = task;
            return true;
        }
        let Some((target_shelf, target)) = self.locate_board(task.board_id) else {
            return false;
        };
        self.shelf_mut(shelf)[bi].tasks.remove(ti);
        self.shelf_mut(target_shelf)[target].tasks.push(task);
        true
    }

    /// Insert or replace `task` by id on the board named by its `board_id`.
    fn place_task(&mut self, task: Task) -> bool {
        if self.locate_task(task.id).is_some() {
            return self.swap_task(task.id, task);
        }
        match self.locate_board(task.board_id) {
            Some((shelf, pos)) => {
                self.shelf_mut(shelf)[pos].tasks.push(task);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;

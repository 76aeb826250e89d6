//! Per-resource request status: `idle → loading → succeeded | failed`.
//!
//! DESIGN
//! ======
//! One slot per tracked resource. Every transition bumps the slot's epoch so
//! a delayed reset armed for an older terminal state can tell it has been
//! superseded. Out-of-order calls are tolerated by overwriting, never by
//! erroring: two overlapping operations on one resource simply take turns.

/// Independently tracked status domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    /// The list of all boards.
    Boards,
    /// Single-board operations: fetch, create, rename, delete.
    BoardDetail,
    /// Every task write and task fetch.
    TaskMutation,
}

impl Resource {
    pub const ALL: [Self; 3] = [Self::Boards, Self::BoardDetail, Self::TaskMutation];

    fn index(self) -> usize {
        match self {
            Self::Boards => 0,
            Self::BoardDetail => 1,
            Self::TaskMutation => 2,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Boards => "boards",
            Self::BoardDetail => "board",
            Self::TaskMutation => "task",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusKind {
    #[default]
    Idle,
    Loading,
    Succeeded,
    Failed,
}

impl StatusKind {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceStatus {
    pub kind: StatusKind,
    pub error: Option<String>,
}

impl ResourceStatus {
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.kind == StatusKind::Loading
    }
}

#[derive(Debug, Clone, Default)]
struct Slot {
    status: ResourceStatus,
    epoch: u64,
}

#[derive(Debug, Clone, Default)]
pub struct StatusMachine {
    slots: [Slot; 3],
}

impl StatusMachine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, resource: Resource) -> &ResourceStatus {
        &self.slots[resource.index()].status
    }

    #[must_use]
    pub fn epoch(&self, resource: Resource) -> u64 {
        self.slots[resource.index()].epoch
    }

    /// Enter `loading` and clear any previous error.
    pub fn begin(&mut self, resource: Resource) -> u64 {
        self.set(resource, StatusKind::Loading, None)
    }

    pub fn succeed(&mut self, resource: Resource) -> u64 {
        self.set(resource, StatusKind::Succeeded, None)
    }

    pub fn fail(&mut self, resource: Resource, message: impl Into<String>) -> u64 {
        self.set(resource, StatusKind::Failed, Some(message.into()))
    }

    pub fn reset(&mut self, resource: Resource) -> u64 {
        self.set(resource, StatusKind::Idle, None)
    }

    /// Reset only if nothing has touched the resource since `epoch`.
    pub fn reset_if_current(&mut self, resource: Resource, epoch: u64) -> bool {
        if self.epoch(resource) != epoch || !self.get(resource).kind.is_terminal() {
            return false;
        }
        self.reset(resource);
        true
    }

    fn set(&mut self, resource: Resource, kind: StatusKind, error: Option<String>) -> u64 {
        let slot = &mut self.slots[resource.index()];
        slot.status = ResourceStatus { kind, error };
        slot.epoch += 1;
        slot.epoch
    }
}

#[cfg(test)]
#[path = "status_test.rs"]
mod tests;

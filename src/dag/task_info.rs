// src/dag/task_info.rs

//! Task metadata and per-run state management.

use crate::engine::RunOrigin;
use crate::types::{EdgeKind, TaskId};

/// Per-run state of a task (internal).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Task was triggered for this run but is waiting on dependencies.
    Pending,
    /// Task has been dispatched to the executor and is currently running.
    Running,
    /// Task completed successfully for this run, or a long-lived task
    /// reported that it is up.
    DoneSuccess,
    /// Task failed in this run (or was blocked by a failed dependency).
    DoneFailed,
}

/// Public, read-only view of a task's per-run state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskRunState {
    /// The task is not currently participating in this run.
    NotInRun,
    Pending,
    Running,
    DoneSuccess,
    DoneFailed,
}

impl From<Option<RunState>> for TaskRunState {
    fn from(state: Option<RunState>) -> Self {
        match state {
            None => TaskRunState::NotInRun,
            Some(RunState::Pending) => TaskRunState::Pending,
            Some(RunState::Running) => TaskRunState::Running,
            Some(RunState::DoneSuccess) => TaskRunState::DoneSuccess,
            Some(RunState::DoneFailed) => TaskRunState::DoneFailed,
        }
    }
}

/// Static task information derived from the graph, plus per-run state.
#[derive(Debug, Clone)]
pub struct TaskInfo {
    pub task: TaskId,
    pub long_lived: bool,
    /// Direct dependencies and the gate of each edge.
    pub deps: Vec<(TaskId, EdgeKind)>,

    /// Per-run state (None if not participating in the current run).
    pub run_state: Option<RunState>,

    /// Last run ID in which this task succeeded.
    pub last_successful_run: Option<u64>,

    /// Last run ID in which this task failed.
    pub last_failed_run: Option<u64>,
}

impl TaskInfo {
    pub fn new(task: TaskId, deps: Vec<(TaskId, EdgeKind)>) -> Self {
        Self {
            task,
            long_lived: task.is_long_lived(),
            deps,
            run_state: None,
            last_successful_run: None,
            last_failed_run: None,
        }
    }
}

/// A task the executor should run now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledTask {
    pub task: TaskId,
    pub long_lived: bool,
    /// Plan run or reactive run this dispatch belongs to.
    pub origin: RunOrigin,
}

impl ScheduledTask {
    pub fn from_task_info(info: &TaskInfo, run_id: u64) -> Self {
        Self {
            task: info.task,
            long_lived: info.long_lived,
            origin: RunOrigin::Plan { run_id },
        }
    }

    /// A file-watch re-run of an asset class.
    pub fn reactive(task: TaskId, id: u64) -> Self {
        Self {
            task,
            long_lived: false,
            origin: RunOrigin::Reactive { id },
        }
    }
}

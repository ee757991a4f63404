// src/engine/mod.rs

//! Orchestration engine for assetdag.
//!
//! This module ties together:
//! - the DAG scheduler for the plan picked on the command line
//! - reactive runs started by the watcher once the dev server is up
//! - the main runtime event loop that reacts to:
//!   - file-watch triggers
//!   - long-lived progress events
//!   - task completion events
//!   - shutdown signals
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

use std::fmt;

use crate::types::TaskId;

/// Outcome of a task body for the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    Failed,
}

impl TaskOutcome {
    pub fn is_success(self) -> bool {
        matches!(self, TaskOutcome::Success)
    }
}

/// Why a task was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerReason {
    /// Part of the plan (e.g. roots at startup).
    Plan,
    /// Triggered due to a filesystem event.
    FileWatch,
}

/// Which run a dispatched task belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOrigin {
    /// A task of the scheduler-driven plan.
    Plan { run_id: u64 },
    /// A watcher-initiated run, independent of the plan.
    Reactive { id: u64 },
}

impl fmt::Display for RunOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOrigin::Plan { run_id } => write!(f, "plan#{run_id}"),
            RunOrigin::Reactive { id } => write!(f, "reactive#{id}"),
        }
    }
}

/// Events flowing into the runtime from watchers, executors, etc.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// Seed the plan: trigger every root of the task graph.
    PlanStarted,
    /// A task should be (logically) triggered.
    TaskTriggered { task: TaskId, reason: TriggerReason },
    /// A long-lived task reported it is up.
    TaskProgressed { task: TaskId },
    /// A task body finished.
    ///
    /// `outputs` are the written files as URL paths below the app
    /// directory.
    TaskCompleted {
        task: TaskId,
        origin: RunOrigin,
        outcome: TaskOutcome,
        outputs: Vec<String>,
    },
    /// A served page changed that no transform produces.
    PageChanged { path: String },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

/// What the runtime hands back once it stops.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Plan tasks that failed or never ran because a dependency failed.
    pub failed: Vec<TaskId>,
}

impl RunReport {
    pub fn success(&self) -> bool {
        self.failed.is_empty()
    }
}

pub mod core;
pub mod event_handlers;
pub mod runtime;

pub use core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep};
pub use runtime::Runtime;

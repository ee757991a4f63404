// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`RuntimeEvent`]s and produces:
//! - an updated core state
//! - a list of "commands" describing what the IO shell should do next
//!
//! The async/IO-heavy shell (`engine::runtime::Runtime`) is responsible for:
//! - reading events from channels
//! - sending `ScheduledTask`s to the executor
//! - pushing reload notifications to browsers
//! - handling Ctrl+C / shutdown
//!
//! The core is unit tested without any Tokio, channels, filesystem, or
//! servers.

use crate::dag::Scheduler;
use crate::engine::event_handlers::{
    handle_page_changed, handle_plan_started, handle_task_completion, handle_task_progress,
    handle_task_trigger, CoreCommand, CoreStep,
};
use crate::engine::{RunReport, RuntimeEvent};
use crate::types::TaskId;

/// State that outlives a single scheduler run.
#[derive(Debug, Default)]
pub struct CoreState {
    /// A long-lived task (the watch session) is up.
    pub resident: bool,
    /// Reactive runs dispatched but not yet completed.
    pub reactive_outstanding: usize,
    /// Source of reactive run ids.
    pub next_reactive_id: u64,
    /// Plan tasks that ended `DoneFailed`, in the order they were reported.
    pub failed: Vec<TaskId>,
}

impl CoreState {
    pub(crate) fn record_failures(&mut self, tasks: impl IntoIterator<Item = TaskId>) {
        for task in tasks {
            if !self.failed.contains(&task) {
                self.failed.push(task);
            }
        }
    }
}

/// Pure core runtime state.
///
/// It has **no** channels, no Tokio types, and does not perform any IO.
#[derive(Debug)]
pub struct CoreRuntime {
    scheduler: Scheduler,
    state: CoreState,
}

impl CoreRuntime {
    pub fn new(scheduler: Scheduler) -> Self {
        Self {
            scheduler,
            state: CoreState::default(),
        }
    }

    /// Expose whether the scheduler is idle (for tests).
    pub fn is_idle(&self) -> bool {
        self.scheduler.is_idle()
    }

    pub fn is_resident(&self) -> bool {
        self.state.resident
    }

    pub fn reactive_outstanding(&self) -> usize {
        self.state.reactive_outstanding
    }

    pub fn report(&self) -> RunReport {
        RunReport {
            failed: self.state.failed.clone(),
        }
    }

    /// Handle a single runtime event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::PlanStarted => handle_plan_started(&mut self.scheduler, &mut self.state),
            RuntimeEvent::TaskTriggered { task, reason } => {
                handle_task_trigger(&mut self.scheduler, &mut self.state, task, reason)
            }
            RuntimeEvent::TaskProgressed { task } => {
                handle_task_progress(&mut self.scheduler, &mut self.state, task)
            }
            RuntimeEvent::TaskCompleted {
                task,
                origin,
                outcome,
                outputs,
            } => handle_task_completion(
                &mut self.scheduler,
                &mut self.state,
                task,
                origin,
                outcome,
                outputs,
            ),
            RuntimeEvent::PageChanged { path } => handle_page_changed(&self.state, path),
            RuntimeEvent::ShutdownRequested => CoreStep {
                commands: vec![CoreCommand::RequestExit],
                keep_running: false,
            },
        }
    }
}

// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use tracing::{debug, info, warn};

use crate::dag::{ScheduledTask, Scheduler};
use crate::engine::core::CoreState;
use crate::engine::{RunOrigin, TaskOutcome, TriggerReason};
use crate::types::{ReloadEvent, TaskId};

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Send these tasks to the executor.
    DispatchTasks(Vec<ScheduledTask>),
    /// Push a live-reload event to connected browsers.
    Notify(ReloadEvent),
    /// Request that the process exits.
    RequestExit,
}

/// Decision returned by the core after handling a single `RuntimeEvent`.
#[derive(Debug, Clone)]
pub struct CoreStep {
    /// Commands the IO shell should execute (dispatch tasks, notify, exit).
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    fn running(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }
}

/// Seed the plan by triggering every root of the graph in one fresh run.
pub fn handle_plan_started(scheduler: &mut Scheduler, state: &mut CoreState) -> CoreStep {
    if !scheduler.is_idle() {
        warn!("plan already running; ignoring PlanStarted");
        return CoreStep::running(Vec::new());
    }

    scheduler.start_new_run();

    let mut ready = Vec::new();
    for root in scheduler.graph().roots() {
        ready.extend(scheduler.handle_trigger(root));
    }

    let mut commands = Vec::new();
    if !ready.is_empty() {
        commands.push(CoreCommand::DispatchTasks(ready));
    }
    finish_step(scheduler, state, commands)
}

/// Handle a task trigger event.
///
/// - `Plan` triggers go through the scheduler and pull in dependents.
/// - `FileWatch` triggers start a reactive run of the asset class right
///   away, next to whatever else is running. Nothing is queued or merged.
pub fn handle_task_trigger(
    scheduler: &mut Scheduler,
    state: &mut CoreState,
    task: TaskId,
    reason: TriggerReason,
) -> CoreStep {
    match reason {
        TriggerReason::Plan => {
            let ready = scheduler.handle_trigger(task);
            let mut commands = Vec::new();
            if !ready.is_empty() {
                commands.push(CoreCommand::DispatchTasks(ready));
            }
            finish_step(scheduler, state, commands)
        }
        TriggerReason::FileWatch => {
            if !task.is_asset_class() {
                warn!(task = %task, "file-watch trigger for a non-asset task; ignoring");
                return CoreStep::running(Vec::new());
            }

            state.next_reactive_id += 1;
            state.reactive_outstanding += 1;
            let scheduled = ScheduledTask::reactive(task, state.next_reactive_id);
            debug!(task = %task, origin = %scheduled.origin, "starting reactive run");

            CoreStep::running(vec![CoreCommand::DispatchTasks(vec![scheduled])])
        }
    }
}

/// Handle a task progress event.
///
/// Only long-lived tasks report progress; from then on the runtime stays
/// resident until that task completes or shutdown is requested.
pub fn handle_task_progress(
    scheduler: &mut Scheduler,
    state: &mut CoreState,
    task: TaskId,
) -> CoreStep {
    let ready = scheduler.handle_progress(task);
    if task.is_long_lived() {
        state.resident = true;
    }

    let mut commands = Vec::new();
    if !ready.is_empty() {
        commands.push(CoreCommand::DispatchTasks(ready));
    }
    finish_step(scheduler, state, commands)
}

/// Handle a task completion event.
pub fn handle_task_completion(
    scheduler: &mut Scheduler,
    state: &mut CoreState,
    task: TaskId,
    origin: RunOrigin,
    outcome: TaskOutcome,
    outputs: Vec<String>,
) -> CoreStep {
    let mut commands = Vec::new();

    match origin {
        RunOrigin::Reactive { id } => {
            state.reactive_outstanding = state.reactive_outstanding.saturating_sub(1);
            match outcome {
                TaskOutcome::Success => {
                    let event = notification_for(task, outputs);
                    debug!(task = %task, reactive_id = id, ?event, "notifying browsers");
                    commands.push(CoreCommand::Notify(event));
                }
                TaskOutcome::Failed => {
                    warn!(task = %task, reactive_id = id, "reactive run failed; no reload sent");
                }
            }
        }
        RunOrigin::Plan { .. } if task.is_long_lived() && state.resident => {
            // The scheduler already counted this task done when it came up.
            state.resident = false;
            if !outcome.is_success() {
                state.record_failures([task]);
            }
            info!(task = %task, ?outcome, "long-lived task stopped");
        }
        RunOrigin::Plan { run_id } => {
            debug!(task = %task, run_id, ?outcome, "plan task completed");
            let step = scheduler.step_completion(task, outcome);
            state.record_failures(step.newly_failed);
            if !step.newly_scheduled.is_empty() {
                commands.push(CoreCommand::DispatchTasks(step.newly_scheduled));
            }
        }
    }

    finish_step(scheduler, state, commands)
}

/// A served page changed on disk: reload connected browsers.
pub fn handle_page_changed(state: &CoreState, path: String) -> CoreStep {
    if !state.resident {
        debug!(path = %path, "page changed before the server is up; ignoring");
        return CoreStep::running(Vec::new());
    }

    debug!(path = %path, "page changed; notifying browsers");
    CoreStep::running(vec![CoreCommand::Notify(ReloadEvent::Reload)])
}

/// Stylesheets are swapped in place; everything else needs a full reload.
pub fn notification_for(task: TaskId, outputs: Vec<String>) -> ReloadEvent {
    if task != TaskId::Styles {
        return ReloadEvent::Reload;
    }

    let paths: Vec<String> = outputs.into_iter().filter(|p| p.ends_with(".css")).collect();
    if paths.is_empty() {
        ReloadEvent::Reload
    } else {
        ReloadEvent::Inject { paths }
    }
}

/// Whether nothing is left that could produce further events.
pub fn should_exit(scheduler: &Scheduler, state: &CoreState) -> bool {
    scheduler.is_idle() && !state.resident && state.reactive_outstanding == 0
}

fn finish_step(scheduler: &Scheduler, state: &CoreState, mut commands: Vec<CoreCommand>) -> CoreStep {
    if should_exit(scheduler, state) {
        info!(failed = state.failed.len(), "plan finished; nothing resident");
        commands.push(CoreCommand::RequestExit);
        return CoreStep {
            commands,
            keep_running: false,
        };
    }
    CoreStep::running(commands)
}

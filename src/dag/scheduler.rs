use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::dag::graph::TaskGraph;
use crate::dag::scheduler_step::SchedulerStep;
use crate::dag::state_manager::{ReadOnlyStateManager, StateManager};
use crate::dag::task_info::{RunState, ScheduledTask, TaskInfo, TaskRunState};
use crate::engine::TaskOutcome;
use crate::types::TaskId;

/// Scheduler holds the immutable task graph plus mutable per-run state.
///
/// It is responsible for:
/// - remembering which tasks are part of the current run
/// - deciding when a triggered task is "ready" to run (deps satisfied)
/// - marking tasks as succeeded/failed/progressed
/// - scheduling dependents when appropriate
/// - failing `OnSuccess` dependents when a task fails
#[derive(Debug)]
pub struct Scheduler {
    graph: TaskGraph,
    tasks: BTreeMap<TaskId, TaskInfo>,
    /// Monotonically increasing run ID.
    run_counter: u64,
    /// Currently active run ID, or `None` if there is no active run.
    current_run_id: Option<u64>,
}

impl Scheduler {
    pub fn new(graph: TaskGraph) -> Self {
        let tasks = graph
            .tasks()
            .map(|task| {
                let deps = graph.dependencies_of(task).to_vec();
                (task, TaskInfo::new(task, deps))
            })
            .collect();

        Self {
            graph,
            tasks,
            run_counter: 0,
            current_run_id: None,
        }
    }

    pub fn graph(&self) -> &TaskGraph {
        &self.graph
    }

    /// Returns `true` if there is currently no active run.
    pub fn is_idle(&self) -> bool {
        self.current_run_id.is_none()
    }

    /// Current run ID, if any.
    pub fn current_run_id(&self) -> Option<u64> {
        self.current_run_id
    }

    /// Read-only view of the given task's run state.
    pub fn run_state_of(&self, task: TaskId) -> Option<TaskRunState> {
        let info = self.tasks.get(&task)?;
        Some(info.run_state.into())
    }

    /// Tasks that ended this run (or the last one) as `DoneFailed`, either
    /// by failing or by being blocked.
    pub fn failed_tasks(&self) -> Vec<TaskId> {
        self.tasks
            .values()
            .filter(|info| matches!(info.run_state, Some(RunState::DoneFailed)))
            .map(|info| info.task)
            .collect()
    }

    /// Whether the dependencies of `task` are satisfied for the *current run*.
    ///
    /// Returns `None` if the task is unknown.
    pub fn deps_satisfied(&self, task: TaskId) -> Option<bool> {
        let info = self.tasks.get(&task)?;
        let mgr = ReadOnlyStateManager::new(&self.tasks);
        Some(mgr.deps_satisfied_for_info(info))
    }

    /// Start a new run, resetting per-run state but keeping historical
    /// outcomes for dependency satisfaction on later runs.
    pub fn start_new_run(&mut self) {
        self.run_counter += 1;
        self.current_run_id = Some(self.run_counter);

        for info in self.tasks.values_mut() {
            info.run_state = None;
        }

        debug!(run_id = self.run_counter, "scheduler: starting new run");
    }

    pub fn handle_trigger(&mut self, task: TaskId) -> Vec<ScheduledTask> {
        self.trigger_step_internal(task).newly_scheduled
    }

    /// Handle "progress" from a long-lived task.
    pub fn handle_progress(&mut self, task: TaskId) -> Vec<ScheduledTask> {
        self.progress_step_internal(task).newly_scheduled
    }

    pub fn handle_completion(&mut self, task: TaskId, outcome: TaskOutcome) -> Vec<ScheduledTask> {
        self.completion_step_internal(task, outcome).newly_scheduled
    }

    /// Manual-step variant of `handle_trigger` that returns a rich [`SchedulerStep`].
    pub fn step_trigger(&mut self, task: TaskId) -> SchedulerStep {
        self.trigger_step_internal(task)
    }

    /// Manual-step variant of `handle_progress` that returns a rich [`SchedulerStep`].
    pub fn step_progress(&mut self, task: TaskId) -> SchedulerStep {
        self.progress_step_internal(task)
    }

    /// Manual-step variant of `handle_completion` that returns a rich [`SchedulerStep`].
    pub fn step_completion(&mut self, task: TaskId, outcome: TaskOutcome) -> SchedulerStep {
        self.completion_step_internal(task, outcome)
    }

    /// Clear `current_run_id` once every task is terminal.
    ///
    /// Returns `true` if this call transitioned the scheduler from running
    /// to idle.
    fn maybe_finish_run(&mut self) -> bool {
        if self.current_run_id.is_none() {
            return false;
        }

        let manager = StateManager::new(&self.graph, &mut self.tasks, self.current_run_id);

        if manager.all_tasks_terminal() {
            info!(
                run_id = self.current_run_id,
                "scheduler: all tasks terminal; marking run as finished"
            );
            self.current_run_id = None;
            true
        } else {
            false
        }
    }

    fn trigger_step_internal(&mut self, task: TaskId) -> SchedulerStep {
        if self.current_run_id.is_none() {
            debug!(task = %task, "trigger with no active run; starting a new run");
            self.start_new_run();
        }

        let mut manager = StateManager::new(&self.graph, &mut self.tasks, self.current_run_id);
        if self.graph.contains(task) {
            manager.mark_task_and_dependents_pending(task);
        } else {
            warn!(task = %task, "trigger for task outside the plan; ignoring");
        }

        let newly_scheduled = manager.collect_new_ready_tasks();
        let run_just_finished = self.maybe_finish_run();

        SchedulerStep {
            newly_scheduled,
            newly_failed: Vec::new(),
            run_just_finished,
        }
    }

    fn progress_step_internal(&mut self, task: TaskId) -> SchedulerStep {
        let Some(run_id) = self.current_run_id else {
            warn!(task = %task, "progress with no active run; ignoring");
            return SchedulerStep::default();
        };

        let Some(info) = self.tasks.get_mut(&task) else {
            warn!(task = %task, "progress from unknown task; ignoring");
            return SchedulerStep::default();
        };

        debug!(
            task = %info.task,
            run_id,
            "task reported progress; marking DoneSuccess for this run"
        );
        info.run_state = Some(RunState::DoneSuccess);
        info.last_successful_run = Some(run_id);

        let mut manager = StateManager::new(&self.graph, &mut self.tasks, self.current_run_id);
        let newly_scheduled = manager.collect_new_ready_tasks();
        let run_just_finished = self.maybe_finish_run();

        SchedulerStep {
            newly_scheduled,
            newly_failed: Vec::new(),
            run_just_finished,
        }
    }

    fn completion_step_internal(&mut self, task: TaskId, outcome: TaskOutcome) -> SchedulerStep {
        let Some(run_id) = self.current_run_id else {
            warn!(task = %task, "completion with no active run; ignoring");
            return SchedulerStep::default();
        };

        let mut newly_failed = Vec::new();

        match self.tasks.get_mut(&task) {
            Some(info) => match outcome {
                TaskOutcome::Success => {
                    info.run_state = Some(RunState::DoneSuccess);
                    info.last_successful_run = Some(run_id);
                    debug!(task = %info.task, run_id, "task completed successfully");
                }
                TaskOutcome::Failed => {
                    info.run_state = Some(RunState::DoneFailed);
                    info.last_failed_run = Some(run_id);
                    warn!(task = %info.task, run_id, "task failed");
                    newly_failed.push(task);
                    let mut manager =
                        StateManager::new(&self.graph, &mut self.tasks, self.current_run_id);
                    newly_failed.extend(manager.mark_dependents_failed(task));
                }
            },
            None => {
                warn!(task = %task, "completion for unknown task; ignoring");
                return SchedulerStep::default();
            }
        }

        // OnSettled dependents become ready on failure as well.
        let mut manager = StateManager::new(&self.graph, &mut self.tasks, self.current_run_id);
        let newly_scheduled = manager.collect_new_ready_tasks();
        let run_just_finished = self.maybe_finish_run();

        SchedulerStep {
            newly_scheduled,
            newly_failed,
            run_just_finished,
        }
    }
}

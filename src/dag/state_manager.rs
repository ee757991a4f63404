// src/dag/state_manager.rs

//! Per-run state management for tasks in the scheduler.

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, info, warn};

use crate::dag::task_info::{RunState, ScheduledTask, TaskInfo};
use crate::dag::TaskGraph;
use crate::types::{EdgeKind, TaskId};

/// Manages per-run state transitions for tasks.
pub struct StateManager<'a> {
    graph: &'a TaskGraph,
    tasks: &'a mut BTreeMap<TaskId, TaskInfo>,
    current_run_id: Option<u64>,
}

impl<'a> StateManager<'a> {
    pub fn new(
        graph: &'a TaskGraph,
        tasks: &'a mut BTreeMap<TaskId, TaskInfo>,
        current_run_id: Option<u64>,
    ) -> Self {
        Self {
            graph,
            tasks,
            current_run_id,
        }
    }

    /// Include a triggered task and all its downstream dependents in this run.
    ///
    /// - Tasks that were not yet part of the run are marked `Pending`.
    /// - Tasks already participating in this run keep their current state.
    pub fn mark_task_and_dependents_pending(&mut self, root: TaskId) {
        let mut stack = vec![root];
        let mut visited: HashSet<TaskId> = HashSet::new();

        while let Some(task) = stack.pop() {
            if !visited.insert(task) {
                continue;
            }

            if let Some(info) = self.tasks.get_mut(&task) {
                if info.run_state.is_none() {
                    info.run_state = Some(RunState::Pending);
                    debug!(task = %info.task, "marked Pending for this run");
                }
                stack.extend(self.graph.dependents_of(task).iter().map(|&(t, _)| t));
            } else {
                warn!(task = %task, "node in DAG not present in tasks map");
            }
        }
    }

    pub fn deps_satisfied_for_info(&self, info: &TaskInfo) -> bool {
        ReadOnlyStateManager::new(self.tasks).deps_satisfied_for_info(info)
    }

    /// Fail every pending dependent reachable from `failed_task` through
    /// `OnSuccess` edges.
    ///
    /// `OnSettled` dependents are left alone; they become ready once all of
    /// their dependencies settled. Returns the newly failed tasks, excluding
    /// `failed_task` itself.
    pub fn mark_dependents_failed(&mut self, failed_task: TaskId) -> Vec<TaskId> {
        let mut stack: Vec<TaskId> = gated_dependents(self.graph, failed_task);
        let mut newly_failed = Vec::new();

        while let Some(task) = stack.pop() {
            if let Some(info) = self.tasks.get_mut(&task) {
                if matches!(info.run_state, Some(RunState::Pending)) {
                    info.run_state = Some(RunState::DoneFailed);
                    if let Some(run_id) = self.current_run_id {
                        info.last_failed_run = Some(run_id);
                    }
                    warn!(
                        task = %info.task,
                        upstream = %failed_task,
                        "not running task: a dependency it needs failed"
                    );
                    newly_failed.push(info.task);
                    stack.extend(gated_dependents(self.graph, task));
                }
            }
        }

        newly_failed
    }

    /// Collect tasks that are `Pending` and whose dependencies are satisfied,
    /// mark them as `Running`, and return them as `ScheduledTask`s.
    pub fn collect_new_ready_tasks(&mut self) -> Vec<ScheduledTask> {
        let candidates: Vec<TaskId> = self
            .tasks
            .values()
            .filter(|info| {
                matches!(info.run_state, Some(RunState::Pending))
                    && self.deps_satisfied_for_info(info)
            })
            .map(|info| info.task)
            .collect();

        let mut ready = Vec::with_capacity(candidates.len());
        for task in candidates {
            if let Some(info) = self.tasks.get_mut(&task) {
                info!(
                    task = %info.task,
                    run_id = self.current_run_id,
                    long_lived = info.long_lived,
                    "scheduling task"
                );
                info.run_state = Some(RunState::Running);
                ready.push(ScheduledTask::from_task_info(
                    info,
                    self.current_run_id.unwrap_or(0),
                ));
            }
        }

        ready
    }

    /// Check if all tasks are in a terminal state.
    pub fn all_tasks_terminal(&self) -> bool {
        !self.tasks.values().any(|info| {
            matches!(
                info.run_state,
                Some(RunState::Pending) | Some(RunState::Running)
            )
        })
    }
}

fn gated_dependents(graph: &TaskGraph, task: TaskId) -> Vec<TaskId> {
    graph
        .dependents_of(task)
        .iter()
        .filter(|&&(_, kind)| kind == EdgeKind::OnSuccess)
        .map(|&(t, _)| t)
        .collect()
}

/// A read-only view of the task map for checking dependency satisfaction.
pub struct ReadOnlyStateManager<'a> {
    tasks: &'a BTreeMap<TaskId, TaskInfo>,
}

impl<'a> ReadOnlyStateManager<'a> {
    pub fn new(tasks: &'a BTreeMap<TaskId, TaskInfo>) -> Self {
        Self { tasks }
    }

    /// Whether every dependency of `info` lets it run in the current run.
    ///
    /// - `OnSuccess`: the dependency succeeded in this run, or did not take
    ///   part and succeeded before.
    /// - `OnSettled`: the dependency finished this run either way, or did
    ///   not take part and has run before.
    pub fn deps_satisfied_for_info(&self, info: &TaskInfo) -> bool {
        info.deps.iter().all(|&(dep_task, kind)| {
            let Some(dep) = self.tasks.get(&dep_task) else {
                warn!(task = %info.task, dep = %dep_task, "dependency missing from tasks map");
                return false;
            };

            match (dep.run_state, kind) {
                (Some(RunState::DoneSuccess), _) => true,
                (Some(RunState::DoneFailed), EdgeKind::OnSettled) => true,
                (Some(RunState::DoneFailed), EdgeKind::OnSuccess) => false,
                (Some(RunState::Pending) | Some(RunState::Running), _) => false,
                (None, EdgeKind::OnSuccess) => dep.last_successful_run.is_some(),
                (None, EdgeKind::OnSettled) => {
                    dep.last_successful_run.is_some() || dep.last_failed_run.is_some()
                }
            }
        })
    }
}

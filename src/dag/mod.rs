// src/dag/mod.rs

//! The plan for one invocation and the per-run bookkeeping over it.
//!
//! [`TaskGraph`] is built once from the CLI target and never changes.
//! [`Scheduler`] walks it run by run: it marks tasks pending, hands out the
//! ones whose gates are open, and fails `OnSuccess` dependents of a failed
//! task without running them. [`state_manager`] holds the transition
//! helpers the scheduler uses.

pub mod graph;
pub mod scheduler;
pub mod scheduler_step;
pub mod state_manager;
pub mod task_info;

pub use graph::TaskGraph;
pub use scheduler::Scheduler;
pub use scheduler_step::SchedulerStep;
pub use task_info::{ScheduledTask, TaskRunState};

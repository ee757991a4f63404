// src/exec/mod.rs

//! Task execution layer.
//!
//! Runs the bodies of scheduled tasks and reports back to the orchestration
//! runtime via `RuntimeEvent`s.
//!
//! - [`task_runner`] runs one finite task on the blocking pool.
//! - [`backend`] provides the `ExecutorBackend` trait and the
//!   `RealExecutorBackend` that the runtime uses in production, and which
//!   tests replace with a fake implementation.

pub mod backend;
pub mod task_runner;

pub use backend::{ExecutorBackend, RealExecutorBackend};

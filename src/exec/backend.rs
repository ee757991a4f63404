// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The runtime talks to an `ExecutorBackend` instead of running task bodies
//! itself. This makes it easy to swap in a fake executor in tests.
//!
//! - `RealExecutorBackend` is the implementation used by `assetdag`. It runs
//!   asset pipelines on the blocking pool and owns the watch session once
//!   `watching` is up.
//! - Tests can provide their own `ExecutorBackend` that, for example, records
//!   which tasks were scheduled and directly emits `TaskCompleted` events.

use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::dag::ScheduledTask;
use crate::engine::{RuntimeEvent, TaskOutcome};
use crate::errors::Result;
use crate::tasks::TaskContext;
use crate::types::ReloadEvent;
use crate::watch::WatchSession;

use super::task_runner::run_task;

/// Trait abstracting how scheduled tasks are executed and how browsers are
/// notified.
pub trait ExecutorBackend: Send {
    /// Dispatch the given tasks for execution.
    ///
    /// Completion is reported later through `RuntimeEvent`s.
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Push a reload event to connected browsers.
    fn notify(&mut self, event: ReloadEvent) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Real executor backend used in production.
#[derive(Debug)]
pub struct RealExecutorBackend {
    ctx: TaskContext,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    session: Option<WatchSession>,
}

impl RealExecutorBackend {
    pub fn new(ctx: TaskContext, runtime_tx: mpsc::Sender<RuntimeEvent>) -> Self {
        Self {
            ctx,
            runtime_tx,
            session: None,
        }
    }

    /// Start the watch session and report it up, or report `watching` as
    /// failed.
    async fn start_watching(&mut self, task: ScheduledTask) {
        let event = match WatchSession::start(&self.ctx, self.runtime_tx.clone()).await {
            Ok(session) => {
                self.session = Some(session);
                RuntimeEvent::TaskProgressed { task: task.task }
            }
            Err(err) => {
                error!(task = %task.task, origin = %task.origin, error = %err, "task failed");
                RuntimeEvent::TaskCompleted {
                    task: task.task,
                    origin: task.origin,
                    outcome: TaskOutcome::Failed,
                    outputs: Vec::new(),
                }
            }
        };

        // The runtime is blocked on this call; never wait on its channel here.
        report_in_background(self.runtime_tx.clone(), task, event);
    }
}

/// Send `event` to the runtime from a detached task. The handle resolves to
/// whether the runtime received it.
fn report_in_background(
    tx: mpsc::Sender<RuntimeEvent>,
    task: ScheduledTask,
    event: RuntimeEvent,
) -> JoinHandle<bool> {
    tokio::spawn(async move {
        match tx.send(event).await {
            Ok(()) => true,
            Err(err) => {
                warn!(task = %task.task, origin = %task.origin, "failed to report watch start to runtime: {err}");
                false
            }
        }
    })
}

impl ExecutorBackend for RealExecutorBackend {
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            for task in tasks {
                if task.long_lived {
                    if self.session.is_some() {
                        debug!(task = %task.task, "watch session already active");
                        continue;
                    }
                    info!(task = %task.task, origin = %task.origin, "starting task");
                    self.start_watching(task).await;
                } else {
                    tokio::spawn(run_task(self.ctx.clone(), task, self.runtime_tx.clone()));
                }
            }
            Ok(())
        })
    }

    fn notify(&mut self, event: ReloadEvent) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            match &self.session {
                Some(session) => {
                    let clients = session.notify(event);
                    debug!(clients, "reload event sent");
                }
                None => debug!(?event, "no watch session; dropping reload event"),
            }
            Ok(())
        })
    }
}

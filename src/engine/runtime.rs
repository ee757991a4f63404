// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::dag::ScheduledTask;
use crate::errors::Result;
use crate::exec::ExecutorBackend;
use crate::types::ReloadEvent;

use super::core::CoreRuntime;
use super::{CoreCommand, RunReport, RuntimeEvent};

/// Drives the core runtime in response to `RuntimeEvent`s,
/// and delegates task execution and notifications to an `ExecutorBackend`.
///
/// All runtime semantics live in `CoreRuntime`; this struct only reads
/// events from the channel and carries out the returned commands.
pub struct Runtime<E: ExecutorBackend> {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    executor: E,
}

impl<E: ExecutorBackend> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<E: ExecutorBackend> Runtime<E> {
    pub fn new(core: CoreRuntime, event_rx: mpsc::Receiver<RuntimeEvent>, executor: E) -> Self {
        Self {
            core,
            event_rx,
            executor,
        }
    }

    /// Main event loop.
    ///
    /// Returns once the core asks to stop or the event channel closes. The
    /// report lists the plan tasks that failed.
    pub async fn run(mut self) -> Result<RunReport> {
        info!("assetdag runtime started");

        loop {
            let event = match self.event_rx.recv().await {
                Some(e) => e,
                None => {
                    info!("runtime event channel closed; exiting");
                    break;
                }
            };

            debug!(?event, "runtime received event");

            let step = self.core.step(event);

            for command in step.commands {
                self.execute_command(command).await?;
            }

            if !step.keep_running {
                info!("core requested exit; stopping runtime");
                break;
            }
        }

        let report = self.core.report();
        info!(failed = ?report.failed, "runtime exiting");
        Ok(report)
    }

    async fn execute_command(&mut self, command: CoreCommand) -> Result<()> {
        match command {
            CoreCommand::DispatchTasks(tasks) => self.spawn_ready(tasks).await?,
            CoreCommand::Notify(event) => self.notify(event).await?,
            CoreCommand::RequestExit => {
                // keep_running is already false alongside this command.
                debug!("core issued RequestExit command");
            }
        }
        Ok(())
    }

    async fn spawn_ready(&mut self, tasks: Vec<ScheduledTask>) -> Result<()> {
        if tasks.is_empty() {
            return Ok(());
        }

        let ids: Vec<_> = tasks.iter().map(|t| t.task).collect();
        debug!(?ids, "dispatching ready tasks");

        self.executor.spawn_ready_tasks(tasks).await
    }

    async fn notify(&mut self, event: ReloadEvent) -> Result<()> {
        debug!(?event, "sending reload notification");
        self.executor.notify(event).await
    }
}

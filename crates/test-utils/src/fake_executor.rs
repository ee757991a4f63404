use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use assetdag::dag::ScheduledTask;
use assetdag::engine::{RuntimeEvent, TaskOutcome};
use assetdag::errors::Result;
use assetdag::exec::ExecutorBackend;
use assetdag::types::{ReloadEvent, TaskId};
use tokio::sync::mpsc;

/// What a [`FakeExecutor`] saw, shared with the test.
#[derive(Debug, Clone, Default)]
pub struct FakeLog {
    dispatched: Arc<Mutex<Vec<ScheduledTask>>>,
    notifications: Arc<Mutex<Vec<ReloadEvent>>>,
}

impl FakeLog {
    pub fn dispatched(&self) -> Vec<ScheduledTask> {
        self.dispatched.lock().unwrap().clone()
    }

    pub fn dispatched_tasks(&self) -> Vec<TaskId> {
        self.dispatched().iter().map(|t| t.task).collect()
    }

    pub fn notifications(&self) -> Vec<ReloadEvent> {
        self.notifications.lock().unwrap().clone()
    }
}

/// A fake executor that:
/// - records which tasks were dispatched and which reloads were sent
/// - immediately reports `TaskProgressed` for long-lived tasks
/// - immediately reports `TaskCompleted` for everything else, successful
///   unless told otherwise through [`FakeExecutor::fail`]
///
/// Reports go through the runtime channel while the runtime awaits this
/// backend, so the channel needs room for them.
pub struct FakeExecutor {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    log: FakeLog,
    failing: Vec<TaskId>,
    outputs: HashMap<TaskId, Vec<String>>,
}

impl FakeExecutor {
    pub fn new(runtime_tx: mpsc::Sender<RuntimeEvent>) -> (Self, FakeLog) {
        let log = FakeLog::default();
        let executor = Self {
            runtime_tx,
            log: log.clone(),
            failing: Vec::new(),
            outputs: HashMap::new(),
        };
        (executor, log)
    }

    /// Report `task` as failed every time it runs.
    pub fn fail(mut self, task: TaskId) -> Self {
        self.failing.push(task);
        self
    }

    /// Served paths reported when `task` succeeds.
    pub fn with_outputs(mut self, task: TaskId, outputs: &[&str]) -> Self {
        self.outputs
            .insert(task, outputs.iter().map(|s| s.to_string()).collect());
        self
    }
}

impl ExecutorBackend for FakeExecutor {
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            for t in tasks {
                self.log.dispatched.lock().unwrap().push(t);

                let event = if t.long_lived {
                    RuntimeEvent::TaskProgressed { task: t.task }
                } else if self.failing.contains(&t.task) {
                    RuntimeEvent::TaskCompleted {
                        task: t.task,
                        origin: t.origin,
                        outcome: TaskOutcome::Failed,
                        outputs: Vec::new(),
                    }
                } else {
                    RuntimeEvent::TaskCompleted {
                        task: t.task,
                        origin: t.origin,
                        outcome: TaskOutcome::Success,
                        outputs: self.outputs.get(&t.task).cloned().unwrap_or_default(),
                    }
                };

                self.runtime_tx
                    .send(event)
                    .await
                    .map_err(anyhow::Error::from)?;
            }
            Ok(())
        })
    }

    fn notify(&mut self, event: ReloadEvent) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            self.log.notifications.lock().unwrap().push(event);
            Ok(())
        })
    }
}

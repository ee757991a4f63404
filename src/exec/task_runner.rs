// src/exec/task_runner.rs

//! Runs one finite task body and reports back.

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::dag::ScheduledTask;
use crate::engine::{RuntimeEvent, TaskOutcome};
use crate::tasks::TaskContext;

/// Run a finite task on the blocking pool and send `TaskCompleted`.
///
/// Failures are logged here; the runtime only sees the outcome.
pub async fn run_task(
    ctx: TaskContext,
    task: ScheduledTask,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) {
    info!(task = %task.task, origin = %task.origin, "starting task");

    let (outcome, outputs) = match run_task_inner(&ctx, task).await {
        Ok(outputs) => {
            info!(
                task = %task.task,
                origin = %task.origin,
                written = outputs.len(),
                "task finished"
            );
            (TaskOutcome::Success, outputs)
        }
        Err(err) => {
            error!(
                task = %task.task,
                origin = %task.origin,
                error = format!("{err:#}"),
                "task failed"
            );
            (TaskOutcome::Failed, Vec::new())
        }
    };

    let event = RuntimeEvent::TaskCompleted {
        task: task.task,
        origin: task.origin,
        outcome,
        outputs,
    };
    if let Err(err) = runtime_tx.send(event).await {
        warn!(task = %task.task, "failed to report completion to runtime: {err}");
    }
}

/// Returns the written files as paths served below the app directory.
async fn run_task_inner(ctx: &TaskContext, task: ScheduledTask) -> anyhow::Result<Vec<String>> {
    let body_ctx = ctx.clone();
    let report = tokio::task::spawn_blocking(move || body_ctx.run_blocking(task.task))
        .await
        .with_context(|| format!("task '{}' panicked", task.task))??;

    Ok(ctx.served_paths(&report.written))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::ConfigFile;
    use crate::engine::RunOrigin;
    use crate::fs::MockFileSystem;
    use crate::types::TaskId;

    #[tokio::test]
    async fn reports_served_outputs_on_success() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/app/js/main.js", "let answer = 42;\n");
        let ctx = TaskContext::new(ConfigFile::defaults(), Arc::new(fs.clone()), "/p");
        let (tx, mut rx) = mpsc::channel(4);

        run_task(ctx, ScheduledTask::reactive(TaskId::Scripts, 7), tx).await;

        match rx.recv().await.unwrap() {
            RuntimeEvent::TaskCompleted {
                task,
                origin,
                outcome,
                outputs,
            } => {
                assert_eq!(task, TaskId::Scripts);
                assert_eq!(origin, RunOrigin::Reactive { id: 7 });
                assert_eq!(outcome, TaskOutcome::Success);
                assert_eq!(outputs, vec!["js/main.min.js".to_string()]);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn reports_failure_without_outputs() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/app/pages/index.html", "<!--=include missing.html -->\n");
        let ctx = TaskContext::new(ConfigFile::defaults(), Arc::new(fs), "/p");
        let (tx, mut rx) = mpsc::channel(4);

        run_task(ctx, ScheduledTask::reactive(TaskId::Pages, 1), tx).await;

        assert!(matches!(
            rx.recv().await.unwrap(),
            RuntimeEvent::TaskCompleted { outcome: TaskOutcome::Failed, ref outputs, .. } if outputs.is_empty()
        ));
    }
}

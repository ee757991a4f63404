// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod pipeline;
pub mod server;
pub mod tasks;
pub mod transform;
pub mod types;
pub mod watch;

use std::sync::Arc;

use anyhow::{anyhow, Result};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{project_root, resolve_config, ConfigFile};
use crate::dag::{Scheduler, TaskGraph};
use crate::engine::{CoreRuntime, RunReport, Runtime, RuntimeEvent};
use crate::exec::RealExecutorBackend;
use crate::fs::{FileSystem, RealFileSystem};
use crate::tasks::TaskContext;
use crate::types::{Target, TaskId};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - task graph / scheduler / runtime
/// - executor (which starts the watch session when asked to)
/// - Ctrl-C handling
///
/// The report lists failed plan tasks; `main` maps it to the exit code.
pub async fn run(args: CliArgs) -> Result<RunReport> {
    let target = args.target().map_err(|e| anyhow!(e))?;
    let cfg = resolve_config(args.config.as_deref())?;
    let root = project_root(args.config.as_deref());
    let graph = TaskGraph::for_target(target)?;

    if args.dry_run {
        print_dry_run(target, &graph, &cfg, &root)?;
        return Ok(RunReport::default());
    }

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let ctx = TaskContext::new(cfg, fs, root);
    info!(%target, root = ?ctx.root, "starting");

    // Runtime event channel.
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);

    let executor = RealExecutorBackend::new(ctx, rt_tx.clone());

    // Ctrl-C → graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    rt_tx.send(RuntimeEvent::PlanStarted).await?;

    let core = CoreRuntime::new(Scheduler::new(graph));
    let runtime = Runtime::new(core, rt_rx, executor);
    Ok(runtime.run().await?)
}

/// Dry-run output: the plan, the watch table and every pipeline involved.
fn print_dry_run(
    target: Target,
    graph: &TaskGraph,
    cfg: &ConfigFile,
    root: &std::path::Path,
) -> Result<()> {
    println!("assetdag dry-run: {target}");
    println!("  root: {}", root.display());
    println!("  app: {}", cfg.app_dir().display());
    println!("  dist: {}", cfg.dist_dir().display());
    println!();

    println!("tasks:");
    for task in graph.tasks() {
        println!("  - {task}");
        for (dep, kind) in graph.dependencies_of(task) {
            println!("      after {dep} ({kind:?})");
        }
    }

    let pipelines = tasks::PipelineSet::new(cfg.clone(), Arc::new(RealFileSystem), root);
    let mut shown_pipeline = false;
    for task in graph.tasks() {
        if let Some(pipeline) = pipelines.pipeline_for(task)? {
            if !shown_pipeline {
                println!();
                println!("pipelines:");
                shown_pipeline = true;
            }
            println!("  {task} -> {}", pipeline.dest.display());
            for stage in &pipeline.stages {
                let steps: Vec<&str> = stage.steps.iter().map(|s| s.name()).collect();
                match &stage.selector {
                    Some(selector) => println!("      {:?} | {}", selector.patterns(), steps.join(" | ")),
                    None => println!("      {}", steps.join(" | ")),
                }
            }
        }
    }

    if graph.contains(TaskId::Building) {
        println!();
        println!("build globs:");
        for glob in &cfg.build_globs {
            println!("  {glob}");
        }
    }

    if graph.contains(TaskId::Watching) {
        println!();
        println!("watch bindings (server {}):", cfg.server_addr());
        for binding in watch::build_bindings(cfg)? {
            println!("  {} {:?} -> {:?}", binding.name(), binding.globs(), binding.action());
        }
    }

    debug!("dry-run complete (no execution)");
    Ok(())
}

// src/tasks/mod.rs

//! Synchronous task bodies.
//!
//! Everything here is blocking filesystem and CPU work. The executor runs it
//! on tokio's blocking pool; tests call it directly against a
//! [`MockFileSystem`](crate::fs::MockFileSystem).

pub mod build;
pub mod pipelines;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::ConfigFile;
use crate::fs::FileSystem;
use crate::pipeline::{run_pipeline, PipelineReport, TransformError};
use crate::types::TaskId;

pub use build::{building, clean};
pub use pipelines::PipelineSet;

/// Everything a task body needs: configuration, filesystem and project root.
#[derive(Debug, Clone)]
pub struct TaskContext {
    pub cfg: ConfigFile,
    pub fs: Arc<dyn FileSystem>,
    pub root: PathBuf,
}

impl TaskContext {
    pub fn new(cfg: ConfigFile, fs: Arc<dyn FileSystem>, root: impl Into<PathBuf>) -> Self {
        Self {
            cfg,
            fs,
            root: root.into(),
        }
    }

    pub fn pipelines(&self) -> PipelineSet {
        PipelineSet::new(self.cfg.clone(), Arc::clone(&self.fs), self.root.clone())
    }

    /// Run a finite task to completion.
    ///
    /// `watching` never completes, so it is rejected here; the executor
    /// starts it through the watch session instead.
    pub fn run_blocking(&self, task: TaskId) -> Result<PipelineReport, TransformError> {
        let fs = self.fs.as_ref();
        match task {
            TaskId::Clean => {
                clean(fs, &self.root, self.cfg.dist_dir())?;
                Ok(PipelineReport::default())
            }
            TaskId::Building => building(
                fs,
                &self.root,
                self.cfg.app_dir(),
                self.cfg.dist_dir(),
                &self.cfg.build_globs,
            ),
            TaskId::Watching => Err(TransformError::step(
                task.as_str(),
                Path::new(""),
                "long-lived task cannot run to completion",
            )),
            asset => match self.pipelines().pipeline_for(asset)? {
                Some(pipeline) => run_pipeline(fs, &self.root, &pipeline),
                None => Ok(PipelineReport::default()),
            },
        }
    }

    /// Stylesheets written by a styles run, as URL paths below the app
    /// directory.
    pub fn served_paths(&self, written: &[PathBuf]) -> Vec<String> {
        written
            .iter()
            .filter_map(|p| p.strip_prefix(self.cfg.app_dir()).ok())
            .map(|p| p.to_string_lossy().replace('\\', "/"))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MockFileSystem;

    fn ctx(fs: &MockFileSystem) -> TaskContext {
        TaskContext::new(ConfigFile::defaults(), Arc::new(fs.clone()), "/p")
    }

    #[test]
    fn clean_and_building_run_through_the_context() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/app/index.html", "<html></html>");
        fs.add_file("/p/dist/stale.txt", "x");

        let ctx = ctx(&fs);
        ctx.run_blocking(TaskId::Clean).unwrap();
        let report = ctx.run_blocking(TaskId::Building).unwrap();

        assert_eq!(report.written, vec![PathBuf::from("dist/index.html")]);
        assert!(fs.contents("/p/dist/stale.txt").is_none());
    }

    #[test]
    fn watching_cannot_run_blocking() {
        let fs = MockFileSystem::new();
        assert!(ctx(&fs).run_blocking(TaskId::Watching).is_err());
    }

    #[test]
    fn served_paths_are_relative_to_the_app_dir() {
        let fs = MockFileSystem::new();
        let paths = ctx(&fs).served_paths(&[PathBuf::from("app/css/style.min.css")]);
        assert_eq!(paths, vec!["css/style.min.css".to_string()]);
    }

    #[test]
    fn asset_with_no_sources_writes_nothing() {
        let fs = MockFileSystem::new();
        let report = ctx(&fs).run_blocking(TaskId::Images).unwrap();
        assert!(report.written.is_empty());
    }
}

// src/pipeline/mod.rs

//! File-stream pipelines.
//!
//! An [`AssetPipeline`] is an ordered list of [`Stage`]s plus a destination
//! directory. Each stage may add freshly selected source files to the
//! stream, filter the stream through a [`NewerGuard`], and then hand the
//! stream to its [`Step`]s in declared order. Once every stage has run, the
//! surviving entries are written below the destination.
//!
//! Steps never touch the filesystem. They take ownership of a
//! `Vec<FileEntry>` and return the next one, so a step can map files 1:1,
//! expand one file into several, or fold the whole stream into one entry.

pub mod newer;
pub mod select;

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use thiserror::Error;
use tracing::{debug, info};

use crate::fs::FileSystem;
use crate::types::TaskId;

pub use newer::{NewerGuard, NewerMapping};
pub use select::{glob_base, SourceSelector};

/// Failure of a single pipeline run.
#[derive(Error, Debug)]
pub enum TransformError {
    #[error("failed to read {path:?}: {message}")]
    Read { path: PathBuf, message: String },

    #[error("failed to write {path:?}: {message}")]
    Write { path: PathBuf, message: String },

    #[error("{step} failed on {path:?}: {message}")]
    Step {
        step: String,
        path: PathBuf,
        message: String,
    },

    #[error("invalid glob {pattern:?}: {message}")]
    Glob { pattern: String, message: String },
}

impl TransformError {
    pub fn step(step: &str, path: impl Into<PathBuf>, message: impl fmt::Display) -> Self {
        TransformError::Step {
            step: step.to_string(),
            path: path.into(),
            message: message.to_string(),
        }
    }
}

/// One file travelling through a pipeline.
///
/// `path` is relative to the glob base the file was selected from, and later
/// to the pipeline's destination directory.
#[derive(Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: PathBuf,
    pub contents: Vec<u8>,
    /// Source modification time; `None` for entries produced by a step.
    pub modified: Option<SystemTime>,
}

impl fmt::Debug for FileEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileEntry")
            .field("path", &self.path)
            .field("len", &self.contents.len())
            .field("modified", &self.modified)
            .finish()
    }
}

impl FileEntry {
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
            modified: None,
        }
    }

    /// Lower-cased extension, if any.
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    }

    pub fn has_extension(&self, exts: &[&str]) -> bool {
        self.extension()
            .is_some_and(|ext| exts.iter().any(|e| *e == ext))
    }

    /// File name without its extension.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// A sibling entry with the same path but another extension.
    pub fn derive(&self, ext: &str, contents: Vec<u8>) -> FileEntry {
        FileEntry::new(self.path.with_extension(ext), contents)
    }

    /// Contents as UTF-8, or a step error naming `step`.
    pub fn text(&self, step: &str) -> Result<&str, TransformError> {
        std::str::from_utf8(&self.contents)
            .map_err(|e| TransformError::step(step, &self.path, format!("not UTF-8: {e}")))
    }
}

/// A transform over the whole stream.
pub trait Step: Send + Sync {
    fn name(&self) -> &str;
    fn apply(&self, entries: Vec<FileEntry>) -> Result<Vec<FileEntry>, TransformError>;
}

/// A transform applied to each accepted file independently.
///
/// Wrap it in [`PerFile`] to use it as a [`Step`]. Files the step does not
/// accept pass through untouched.
pub trait FileStep: Send + Sync {
    fn name(&self) -> &str;
    fn accepts(&self, entry: &FileEntry) -> bool;
    fn transform(&self, entry: FileEntry) -> Result<Vec<FileEntry>, TransformError>;
}

/// Adapter turning a [`FileStep`] into a [`Step`].
pub struct PerFile<T>(pub T);

impl<T: FileStep> Step for PerFile<T> {
    fn name(&self) -> &str {
        self.0.name()
    }

    fn apply(&self, entries: Vec<FileEntry>) -> Result<Vec<FileEntry>, TransformError> {
        let mut out = Vec::with_capacity(entries.len());
        for entry in entries {
            if self.0.accepts(&entry) {
                out.extend(self.0.transform(entry)?);
            } else {
                out.push(entry);
            }
        }
        Ok(out)
    }
}

/// One segment of a pipeline.
pub struct Stage {
    /// Files added to the stream before this stage's steps run.
    pub selector: Option<SourceSelector>,
    pub guard: Option<NewerGuard>,
    pub steps: Vec<Box<dyn Step>>,
}

impl Stage {
    pub fn select(selector: SourceSelector) -> Self {
        Self {
            selector: Some(selector),
            guard: None,
            steps: Vec::new(),
        }
    }

    pub fn guard(mut self, guard: NewerGuard) -> Self {
        self.guard = Some(guard);
        self
    }

    pub fn step(mut self, step: impl Step + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }
}

impl fmt::Debug for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let steps: Vec<&str> = self.steps.iter().map(|s| s.name()).collect();
        f.debug_struct("Stage")
            .field("selector", &self.selector)
            .field("guard", &self.guard)
            .field("steps", &steps)
            .finish()
    }
}

/// Source selection, transform chain and destination of one asset class.
#[derive(Debug)]
pub struct AssetPipeline {
    pub task: TaskId,
    /// Destination directory, relative to the project root.
    pub dest: PathBuf,
    pub stages: Vec<Stage>,
}

/// Outcome of a successful pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReport {
    /// Written files, relative to the project root.
    pub written: Vec<PathBuf>,
}

/// Run `pipeline` against the project rooted at `root`.
///
/// Nothing is written unless every step of every stage succeeded.
pub fn run_pipeline(
    fs: &dyn FileSystem,
    root: &Path,
    pipeline: &AssetPipeline,
) -> Result<PipelineReport, TransformError> {
    let dest_dir = root.join(&pipeline.dest);
    let mut stream: Vec<FileEntry> = Vec::new();

    for (index, stage) in pipeline.stages.iter().enumerate() {
        if let Some(selector) = &stage.selector {
            let selected = selector.select(fs, root)?;
            debug!(
                task = %pipeline.task,
                stage = index,
                selected = selected.len(),
                "selected source files"
            );
            stream.extend(selected);
        }

        if let Some(guard) = &stage.guard {
            stream = guard.filter(fs, &dest_dir, stream);
        }

        for step in &stage.steps {
            let before = stream.len();
            stream = step.apply(stream)?;
            debug!(
                task = %pipeline.task,
                stage = index,
                step = step.name(),
                before,
                after = stream.len(),
                "applied step"
            );
        }
    }

    // Later entries win when two share a destination.
    let mut outputs: BTreeMap<PathBuf, Vec<u8>> = BTreeMap::new();
    for entry in stream {
        outputs.insert(entry.path, entry.contents);
    }

    let mut report = PipelineReport::default();
    for (rel, contents) in outputs {
        let target = dest_dir.join(&rel);
        fs.write(&target, &contents)
            .map_err(|e| TransformError::Write {
                path: target.clone(),
                message: format!("{e:#}"),
            })?;
        report.written.push(pipeline.dest.join(&rel));
    }

    info!(
        task = %pipeline.task,
        written = report.written.len(),
        "pipeline finished"
    );

    Ok(report)
}

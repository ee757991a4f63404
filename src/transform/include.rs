// src/transform/include.rs

//! HTML/JS include directives.
//!
//! Recognised forms, each on its own line:
//!
//! ```text
//! <!--=include header.html -->
//! <!--=require nav.html -->
//! //=include part.js
//! //=require part.js
//! ```
//!
//! `require` inlines a given file at most once per output file.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::fs::FileSystem;
use crate::pipeline::{FileEntry, FileStep, TransformError};

static DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<indent>[ \t]*)(?:<!--\s*=\s*(?P<hkind>include|require)\s+(?P<hpath>[^\s]+?)\s*-->|//\s*=\s*(?P<jkind>include|require)\s+(?P<jpath>\S+))\s*$",
    )
    .expect("include directive regex is valid")
});

const STEP: &str = "include";

/// Resolves include directives against a set of search directories.
pub struct Include {
    fs: Arc<dyn FileSystem>,
    /// Directory of the source files being processed.
    source_dir: PathBuf,
    /// Additional search directories, tried in order.
    include_paths: Vec<PathBuf>,
    extensions: Vec<&'static str>,
}

impl Include {
    pub fn new(fs: Arc<dyn FileSystem>, source_dir: PathBuf, include_paths: Vec<PathBuf>) -> Self {
        Self {
            fs,
            source_dir,
            include_paths,
            extensions: vec!["html", "htm", "js"],
        }
    }

    fn resolve(&self, current_dir: &Path, target: &str) -> Option<PathBuf> {
        std::iter::once(current_dir)
            .chain(self.include_paths.iter().map(PathBuf::as_path))
            .map(|dir| dir.join(target))
            .find(|candidate| self.fs.is_file(candidate))
    }

    fn expand(
        &self,
        origin: &Path,
        text: &str,
        current_dir: &Path,
        stack: &mut Vec<PathBuf>,
        required: &mut HashSet<PathBuf>,
    ) -> Result<String, TransformError> {
        let mut out = String::with_capacity(text.len());

        for line in text.split_inclusive('\n') {
            let body = line.trim_end_matches(['\n', '\r']);
            let Some(caps) = DIRECTIVE.captures(body) else {
                out.push_str(line);
                continue;
            };

            let indent = caps.name("indent").map_or("", |m| m.as_str());
            let kind = caps
                .name("hkind")
                .or_else(|| caps.name("jkind"))
                .map_or("include", |m| m.as_str());
            let target = caps
                .name("hpath")
                .or_else(|| caps.name("jpath"))
                .map_or("", |m| m.as_str())
                .trim_matches(['"', '\'']);

            let resolved = self.resolve(current_dir, target).ok_or_else(|| {
                TransformError::step(STEP, origin, format!("cannot find included file '{target}'"))
            })?;

            if stack.contains(&resolved) {
                return Err(TransformError::step(
                    STEP,
                    origin,
                    format!("include cycle through {:?}", resolved),
                ));
            }
            if kind == "require" && !required.insert(resolved.clone()) {
                continue;
            }

            let included = self.fs.read_to_string(&resolved).map_err(|e| TransformError::Read {
                path: resolved.clone(),
                message: format!("{e:#}"),
            })?;
            let nested_dir = resolved
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| current_dir.to_path_buf());

            stack.push(resolved.clone());
            let expanded = self.expand(origin, &included, &nested_dir, stack, required)?;
            stack.pop();

            for inner in expanded.lines() {
                if inner.is_empty() {
                    out.push('\n');
                } else {
                    out.push_str(indent);
                    out.push_str(inner);
                    out.push('\n');
                }
            }
            if !line.ends_with('\n') && out.ends_with('\n') {
                out.pop();
            }
        }

        Ok(out)
    }
}

impl FileStep for Include {
    fn name(&self) -> &str {
        STEP
    }

    fn accepts(&self, entry: &FileEntry) -> bool {
        entry.has_extension(&self.extensions)
    }

    fn transform(&self, entry: FileEntry) -> Result<Vec<FileEntry>, TransformError> {
        let text = entry.text(STEP)?;
        let origin = self.source_dir.join(&entry.path);
        let current_dir = origin
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.source_dir.clone());

        let mut stack = vec![origin.clone()];
        let mut required = HashSet::new();
        let expanded = self.expand(&origin, text, &current_dir, &mut stack, &mut required)?;

        Ok(vec![FileEntry {
            contents: expanded.into_bytes(),
            ..entry
        }])
    }
}

// src/pipeline/select.rs

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher};

use crate::fs::{walk_files, FileSystem};
use crate::pipeline::{FileEntry, TransformError};

/// One compiled glob of a selector.
#[derive(Clone)]
struct SelectorGlob {
    pattern: String,
    negated: bool,
    /// No glob syntax: the pattern names exactly one file.
    literal: bool,
    matcher: GlobMatcher,
    /// Static directory prefix of the pattern.
    base: PathBuf,
}

/// Ordered glob list choosing source files, relative to the project root.
///
/// - A leading `!` makes a glob an exclusion.
/// - A file is selected when an inclusion matches it and no exclusion does.
///   An exclusion is final unless a *later* literal inclusion names the
///   file itself, as `app/images/sprite.svg` does after `!app/images/*.svg`.
///   Wildcard inclusions never re-open an excluded file.
/// - Selected files are ordered by the first inclusion glob that matched
///   them, then by path. Concatenating steps rely on this order.
/// - `*` does not cross directory separators; `**` does.
#[derive(Clone)]
pub struct SourceSelector {
    globs: Vec<SelectorGlob>,
    base: Option<PathBuf>,
}

impl fmt::Debug for SourceSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceSelector")
            .field("globs", &self.patterns())
            .field("base", &self.base)
            .finish()
    }
}

impl SourceSelector {
    pub fn new<I, S>(patterns: I) -> Result<Self, TransformError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut globs = Vec::new();
        for raw in patterns {
            let raw = raw.as_ref().trim();
            let (negated, pattern) = match raw.strip_prefix('!') {
                Some(rest) => (true, rest),
                None => (false, raw),
            };
            let matcher = GlobBuilder::new(pattern)
                .literal_separator(true)
                .build()
                .map_err(|e| TransformError::Glob {
                    pattern: raw.to_string(),
                    message: e.to_string(),
                })?
                .compile_matcher();

            globs.push(SelectorGlob {
                pattern: pattern.to_string(),
                negated,
                literal: !has_glob_syntax(pattern),
                matcher,
                base: glob_base(pattern),
            });
        }

        Ok(Self { globs, base: None })
    }

    /// Compute every entry path against `base` instead of each glob's own
    /// static prefix.
    pub fn with_base(mut self, base: impl Into<PathBuf>) -> Self {
        self.base = Some(base.into());
        self
    }

    /// Patterns as written, with `!` restored on exclusions.
    pub fn patterns(&self) -> Vec<String> {
        self.globs
            .iter()
            .map(|g| {
                if g.negated {
                    format!("!{}", g.pattern)
                } else {
                    g.pattern.clone()
                }
            })
            .collect()
    }

    /// Index of the inclusion glob that orders `rel_path`, or `None` when
    /// the path is not selected.
    pub fn selecting_glob(&self, rel_path: &str) -> Option<usize> {
        let first = self
            .globs
            .iter()
            .position(|g| !g.negated && g.matcher.is_match(rel_path))?;

        for (idx, glob) in self.globs.iter().enumerate() {
            if glob.negated && glob.matcher.is_match(rel_path) {
                let reopened = self.globs[idx + 1..]
                    .iter()
                    .any(|later| !later.negated && later.literal && later.matcher.is_match(rel_path));
                if !reopened {
                    return None;
                }
            }
        }

        Some(first)
    }

    pub fn matches(&self, rel_path: &str) -> bool {
        self.selecting_glob(rel_path).is_some()
    }

    /// Read every selected file below `root`.
    pub fn select(
        &self,
        fs: &dyn FileSystem,
        root: &Path,
    ) -> Result<Vec<FileEntry>, TransformError> {
        // (glob index, project-relative path) -> absolute path
        let mut candidates: BTreeMap<(usize, PathBuf), PathBuf> = BTreeMap::new();

        let mut walk_roots: Vec<&Path> = self
            .globs
            .iter()
            .filter(|g| !g.negated)
            .map(|g| g.base.as_path())
            .collect();
        walk_roots.sort();
        walk_roots.dedup();

        for walk_root in walk_roots {
            let abs_root = root.join(walk_root);
            let files = walk_files(fs, &abs_root).map_err(|e| TransformError::Read {
                path: abs_root.clone(),
                message: format!("{e:#}"),
            })?;

            for abs in files {
                let Ok(rel) = abs.strip_prefix(root) else {
                    continue;
                };
                let rel_str = slash_path(rel);
                if let Some(idx) = self.selecting_glob(&rel_str) {
                    candidates.insert((idx, rel.to_path_buf()), abs);
                }
            }
        }

        let mut entries = Vec::with_capacity(candidates.len());
        for ((idx, rel), abs) in candidates {
            let base = self.base.as_deref().unwrap_or(&self.globs[idx].base);
            let entry_path = rel.strip_prefix(base).unwrap_or(&rel).to_path_buf();

            let contents = fs.read(&abs).map_err(|e| TransformError::Read {
                path: abs.clone(),
                message: format!("{e:#}"),
            })?;
            let modified = fs.modified(&abs).ok();

            entries.push(FileEntry {
                path: entry_path,
                contents,
                modified,
            });
        }

        Ok(entries)
    }
}

/// Static directory prefix of a glob: every leading component without glob
/// syntax. A pattern with no glob syntax at all is a single file, so its
/// base is the parent directory.
pub fn glob_base(pattern: &str) -> PathBuf {
    let path = Path::new(pattern);
    let mut base = PathBuf::new();
    let mut had_glob = false;

    for component in path.components() {
        let Component::Normal(part) = component else {
            base.push(component);
            continue;
        };
        let part = part.to_string_lossy();
        if has_glob_syntax(&part) {
            had_glob = true;
            break;
        }
        base.push(part.as_ref());
    }

    if !had_glob {
        base.pop();
    }
    base
}

fn has_glob_syntax(pattern: &str) -> bool {
    pattern.contains(['*', '?', '[', '{'])
}

/// Path rendered with forward slashes, as globs expect.
pub(crate) fn slash_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

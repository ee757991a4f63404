// src/watch/patterns.rs

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::config::ConfigFile;
use crate::pipeline::select::slash_path;
use crate::types::TaskId;

/// What a matching file change does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchAction {
    /// Start a reactive run of this asset class.
    Run(TaskId),
    /// Reload connected browsers without running anything.
    Reload,
}

/// One row of the watch table: globs relative to the project root plus the
/// action taken when a changed path matches.
#[derive(Clone)]
pub struct WatchBinding {
    name: &'static str,
    globs: Vec<String>,
    set: GlobSet,
    action: WatchAction,
}

impl fmt::Debug for WatchBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchBinding")
            .field("name", &self.name)
            .field("globs", &self.globs)
            .field("action", &self.action)
            .finish_non_exhaustive()
    }
}

impl WatchBinding {
    pub fn new(name: &'static str, globs: Vec<String>, action: WatchAction) -> Result<Self> {
        let set = build_globset(&globs)
            .with_context(|| format!("building watch globset for binding {name}"))?;
        Ok(Self {
            name,
            globs,
            set,
            action,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn globs(&self) -> &[String] {
        &self.globs
    }

    pub fn action(&self) -> WatchAction {
        self.action
    }

    /// `rel_path` is relative to the project root with forward slashes.
    pub fn matches(&self, rel_path: &str) -> bool {
        self.set.is_match(rel_path)
    }
}

/// The watch table for a configuration.
///
/// | binding | globs                                   | action        |
/// |---------|-----------------------------------------|---------------|
/// | styles  | `<app>/scss/**/*.scss`                  | run styles    |
/// | images  | `<app>/images/src/**`                   | run images    |
/// | scripts | `<app>/<scripts.entry>`                 | run scripts   |
/// | pages   | `<app>/components/*`, `<app>/pages/*`   | run pages     |
/// | html    | `<app>/*.html`                          | reload        |
pub fn build_bindings(cfg: &ConfigFile) -> Result<Vec<WatchBinding>> {
    let app = slash_path(cfg.app_dir());
    let under = |rest: &str| format!("{app}/{rest}");

    Ok(vec![
        WatchBinding::new(
            "styles",
            vec![under("scss/**/*.scss")],
            WatchAction::Run(TaskId::Styles),
        )?,
        WatchBinding::new(
            "images",
            vec![under("images/src/**")],
            WatchAction::Run(TaskId::Images),
        )?,
        WatchBinding::new(
            "scripts",
            vec![under(&slash_path(Path::new(&cfg.scripts.entry)))],
            WatchAction::Run(TaskId::Scripts),
        )?,
        WatchBinding::new(
            "pages",
            vec![under("components/*"), under("pages/*")],
            WatchAction::Run(TaskId::Pages),
        )?,
        WatchBinding::new("html", vec![under("*.html")], WatchAction::Reload)?,
    ])
}

/// Build a GlobSet where `*` stays within one path segment.
fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = GlobBuilder::new(pat)
            .literal_separator(true)
            .build()
            .with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actions_for(bindings: &[WatchBinding], rel: &str) -> Vec<WatchAction> {
        bindings
            .iter()
            .filter(|b| b.matches(rel))
            .map(|b| b.action())
            .collect()
    }

    #[test]
    fn default_table_routes_changes() {
        let bindings = build_bindings(&ConfigFile::defaults()).unwrap();

        assert_eq!(
            actions_for(&bindings, "app/scss/parts/_header.scss"),
            vec![WatchAction::Run(TaskId::Styles)]
        );
        assert_eq!(
            actions_for(&bindings, "app/images/src/icons/a.svg"),
            vec![WatchAction::Run(TaskId::Images)]
        );
        assert_eq!(
            actions_for(&bindings, "app/js/main.js"),
            vec![WatchAction::Run(TaskId::Scripts)]
        );
        assert_eq!(
            actions_for(&bindings, "app/components/header.html"),
            vec![WatchAction::Run(TaskId::Pages)]
        );
        assert_eq!(actions_for(&bindings, "app/index.html"), vec![WatchAction::Reload]);
    }

    #[test]
    fn outputs_and_unrelated_files_match_nothing() {
        let bindings = build_bindings(&ConfigFile::defaults()).unwrap();
        for rel in [
            "app/css/style.min.css",
            "app/js/main.min.js",
            "app/images/photo.avif",
            "app/pages/nested/deep.html",
            "README.md",
        ] {
            assert!(actions_for(&bindings, rel).is_empty(), "{rel} should not match");
        }
    }
}

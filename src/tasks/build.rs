// src/tasks/build.rs

//! Distribution tree: `clean` and `building`.

use std::path::Path;

use tracing::info;

use crate::fs::FileSystem;
use crate::pipeline::{run_pipeline, AssetPipeline, PipelineReport, SourceSelector, Stage, TransformError};
use crate::types::TaskId;

/// Remove `root/dist` recursively. A missing directory is not an error.
pub fn clean(fs: &dyn FileSystem, root: &Path, dist: &Path) -> Result<(), TransformError> {
    let target = root.join(dist);
    if !fs.exists(&target) {
        info!(path = ?target, "nothing to clean");
        return Ok(());
    }

    fs.remove_dir_all(&target).map_err(|e| TransformError::Write {
        path: target.clone(),
        message: format!("{e:#}"),
    })?;
    info!(path = ?target, "removed distribution directory");
    Ok(())
}

/// Copy every file selected by the ordered `globs` into `dist`, keeping its
/// path relative to `app`.
pub fn building(
    fs: &dyn FileSystem,
    root: &Path,
    app: &Path,
    dist: &Path,
    globs: &[String],
) -> Result<PipelineReport, TransformError> {
    let selector = SourceSelector::new(globs)?.with_base(app);
    let pipeline = AssetPipeline {
        task: TaskId::Building,
        dest: dist.to_path_buf(),
        stages: vec![Stage::select(selector)],
    };
    run_pipeline(fs, root, &pipeline)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::config::model::default_build_globs;
    use crate::fs::MockFileSystem;

    fn project() -> MockFileSystem {
        let fs = MockFileSystem::new();
        for path in [
            "/p/app/index.html",
            "/p/app/css/style.min.css",
            "/p/app/css/stray.css",
            "/p/app/js/main.js",
            "/p/app/js/main.min.js",
            "/p/app/images/photo.webp",
            "/p/app/images/icon.svg",
            "/p/app/images/sprite.svg",
            "/p/app/images/src/photo.jpg",
            "/p/app/images/symbol/sprite.symbol.html",
            "/p/app/images/stack/preview.html",
            "/p/app/fonts/Roboto.woff2",
            "/p/app/components/header.html",
            "/p/app/pages/index.html",
        ] {
            fs.add_file(path, path.as_bytes());
        }
        fs
    }

    #[test]
    fn building_follows_the_ordered_glob_list() {
        let fs = project();
        let globs = default_build_globs(Path::new("app"));
        let report = building(&fs, Path::new("/p"), Path::new("app"), Path::new("dist"), &globs)
            .unwrap();

        let expected: Vec<PathBuf> = [
            "dist/css/style.min.css",
            "dist/fonts/Roboto.woff2",
            "dist/images/photo.webp",
            "dist/images/sprite.svg",
            "dist/index.html",
            "dist/js/main.min.js",
            "dist/pages/index.html",
        ]
        .iter()
        .map(PathBuf::from)
        .collect();
        assert_eq!(report.written, expected);
        assert_eq!(fs.contents("/p/dist/index.html").unwrap(), b"/p/app/index.html");
    }

    #[test]
    fn shipped_files_match_no_exclusion_unless_named_literally() {
        let fs = project();
        let globs = default_build_globs(Path::new("app"));
        let report = building(&fs, Path::new("/p"), Path::new("app"), Path::new("dist"), &globs)
            .unwrap();
        assert!(fs.contents("/p/dist/images/stack/preview.html").is_none());

        for written in report.written {
            let rel = written.strip_prefix("dist").unwrap();
            let source = format!("app/{}", rel.to_string_lossy());
            for pattern in globs.iter().filter_map(|g| g.strip_prefix('!')) {
                let excluded = SourceSelector::new([pattern]).unwrap().matches(&source);
                let named = globs.iter().any(|g| *g == source);
                assert!(!excluded || named, "{source} shipped despite !{pattern}");
            }
        }
    }

    #[test]
    fn clean_then_build_drops_stray_files() {
        let fs = project();
        fs.add_file("/p/dist/old.txt", "stale");

        clean(&fs, Path::new("/p"), Path::new("dist")).unwrap();
        assert!(fs.contents("/p/dist/old.txt").is_none());

        let globs = default_build_globs(Path::new("app"));
        building(&fs, Path::new("/p"), Path::new("app"), Path::new("dist"), &globs).unwrap();
        assert!(fs.contents("/p/dist/old.txt").is_none());
        assert!(fs.contents("/p/dist/index.html").is_some());
    }

    #[test]
    fn clean_without_dist_is_a_no_op() {
        let fs = MockFileSystem::new();
        clean(&fs, Path::new("/p"), Path::new("dist")).unwrap();
    }
}

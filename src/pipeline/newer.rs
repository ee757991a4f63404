// src/pipeline/newer.rs

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::fs::FileSystem;
use crate::pipeline::FileEntry;

/// How a source entry maps onto the destination file it is compared with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewerMapping {
    /// Same relative path below the destination.
    SamePath,
    /// Same relative path with the extension replaced.
    Extension(String),
}

/// Incremental-build guard: drop entries whose destination is already at
/// least as new as the source.
///
/// Entries without a modification time (produced by an earlier step) always
/// pass.
#[derive(Debug, Clone)]
pub struct NewerGuard {
    mapping: NewerMapping,
}

impl NewerGuard {
    pub fn same_path() -> Self {
        Self {
            mapping: NewerMapping::SamePath,
        }
    }

    pub fn with_extension(ext: &str) -> Self {
        Self {
            mapping: NewerMapping::Extension(ext.to_string()),
        }
    }

    fn target(&self, path: &Path) -> PathBuf {
        match &self.mapping {
            NewerMapping::SamePath => path.to_path_buf(),
            NewerMapping::Extension(ext) => path.with_extension(ext),
        }
    }

    pub fn filter(
        &self,
        fs: &dyn FileSystem,
        dest_dir: &Path,
        entries: Vec<FileEntry>,
    ) -> Vec<FileEntry> {
        entries
            .into_iter()
            .filter(|entry| {
                let Some(source_time) = entry.modified else {
                    return true;
                };
                let target = dest_dir.join(self.target(&entry.path));
                match fs.modified(&target) {
                    Ok(dest_time) if dest_time >= source_time => {
                        debug!(path = ?entry.path, ?target, "destination up to date; skipping");
                        false
                    }
                    _ => true,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MockFileSystem;
    use std::time::{Duration, UNIX_EPOCH};

    fn source(path: &str, secs: u64) -> FileEntry {
        FileEntry {
            path: PathBuf::from(path),
            contents: Vec::new(),
            modified: Some(UNIX_EPOCH + Duration::from_secs(secs)),
        }
    }

    #[test]
    fn skips_sources_with_newer_mapped_destination() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/out/photo.avif", "a");
        fs.set_modified("/p/out/photo.avif", UNIX_EPOCH + Duration::from_secs(100));

        let guard = NewerGuard::with_extension("avif");
        let kept = guard.filter(&fs, Path::new("/p/out"), vec![source("photo.jpg", 50)]);
        assert!(kept.is_empty());

        let kept = guard.filter(&fs, Path::new("/p/out"), vec![source("photo.jpg", 150)]);
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn missing_destination_and_generated_entries_pass() {
        let fs = MockFileSystem::new();
        let guard = NewerGuard::same_path();
        let generated = FileEntry::new("photo.avif", "x");
        let kept = guard.filter(
            &fs,
            Path::new("/p/out"),
            vec![source("photo.jpg", 1), generated],
        );
        assert_eq!(kept.len(), 2);
    }
}

// src/transform/scss.rs

use std::path::PathBuf;

use grass::{Options, OutputStyle};

use crate::pipeline::{FileEntry, FileStep, TransformError};

/// SCSS compilation through `grass`, compressed output.
///
/// Accepts `.scss` and `.css` entries, so a concatenated bundle of vendor CSS
/// and SCSS sources compiles as one stylesheet. `.scss` outputs are renamed
/// to `.css`.
pub struct Scss {
    load_paths: Vec<PathBuf>,
}

impl Scss {
    pub fn new(load_paths: Vec<PathBuf>) -> Self {
        Self { load_paths }
    }

    pub fn compile(&self, source: &str) -> Result<String, String> {
        let mut options = Options::default().style(OutputStyle::Compressed);
        for path in &self.load_paths {
            options = options.load_path(path);
        }
        grass::from_string(source.to_owned(), &options).map_err(|e| e.to_string())
    }
}

impl FileStep for Scss {
    fn name(&self) -> &str {
        "scss"
    }

    fn accepts(&self, entry: &FileEntry) -> bool {
        entry.has_extension(&["scss", "css"])
    }

    fn transform(&self, entry: FileEntry) -> Result<Vec<FileEntry>, TransformError> {
        let css = self
            .compile(entry.text(self.name())?)
            .map_err(|message| TransformError::step(self.name(), &entry.path, message))?;

        let path = if entry.has_extension(&["scss"]) {
            entry.path.with_extension("css")
        } else {
            entry.path
        };
        Ok(vec![FileEntry::new(path, css)])
    }
}

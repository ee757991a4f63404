// src/transform/concat.rs

use std::path::PathBuf;

use crate::pipeline::{FileEntry, Step, TransformError};

/// Join every entry of the stream, in stream order, into one file.
pub struct Concat {
    output: PathBuf,
}

impl Concat {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
        }
    }
}

impl Step for Concat {
    fn name(&self) -> &str {
        "concat"
    }

    fn apply(&self, entries: Vec<FileEntry>) -> Result<Vec<FileEntry>, TransformError> {
        if entries.is_empty() {
            return Ok(entries);
        }

        let mut contents = Vec::new();
        for (i, entry) in entries.into_iter().enumerate() {
            if i > 0 {
                contents.push(b'\n');
            }
            contents.extend(entry.contents);
        }

        Ok(vec![FileEntry::new(self.output.clone(), contents)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_in_stream_order_with_newlines() {
        let out = Concat::new("main.min.js")
            .apply(vec![
                FileEntry::new("swiper-bundle.js", "lib()"),
                FileEntry::new("main.js", "app()"),
            ])
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].path, PathBuf::from("main.min.js"));
        assert_eq!(out[0].contents, b"lib()\napp()");
    }

    #[test]
    fn empty_stream_stays_empty() {
        assert!(Concat::new("x.js").apply(Vec::new()).unwrap().is_empty());
    }
}

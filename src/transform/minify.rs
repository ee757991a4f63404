// src/transform/minify.rs

use crate::pipeline::{FileEntry, FileStep, TransformError};

/// JavaScript minification backed by the `minifier` crate.
pub struct JsMinify;

impl FileStep for JsMinify {
    fn name(&self) -> &str {
        "js-minify"
    }

    fn accepts(&self, entry: &FileEntry) -> bool {
        entry.has_extension(&["js", "mjs"])
    }

    fn transform(&self, entry: FileEntry) -> Result<Vec<FileEntry>, TransformError> {
        let source = entry.text(self.name())?;
        let minified = minifier::js::minify(source).to_string();
        Ok(vec![FileEntry {
            contents: minified.into_bytes(),
            ..entry
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_comments_and_whitespace() {
        let source = "// greeting\nfunction greet(name) {\n    return 'hi ' + name;\n}\n";
        let out = JsMinify.transform(FileEntry::new("main.min.js", source)).unwrap();
        let text = String::from_utf8(out[0].contents.clone()).unwrap();
        assert!(!text.contains("greeting"));
        assert!(text.len() < source.len());
        assert!(text.contains("'hi '"));
    }

    #[test]
    fn is_deterministic() {
        let source = "var a = 1;\nvar b = a + 2;\n";
        let first = JsMinify.transform(FileEntry::new("a.js", source)).unwrap();
        let second = JsMinify.transform(FileEntry::new("a.js", source)).unwrap();
        assert_eq!(first[0].contents, second[0].contents);
    }
}

// src/transform/prefix.rs

//! Vendor prefixing for stylesheet declarations.
//!
//! Works line by line on CSS/SCSS sources: a declaration of a listed
//! property that starts its own line gets its prefixed variants inserted
//! directly before it, each on a line of its own holding only the
//! declaration. Prefixed declarations already present in the same
//! block are not repeated, so running the step twice changes nothing.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::pipeline::{FileEntry, FileStep, TransformError};

/// Properties that still need prefixes for older browsers, with the
/// prefixes they need.
const PREFIXED: &[(&str, &[&str])] = &[
    ("animation", &["-webkit-"]),
    ("appearance", &["-webkit-", "-moz-"]),
    ("backdrop-filter", &["-webkit-"]),
    ("backface-visibility", &["-webkit-"]),
    ("box-decoration-break", &["-webkit-"]),
    ("clip-path", &["-webkit-"]),
    ("hyphens", &["-webkit-", "-ms-"]),
    ("mask", &["-webkit-"]),
    ("mask-image", &["-webkit-"]),
    ("perspective", &["-webkit-"]),
    ("tab-size", &["-moz-"]),
    ("text-size-adjust", &["-webkit-", "-moz-", "-ms-"]),
    ("transform", &["-webkit-", "-ms-"]),
    ("transform-origin", &["-webkit-", "-ms-"]),
    ("transition", &["-webkit-"]),
    ("user-select", &["-webkit-", "-moz-", "-ms-"]),
];

static DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<indent>[ \t]*)(?P<prop>-?[a-zA-Z][a-zA-Z-]*)\s*:(?P<value>[^;{}]*);")
        .expect("declaration regex is valid")
});

pub struct Autoprefix;

impl Autoprefix {
    fn prefixes_for(prop: &str) -> Option<&'static [&'static str]> {
        PREFIXED
            .iter()
            .find(|(name, _)| *name == prop)
            .map(|(_, prefixes)| *prefixes)
    }

    pub fn prefix_source(source: &str) -> String {
        let mut out = String::with_capacity(source.len());
        // Prefixed properties already declared in the current block.
        let mut seen: HashSet<String> = HashSet::new();

        for line in source.split_inclusive('\n') {
            let body = line.trim_end_matches(['\n', '\r']);

            if let Some(caps) = DECLARATION.captures(body) {
                let indent = &caps["indent"];
                let prop = caps["prop"].to_ascii_lowercase();
                let value = &caps["value"];

                if prop.starts_with('-') {
                    seen.insert(prop);
                } else if let Some(prefixes) = Self::prefixes_for(&prop) {
                    let eol = &line[body.len()..];
                    let eol = if eol.is_empty() { "\n" } else { eol };
                    for prefix in prefixes {
                        let prefixed = format!("{prefix}{prop}");
                        if seen.insert(prefixed.clone()) {
                            out.push_str(indent);
                            out.push_str(&prefixed);
                            out.push(':');
                            out.push_str(value);
                            out.push(';');
                            out.push_str(eol);
                        }
                    }
                }
            }

            if body.contains('{') || body.contains('}') {
                seen.clear();
            }
            out.push_str(line);
        }

        out
    }
}

impl FileStep for Autoprefix {
    fn name(&self) -> &str {
        "autoprefix"
    }

    fn accepts(&self, entry: &FileEntry) -> bool {
        entry.has_extension(&["css", "scss"])
    }

    fn transform(&self, entry: FileEntry) -> Result<Vec<FileEntry>, TransformError> {
        let prefixed = Self::prefix_source(entry.text(self.name())?);
        Ok(vec![FileEntry {
            contents: prefixed.into_bytes(),
            ..entry
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adds_prefixes_before_the_declaration() {
        let out = Autoprefix::prefix_source(".a {\n  user-select: none;\n  color: red;\n}\n");
        assert_eq!(
            out,
            ".a {\n  -webkit-user-select: none;\n  -moz-user-select: none;\n  -ms-user-select: none;\n  user-select: none;\n  color: red;\n}\n"
        );
    }

    #[test]
    fn prefixing_is_idempotent() {
        let once = Autoprefix::prefix_source(".a {\n  appearance: none;\n  transition: all 1s;\n}\n");
        let twice = Autoprefix::prefix_source(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn block_closed_on_the_declaration_line_stays_balanced() {
        let out = Autoprefix::prefix_source(".a {\n  transition: all 1s; }\n");
        assert_eq!(
            out,
            ".a {\n  -webkit-transition: all 1s;\n  transition: all 1s; }\n"
        );
        assert_eq!(out.matches('}').count(), 1);
        assert_eq!(Autoprefix::prefix_source(&out), out);
    }

    #[test]
    fn selectors_with_colons_are_left_alone() {
        let src = "a:hover {\n  color: blue;\n}\n";
        assert_eq!(Autoprefix::prefix_source(src), src);
    }
}

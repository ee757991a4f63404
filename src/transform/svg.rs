// src/transform/svg.rs

//! SVG minification and symbol sprites.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;

use crate::pipeline::{FileEntry, Step, TransformError};
use crate::pipeline::select::slash_path;

static PROLOG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<\?xml.*?\?>").expect("prolog regex is valid"));
static DOCTYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!DOCTYPE[^>]*>").expect("doctype regex is valid"));
static COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("comment regex is valid"));
static METADATA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<metadata\b.*?</metadata>|<metadata\b[^>]*/>").expect("metadata regex is valid")
});
static BETWEEN_TAGS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r">\s+<").expect("whitespace regex is valid"));
/// Text-bearing elements; whitespace inside them is rendered.
static TEXT_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<text\b.*?</text>").expect("text regex is valid"));
static VIEW_BOX: LazyLock<Regex> = LazyLock::new(|| attribute_regex("viewBox"));
static WIDTH: LazyLock<Regex> = LazyLock::new(|| attribute_regex("width"));
static HEIGHT: LazyLock<Regex> = LazyLock::new(|| attribute_regex("height"));
static ROOT_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<svg\b(?P<attrs>[^>]*?)(?P<selfclose>/?)>").expect("svg regex is valid"));

/// Strip the XML prolog, doctype, comments, metadata and whitespace between
/// tags.
pub fn minify_svg(source: &str) -> String {
    let text = PROLOG.replace_all(source, "");
    let text = DOCTYPE.replace_all(&text, "");
    let text = COMMENT.replace_all(&text, "");
    let text = METADATA.replace_all(&text, "");
    collapse_between_tags(&text).trim().to_string()
}

/// Drop whitespace between tags, except inside `<text>` elements.
fn collapse_between_tags(source: &str) -> String {
    let text_blocks: Vec<_> = TEXT_BLOCK.find_iter(source).map(|m| m.range()).collect();
    let mut out = String::with_capacity(source.len());
    let mut last = 0;

    for gap in BETWEEN_TAGS.find_iter(source) {
        let inside_text = text_blocks
            .iter()
            .any(|block| block.start <= gap.start() && gap.end() <= block.end);
        if inside_text {
            continue;
        }
        out.push_str(&source[last..gap.start()]);
        out.push_str("><");
        last = gap.end();
    }
    out.push_str(&source[last..]);
    out
}

fn attribute_regex(name: &str) -> Regex {
    Regex::new(&format!(r#"(?:^|\s){name}\s*=\s*["']([^"']*)["']"#))
        .expect("attribute regex is valid")
}

fn attribute<'a>(attrs: &'a str, re: &Regex) -> Option<&'a str> {
    re.captures(attrs)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Root attributes and inner markup of one SVG document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SvgShape {
    pub view_box: Option<String>,
    pub inner: String,
}

pub fn parse_svg(source: &str) -> Option<SvgShape> {
    let minified = minify_svg(source);
    let open = ROOT_OPEN.captures(&minified)?;
    let whole = open.get(0)?;
    let attrs = open.name("attrs").map_or("", |m| m.as_str());

    let view_box = attribute(attrs, &VIEW_BOX).map(str::to_string).or_else(|| {
        let width = attribute(attrs, &WIDTH)?.trim_end_matches("px");
        let height = attribute(attrs, &HEIGHT)?.trim_end_matches("px");
        Some(format!("0 0 {width} {height}"))
    });

    let inner = if open.name("selfclose").is_some_and(|m| !m.as_str().is_empty()) {
        String::new()
    } else {
        let rest = &minified[whole.end()..];
        let close = rest.rfind("</svg>")?;
        rest[..close].to_string()
    };

    Some(SvgShape { view_box, inner })
}

/// Symbol id for a sprite member: its relative path without extension,
/// directory separators replaced by `--`.
pub fn symbol_id(path: &std::path::Path) -> String {
    slash_path(&path.with_extension("")).replace('/', "--")
}

/// Merge every SVG entry of the stream into one `<symbol>` sprite.
pub struct SvgSprite {
    sprite: PathBuf,
    /// Preview page path, when one is wanted.
    example: Option<PathBuf>,
}

impl SvgSprite {
    pub fn new(sprite: impl Into<PathBuf>) -> Self {
        Self {
            sprite: sprite.into(),
            example: None,
        }
    }

    pub fn with_example(mut self, example: impl Into<PathBuf>) -> Self {
        self.example = Some(example.into());
        self
    }

    fn render_sprite(symbols: &BTreeMap<String, SvgShape>) -> String {
        let mut out = String::from(
            r#"<?xml version="1.0" encoding="utf-8"?><svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink">"#,
        );
        for (id, shape) in symbols {
            out.push_str(&format!(r#"<symbol id="{id}""#));
            if let Some(view_box) = &shape.view_box {
                out.push_str(&format!(r#" viewBox="{view_box}""#));
            }
            out.push('>');
            out.push_str(&shape.inner);
            out.push_str("</symbol>");
        }
        out.push_str("</svg>\n");
        out
    }

    fn render_example(&self, symbols: &BTreeMap<String, SvgShape>) -> String {
        let mut items = String::new();
        for id in symbols.keys() {
            items.push_str(&format!(
                "      <li><svg class=\"icon\"><use xlink:href=\"#{id}\"></use></svg><code>{id}</code></li>\n"
            ));
        }
        let mut inline = Self::render_sprite(symbols);
        inline = PROLOG.replace(&inline, "").into_owned();
        inline = inline.replacen("<svg ", "<svg style=\"display:none\" ", 1);

        format!(
            "<!DOCTYPE html>\n<html lang=\"en\">\n  <head>\n    <meta charset=\"utf-8\">\n    <title>SVG symbol sprite preview</title>\n    <style>\n      ul {{ list-style: none; display: flex; flex-wrap: wrap; gap: 2em; }}\n      li {{ display: flex; flex-direction: column; align-items: center; }}\n      .icon {{ width: 48px; height: 48px; }}\n    </style>\n  </head>\n  <body>\n    {}\n    <h1>{} symbols</h1>\n    <ul>\n{}    </ul>\n  </body>\n</html>\n",
            inline.trim_end(),
            symbols.len(),
            items
        )
    }
}

impl Step for SvgSprite {
    fn name(&self) -> &str {
        "svg-sprite"
    }

    fn apply(&self, entries: Vec<FileEntry>) -> Result<Vec<FileEntry>, TransformError> {
        let mut symbols = BTreeMap::new();
        let mut sources: BTreeMap<String, PathBuf> = BTreeMap::new();
        let mut others = Vec::new();

        for entry in entries {
            if !entry.has_extension(&["svg"]) {
                others.push(entry);
                continue;
            }
            let shape = parse_svg(entry.text(self.name())?).ok_or_else(|| {
                TransformError::step(self.name(), &entry.path, "no root <svg> element")
            })?;
            let id = symbol_id(&entry.path);
            match sources.entry(id.clone()) {
                Entry::Occupied(taken) => {
                    return Err(TransformError::step(
                        self.name(),
                        &entry.path,
                        format!("symbol id {id:?} is already taken by {:?}", taken.get()),
                    ));
                }
                Entry::Vacant(slot) => {
                    slot.insert(entry.path.clone());
                }
            }
            symbols.insert(id, shape);
        }

        if symbols.is_empty() {
            return Ok(others);
        }

        others.push(FileEntry::new(self.sprite.clone(), Self::render_sprite(&symbols)));
        if let Some(example) = &self.example {
            others.push(FileEntry::new(example.clone(), self.render_example(&symbols)));
        }
        Ok(others)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ICON: &str = r#"<?xml version="1.0"?>
<!-- Generator: something -->
<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24">
  <metadata>junk</metadata>
  <path d="M0 0h24v24H0z"/>
</svg>
"#;

    #[test]
    fn minify_drops_prolog_comments_and_whitespace() {
        let out = minify_svg(ICON);
        assert_eq!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24"><path d="M0 0h24v24H0z"/></svg>"#
        );
    }

    #[test]
    fn sprite_contains_sorted_symbols() {
        let out = SvgSprite::new("sprite.svg")
            .apply(vec![
                FileEntry::new("phone.svg", ICON),
                FileEntry::new("arrow.svg", r#"<svg width="10" height="20"><circle r="1"/></svg>"#),
            ])
            .unwrap();

        assert_eq!(out.len(), 1);
        let sprite = String::from_utf8(out[0].contents.clone()).unwrap();
        let arrow = sprite.find(r#"<symbol id="arrow" viewBox="0 0 10 20">"#).unwrap();
        let phone = sprite.find(r#"<symbol id="phone" viewBox="0 0 24 24">"#).unwrap();
        assert!(arrow < phone);
        assert!(!sprite.contains("metadata"));
    }

    #[test]
    fn example_page_lists_every_symbol() {
        let out = SvgSprite::new("sprite.svg")
            .with_example("symbol/sprite.symbol.html")
            .apply(vec![FileEntry::new("icons/phone.svg", ICON)])
            .unwrap();

        assert_eq!(out[1].path, PathBuf::from("symbol/sprite.symbol.html"));
        let html = String::from_utf8(out[1].contents.clone()).unwrap();
        assert!(html.contains("#icons--phone"));
    }

    #[test]
    fn input_without_svg_root_is_an_error() {
        let err = SvgSprite::new("sprite.svg")
            .apply(vec![FileEntry::new("bad.svg", "<html></html>")])
            .unwrap_err();
        assert!(err.to_string().contains("bad.svg"));
    }

    #[test]
    fn colliding_symbol_ids_are_an_error() {
        let err = SvgSprite::new("sprite.svg")
            .apply(vec![
                FileEntry::new("a/b.svg", ICON),
                FileEntry::new("a--b.svg", ICON),
            ])
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("a--b"), "{message}");
        assert!(message.contains("a/b.svg"), "{message}");
    }

    #[test]
    fn stroke_width_is_not_mistaken_for_width() {
        let shape = parse_svg(r#"<svg stroke-width="2" width="16" height="8"><path/></svg>"#).unwrap();
        assert_eq!(shape.view_box.as_deref(), Some("0 0 16 8"));
    }

    #[test]
    fn whitespace_inside_text_elements_is_kept() {
        let src = "<svg>\n  <text x=\"0\"><tspan>Hello</tspan> <tspan>world</tspan></text>\n  <path/>\n</svg>";
        assert_eq!(
            minify_svg(src),
            r#"<svg><text x="0"><tspan>Hello</tspan> <tspan>world</tspan></text><path/></svg>"#
        );
    }

    #[test]
    fn empty_stream_produces_no_sprite() {
        assert!(SvgSprite::new("sprite.svg").apply(Vec::new()).unwrap().is_empty());
    }
}

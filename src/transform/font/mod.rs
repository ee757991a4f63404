// src/transform/font/mod.rs

//! Web font conversion.
//!
//! Sources are TrueType/OpenType files or WOFF 1.0 files. Outputs are WOFF
//! (zlib), WOFF2 (brotli) and plain TrueType.

pub mod sfnt;
pub mod woff;
pub mod woff2;

use std::fmt;
use std::str::FromStr;

use tracing::warn;

use crate::pipeline::{FileEntry, FileStep, TransformError};

pub use sfnt::{FontError, Sfnt};

/// Output formats of [`FontConvert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontFormat {
    Woff,
    Ttf,
}

impl FontFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            FontFormat::Woff => "woff",
            FontFormat::Ttf => "ttf",
        }
    }
}

impl fmt::Display for FontFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FontFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "woff" => Ok(FontFormat::Woff),
            "ttf" => Ok(FontFormat::Ttf),
            other => Err(format!("unsupported font format '{other}' (expected woff or ttf)")),
        }
    }
}

/// Decode any supported font container into its sfnt tables.
pub fn decode_font(bytes: &[u8]) -> Result<Sfnt, FontError> {
    match sfnt::read_u32(bytes, 0)? {
        woff::SIGNATURE => woff::decode(bytes),
        _ => Sfnt::parse(bytes),
    }
}

fn font_error(step: &str, entry: &FileEntry, err: FontError) -> TransformError {
    TransformError::step(step, &entry.path, err)
}

/// Convert a font into every configured format.
pub struct FontConvert {
    formats: Vec<FontFormat>,
}

impl FontConvert {
    pub fn new(formats: Vec<FontFormat>) -> Self {
        Self { formats }
    }
}

impl FileStep for FontConvert {
    fn name(&self) -> &str {
        "font-convert"
    }

    fn accepts(&self, entry: &FileEntry) -> bool {
        entry.has_extension(&["ttf", "otf", "woff"])
    }

    fn transform(&self, entry: FileEntry) -> Result<Vec<FileEntry>, TransformError> {
        let font = decode_font(&entry.contents).map_err(|e| font_error(self.name(), &entry, e))?;

        let mut out = Vec::with_capacity(self.formats.len());
        for format in &self.formats {
            match format {
                FontFormat::Woff => {
                    let bytes = woff::encode(&font).map_err(|e| font_error(self.name(), &entry, e))?;
                    out.push(entry.derive("woff", bytes));
                }
                FontFormat::Ttf if font.is_cff() => {
                    warn!(path = ?entry.path, "CFF outlines cannot be converted to TrueType, skipping ttf");
                }
                FontFormat::Ttf => out.push(entry.derive("ttf", font.to_bytes())),
            }
        }
        Ok(out)
    }
}

/// Add a WOFF2 copy of every TrueType font, keeping the original.
pub struct Ttf2Woff2;

impl FileStep for Ttf2Woff2 {
    fn name(&self) -> &str {
        "ttf2woff2"
    }

    fn accepts(&self, entry: &FileEntry) -> bool {
        entry.has_extension(&["ttf"])
    }

    fn transform(&self, entry: FileEntry) -> Result<Vec<FileEntry>, TransformError> {
        let font = Sfnt::parse(&entry.contents).map_err(|e| font_error(self.name(), &entry, e))?;
        let bytes = woff2::encode(&font).map_err(|e| font_error(self.name(), &entry, e))?;
        let converted = entry.derive("woff2", bytes);
        Ok(vec![entry, converted])
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use sfnt::{fixtures, OPENTYPE_CFF, TRUETYPE};

    fn paths(entries: &[FileEntry]) -> Vec<PathBuf> {
        entries.iter().map(|e| e.path.clone()).collect()
    }

    #[test]
    fn truetype_source_yields_woff_and_ttf() {
        let step = FontConvert::new(vec![FontFormat::Woff, FontFormat::Ttf]);
        let out = step
            .transform(FileEntry::new("Roboto.otf", fixtures::font(TRUETYPE)))
            .unwrap();
        assert_eq!(paths(&out), [PathBuf::from("Roboto.woff"), PathBuf::from("Roboto.ttf")]);
        assert_eq!(&out[0].contents[0..4], b"wOFF");
        assert_eq!(out[1].contents, fixtures::font(TRUETYPE));
    }

    #[test]
    fn cff_source_yields_only_woff() {
        let step = FontConvert::new(vec![FontFormat::Woff, FontFormat::Ttf]);
        let out = step
            .transform(FileEntry::new("Serif.otf", fixtures::font(OPENTYPE_CFF)))
            .unwrap();
        assert_eq!(paths(&out), [PathBuf::from("Serif.woff")]);
    }

    #[test]
    fn woff_source_is_decoded_first() {
        let font = Sfnt::parse(&fixtures::font(TRUETYPE)).unwrap();
        let woff = woff::encode(&font).unwrap();
        let out = FontConvert::new(vec![FontFormat::Ttf])
            .transform(FileEntry::new("Old.woff", woff))
            .unwrap();
        assert_eq!(out[0].contents, fixtures::font(TRUETYPE));
    }

    #[test]
    fn garbage_is_a_step_error() {
        let err = FontConvert::new(vec![FontFormat::Woff])
            .transform(FileEntry::new("bad.ttf", "nope nope nope"))
            .unwrap_err();
        assert!(matches!(err, TransformError::Step { ref step, .. } if step == "font-convert"));
    }

    #[test]
    fn ttf2woff2_keeps_the_ttf() {
        let out = Ttf2Woff2
            .transform(FileEntry::new("Roboto.ttf", fixtures::font(TRUETYPE)))
            .unwrap();
        assert_eq!(paths(&out), [PathBuf::from("Roboto.ttf"), PathBuf::from("Roboto.woff2")]);
        assert_eq!(&out[1].contents[0..4], b"wOF2");
    }

    #[test]
    fn formats_parse_case_insensitively() {
        assert_eq!("WOFF".parse::<FontFormat>(), Ok(FontFormat::Woff));
        assert!("eot".parse::<FontFormat>().is_err());
    }
}

// src/transform/font/sfnt.rs

//! Minimal sfnt (TrueType/OpenType) container handling.
//!
//! Only the table directory is interpreted. Table contents are carried as
//! opaque bytes together with their recorded checksums.

use thiserror::Error;

pub const TRUETYPE: u32 = 0x0001_0000;
pub const APPLE_TRUE: u32 = u32::from_be_bytes(*b"true");
pub const OPENTYPE_CFF: u32 = u32::from_be_bytes(*b"OTTO");

const HEADER_LEN: usize = 12;
const RECORD_LEN: usize = 16;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FontError {
    #[error("font data truncated at offset {0}")]
    Truncated(usize),

    #[error("unsupported font signature {0:#010x}")]
    UnknownSignature(u32),

    #[error("table {tag} extends past the end of the font")]
    TableOutOfBounds { tag: String },

    #[error("font has no tables")]
    Empty,

    #[error("corrupt compressed table {tag}: {message}")]
    Compression { tag: String, message: String },
}

pub(crate) fn read_u16(bytes: &[u8], at: usize) -> Result<u16, FontError> {
    bytes
        .get(at..at + 2)
        .map(|b| u16::from_be_bytes([b[0], b[1]]))
        .ok_or(FontError::Truncated(at))
}

pub(crate) fn read_u32(bytes: &[u8], at: usize) -> Result<u32, FontError> {
    bytes
        .get(at..at + 4)
        .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or(FontError::Truncated(at))
}

pub(crate) fn read_tag(bytes: &[u8], at: usize) -> Result<[u8; 4], FontError> {
    bytes
        .get(at..at + 4)
        .map(|b| [b[0], b[1], b[2], b[3]])
        .ok_or(FontError::Truncated(at))
}

pub(crate) fn align4(n: usize) -> usize {
    (n + 3) & !3
}

pub(crate) fn pad4(out: &mut Vec<u8>) {
    while out.len() % 4 != 0 {
        out.push(0);
    }
}

pub(crate) fn tag_name(tag: &[u8; 4]) -> String {
    String::from_utf8_lossy(tag).into_owned()
}

/// OpenType table checksum: the big-endian u32 sum of the zero-padded data.
pub fn checksum(data: &[u8]) -> u32 {
    data.chunks(4).fold(0u32, |sum, chunk| {
        let mut word = [0u8; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        sum.wrapping_add(u32::from_be_bytes(word))
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub tag: [u8; 4],
    pub checksum: u32,
    pub data: Vec<u8>,
}

/// A decoded font: its flavour plus tables sorted by tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sfnt {
    pub flavor: u32,
    pub tables: Vec<Table>,
}

impl Sfnt {
    pub fn new(flavor: u32, mut tables: Vec<Table>) -> Self {
        tables.sort_by(|a, b| a.tag.cmp(&b.tag));
        Self { flavor, tables }
    }

    pub fn parse(bytes: &[u8]) -> Result<Self, FontError> {
        let flavor = read_u32(bytes, 0)?;
        if !matches!(flavor, TRUETYPE | APPLE_TRUE | OPENTYPE_CFF) {
            return Err(FontError::UnknownSignature(flavor));
        }

        let num_tables = read_u16(bytes, 4)? as usize;
        if num_tables == 0 {
            return Err(FontError::Empty);
        }

        let mut tables = Vec::with_capacity(num_tables);
        for i in 0..num_tables {
            let record = HEADER_LEN + i * RECORD_LEN;
            let tag = read_tag(bytes, record)?;
            let checksum = read_u32(bytes, record + 4)?;
            let offset = read_u32(bytes, record + 8)? as usize;
            let length = read_u32(bytes, record + 12)? as usize;

            let data = offset
                .checked_add(length)
                .and_then(|end| bytes.get(offset..end))
                .ok_or_else(|| FontError::TableOutOfBounds { tag: tag_name(&tag) })?;

            tables.push(Table {
                tag,
                checksum,
                data: data.to_vec(),
            });
        }

        Ok(Self::new(flavor, tables))
    }

    /// Fonts with CFF outlines cannot be re-labelled as TrueType.
    pub fn is_cff(&self) -> bool {
        self.flavor == OPENTYPE_CFF
    }

    /// Size of the serialized font, table padding included.
    pub fn sfnt_size(&self) -> usize {
        HEADER_LEN
            + RECORD_LEN * self.tables.len()
            + self.tables.iter().map(|t| align4(t.data.len())).sum::<usize>()
    }

    /// Serialize as a plain sfnt file. Recorded checksums are kept as is.
    pub fn to_bytes(&self) -> Vec<u8> {
        let num_tables = self.tables.len() as u16;
        let entry_selector = 15 - num_tables.max(1).leading_zeros() as u16;
        let search_range = (1u16 << entry_selector) * 16;
        let range_shift = num_tables * 16 - search_range;

        let mut out = Vec::with_capacity(self.sfnt_size());
        out.extend_from_slice(&self.flavor.to_be_bytes());
        out.extend_from_slice(&num_tables.to_be_bytes());
        out.extend_from_slice(&search_range.to_be_bytes());
        out.extend_from_slice(&entry_selector.to_be_bytes());
        out.extend_from_slice(&range_shift.to_be_bytes());

        let mut offset = HEADER_LEN + RECORD_LEN * self.tables.len();
        for table in &self.tables {
            out.extend_from_slice(&table.tag);
            out.extend_from_slice(&table.checksum.to_be_bytes());
            out.extend_from_slice(&(offset as u32).to_be_bytes());
            out.extend_from_slice(&(table.data.len() as u32).to_be_bytes());
            offset += align4(table.data.len());
        }

        for table in &self.tables {
            out.extend_from_slice(&table.data);
            pad4(&mut out);
        }
        out
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// A structurally valid sfnt with a handful of opaque tables.
    pub fn font(flavor: u32) -> Vec<u8> {
        let tables = [
            (*b"head", vec![0u8; 54]),
            (*b"glyf", b"glyph outlines go here, repeated repeated repeated".to_vec()),
            (*b"loca", vec![0, 0, 0, 12, 0, 24]),
            (*b"maxp", vec![0, 0, 0x50, 0, 0, 3]),
            (*b"cmap", vec![7u8; 33]),
        ]
        .into_iter()
        .map(|(tag, data)| Table {
            tag,
            checksum: checksum(&data),
            data,
        })
        .collect();
        Sfnt::new(flavor, tables).to_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_serialize_round_trip() {
        let bytes = fixtures::font(TRUETYPE);
        let font = Sfnt::parse(&bytes).unwrap();
        assert_eq!(font.tables.len(), 5);
        assert_eq!(font.to_bytes(), bytes);
        assert_eq!(font.sfnt_size(), bytes.len());
    }

    #[test]
    fn tables_are_sorted_by_tag() {
        let font = Sfnt::parse(&fixtures::font(TRUETYPE)).unwrap();
        let tags: Vec<_> = font.tables.iter().map(|t| tag_name(&t.tag)).collect();
        assert_eq!(tags, ["cmap", "glyf", "head", "loca", "maxp"]);
    }

    #[test]
    fn directory_search_fields_follow_the_table_count() {
        let bytes = fixtures::font(TRUETYPE);
        // 5 tables: searchRange 64, entrySelector 2, rangeShift 16
        assert_eq!(read_u16(&bytes, 6).unwrap(), 64);
        assert_eq!(read_u16(&bytes, 8).unwrap(), 2);
        assert_eq!(read_u16(&bytes, 10).unwrap(), 16);
    }

    #[test]
    fn checksum_pads_the_last_word() {
        assert_eq!(checksum(&[0, 0, 0, 1, 0x80]), 1 + 0x8000_0000);
    }

    #[test]
    fn truncated_and_foreign_data_are_rejected() {
        assert_eq!(Sfnt::parse(b"\0\x01"), Err(FontError::Truncated(0)));
        assert!(matches!(
            Sfnt::parse(b"PK\x03\x04\0\0\0\0\0\0\0\0"),
            Err(FontError::UnknownSignature(_))
        ));
        let mut bytes = fixtures::font(TRUETYPE);
        bytes.truncate(40);
        assert!(Sfnt::parse(&bytes).is_err());
    }

    #[test]
    fn cff_flavour_is_detected() {
        let font = Sfnt::parse(&fixtures::font(OPENTYPE_CFF)).unwrap();
        assert!(font.is_cff());
    }
}

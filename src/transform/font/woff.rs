// src/transform/font/woff.rs

//! WOFF 1.0: sfnt tables individually zlib-compressed.

use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use super::sfnt::{align4, pad4, read_tag, read_u16, read_u32, tag_name, FontError, Sfnt, Table};

pub const SIGNATURE: u32 = u32::from_be_bytes(*b"wOFF");

const HEADER_LEN: usize = 44;
const ENTRY_LEN: usize = 20;

fn compress(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(data)?;
    encoder.finish()
}

/// Encode `font` as WOFF. Tables that do not shrink are stored raw.
pub fn encode(font: &Sfnt) -> Result<Vec<u8>, FontError> {
    let mut stored = Vec::with_capacity(font.tables.len());
    for table in &font.tables {
        let compressed = compress(&table.data).map_err(|e| FontError::Compression {
            tag: tag_name(&table.tag),
            message: e.to_string(),
        })?;
        if compressed.len() < table.data.len() {
            stored.push(compressed);
        } else {
            stored.push(table.data.clone());
        }
    }

    let directory_end = HEADER_LEN + ENTRY_LEN * font.tables.len();
    let total_len = directory_end + stored.iter().map(|s| align4(s.len())).sum::<usize>();

    let mut out = Vec::with_capacity(total_len);
    out.extend_from_slice(&SIGNATURE.to_be_bytes());
    out.extend_from_slice(&font.flavor.to_be_bytes());
    out.extend_from_slice(&(total_len as u32).to_be_bytes());
    out.extend_from_slice(&(font.tables.len() as u16).to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes());
    out.extend_from_slice(&(font.sfnt_size() as u32).to_be_bytes());
    // version 1.0, no metadata, no private block
    out.extend_from_slice(&1u16.to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes());
    out.extend_from_slice(&[0u8; 20]);

    let mut offset = directory_end;
    for (table, data) in font.tables.iter().zip(&stored) {
        out.extend_from_slice(&table.tag);
        out.extend_from_slice(&(offset as u32).to_be_bytes());
        out.extend_from_slice(&(data.len() as u32).to_be_bytes());
        out.extend_from_slice(&(table.data.len() as u32).to_be_bytes());
        out.extend_from_slice(&table.checksum.to_be_bytes());
        offset += align4(data.len());
    }

    for data in &stored {
        out.extend_from_slice(data);
        pad4(&mut out);
    }

    Ok(out)
}

pub fn decode(bytes: &[u8]) -> Result<Sfnt, FontError> {
    let signature = read_u32(bytes, 0)?;
    if signature != SIGNATURE {
        return Err(FontError::UnknownSignature(signature));
    }
    let flavor = read_u32(bytes, 4)?;
    let num_tables = read_u16(bytes, 12)? as usize;
    if num_tables == 0 {
        return Err(FontError::Empty);
    }

    let mut tables = Vec::with_capacity(num_tables);
    for i in 0..num_tables {
        let entry = HEADER_LEN + i * ENTRY_LEN;
        let tag = read_tag(bytes, entry)?;
        let offset = read_u32(bytes, entry + 4)? as usize;
        let comp_len = read_u32(bytes, entry + 8)? as usize;
        let orig_len = read_u32(bytes, entry + 12)? as usize;
        let checksum = read_u32(bytes, entry + 16)?;

        let raw = offset
            .checked_add(comp_len)
            .and_then(|end| bytes.get(offset..end))
            .ok_or_else(|| FontError::TableOutOfBounds { tag: tag_name(&tag) })?;

        let data = if comp_len == orig_len {
            raw.to_vec()
        } else {
            let mut data = Vec::with_capacity(orig_len);
            ZlibDecoder::new(raw)
                .read_to_end(&mut data)
                .map_err(|e| FontError::Compression {
                    tag: tag_name(&tag),
                    message: e.to_string(),
                })?;
            if data.len() != orig_len {
                return Err(FontError::Compression {
                    tag: tag_name(&tag),
                    message: format!("expected {orig_len} bytes, got {}", data.len()),
                });
            }
            data
        };

        tables.push(Table {
            tag,
            checksum,
            data,
        });
    }

    Ok(Sfnt::new(flavor, tables))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::font::sfnt::{fixtures, TRUETYPE};

    #[test]
    fn header_describes_the_font() {
        let font = Sfnt::parse(&fixtures::font(TRUETYPE)).unwrap();
        let woff = encode(&font).unwrap();

        assert_eq!(&woff[0..4], b"wOFF");
        assert_eq!(read_u32(&woff, 4).unwrap(), TRUETYPE);
        assert_eq!(read_u32(&woff, 8).unwrap() as usize, woff.len());
        assert_eq!(read_u16(&woff, 12).unwrap(), 5);
        assert_eq!(read_u32(&woff, 16).unwrap() as usize, font.sfnt_size());
        assert_eq!(woff.len() % 4, 0);
    }

    #[test]
    fn decoding_restores_tables_and_checksums() {
        let font = Sfnt::parse(&fixtures::font(TRUETYPE)).unwrap();
        let decoded = decode(&encode(&font).unwrap()).unwrap();
        assert_eq!(decoded, font);
    }

    #[test]
    fn compressible_tables_are_compressed() {
        let font = Sfnt::parse(&fixtures::font(TRUETYPE)).unwrap();
        let woff = encode(&font).unwrap();
        // "head" is 54 zero bytes, third entry in tag order
        let entry = HEADER_LEN + 2 * ENTRY_LEN;
        assert_eq!(&woff[entry..entry + 4], b"head");
        assert!(read_u32(&woff, entry + 8).unwrap() < read_u32(&woff, entry + 12).unwrap());
    }
}

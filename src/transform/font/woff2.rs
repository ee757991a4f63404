// src/transform/font/woff2.rs

//! WOFF 2.0 encoding with null table transforms.
//!
//! Every table is stored untransformed. `glyf` and `loca` signal that with
//! transform version 3, all other tables with version 0. The table data is
//! concatenated and compressed as a single brotli stream.

use std::io::Write;

use super::sfnt::{pad4, tag_name, FontError, Sfnt};

pub const SIGNATURE: u32 = u32::from_be_bytes(*b"wOF2");

const HEADER_LEN: usize = 48;
const BROTLI_QUALITY: u32 = 11;
const BROTLI_WINDOW: u32 = 22;
const BROTLI_BUFFER: usize = 4096;

/// Tags with a one-byte encoding in the table directory, by index.
const KNOWN_TAGS: [&[u8; 4]; 63] = [
    b"cmap", b"head", b"hhea", b"hmtx", b"maxp", b"name", b"OS/2", b"post", b"cvt ", b"fpgm",
    b"glyf", b"loca", b"prep", b"CFF ", b"VORG", b"EBDT", b"EBLC", b"gasp", b"hdmx", b"kern",
    b"LTSH", b"PCLT", b"VDMX", b"vhea", b"vmtx", b"BASE", b"GDEF", b"GPOS", b"GSUB", b"EBSC",
    b"JSTF", b"MATH", b"CBDT", b"CBLC", b"COLR", b"CPAL", b"SVG ", b"sbix", b"acnt", b"avar",
    b"bdat", b"bloc", b"bsln", b"cvar", b"fdsc", b"feat", b"fmtx", b"fvar", b"gvar", b"hsty",
    b"just", b"lcar", b"mort", b"morx", b"opbd", b"prop", b"trak", b"Zapf", b"Silf", b"Glat",
    b"Gloc", b"Feat", b"Sill",
];

const ARBITRARY_TAG: u8 = 63;
const NULL_TRANSFORM_GLYF: u8 = 3 << 6;

/// UIntBase128: big-endian groups of 7 bits, high bit set on all but the
/// last byte.
pub fn write_base128(out: &mut Vec<u8>, value: u32) {
    let mut groups = [0u8; 5];
    let mut len = 0;
    let mut rest = value;
    loop {
        groups[len] = (rest & 0x7f) as u8;
        len += 1;
        rest >>= 7;
        if rest == 0 {
            break;
        }
    }
    for i in (0..len).rev() {
        let continuation = if i > 0 { 0x80 } else { 0 };
        out.push(groups[i] | continuation);
    }
}

fn flags_for(tag: &[u8; 4]) -> u8 {
    let index = KNOWN_TAGS
        .iter()
        .position(|known| *known == tag)
        .map_or(ARBITRARY_TAG, |i| i as u8);
    if tag == b"glyf" || tag == b"loca" {
        index | NULL_TRANSFORM_GLYF
    } else {
        index
    }
}

fn compress(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut writer =
        brotli::CompressorWriter::new(Vec::new(), BROTLI_BUFFER, BROTLI_QUALITY, BROTLI_WINDOW);
    writer.write_all(data)?;
    Ok(writer.into_inner())
}

pub fn encode(font: &Sfnt) -> Result<Vec<u8>, FontError> {
    let mut directory = Vec::new();
    let mut stream = Vec::new();
    for table in &font.tables {
        let flags = flags_for(&table.tag);
        directory.push(flags);
        if flags & 0x3f == ARBITRARY_TAG {
            directory.extend_from_slice(&table.tag);
        }
        write_base128(&mut directory, table.data.len() as u32);
        stream.extend_from_slice(&table.data);
    }

    let compressed = compress(&stream).map_err(|e| FontError::Compression {
        tag: font
            .tables
            .first()
            .map(|t| tag_name(&t.tag))
            .unwrap_or_default(),
        message: e.to_string(),
    })?;

    let unpadded = HEADER_LEN + directory.len() + compressed.len();
    let total_len = (unpadded + 3) & !3;

    let mut out = Vec::with_capacity(total_len);
    out.extend_from_slice(&SIGNATURE.to_be_bytes());
    out.extend_from_slice(&font.flavor.to_be_bytes());
    out.extend_from_slice(&(total_len as u32).to_be_bytes());
    out.extend_from_slice(&(font.tables.len() as u16).to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes());
    out.extend_from_slice(&(font.sfnt_size() as u32).to_be_bytes());
    out.extend_from_slice(&(compressed.len() as u32).to_be_bytes());
    // version 1.0, no metadata, no private block
    out.extend_from_slice(&1u16.to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes());
    out.extend_from_slice(&[0u8; 20]);
    out.extend_from_slice(&directory);
    out.extend_from_slice(&compressed);
    pad4(&mut out);

    Ok(out)
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::*;
    use crate::transform::font::sfnt::{fixtures, read_u32, TRUETYPE};

    #[test]
    fn base128_matches_reference_encodings() {
        let encode = |v| {
            let mut out = Vec::new();
            write_base128(&mut out, v);
            out
        };
        assert_eq!(encode(0), vec![0x00]);
        assert_eq!(encode(63), vec![0x3f]);
        assert_eq!(encode(128), vec![0x81, 0x00]);
        assert_eq!(encode(16_384), vec![0x81, 0x80, 0x00]);
    }

    #[test]
    fn glyf_and_loca_use_the_null_transform() {
        assert_eq!(flags_for(b"glyf"), 10 | 0xc0);
        assert_eq!(flags_for(b"loca"), 11 | 0xc0);
        assert_eq!(flags_for(b"head"), 1);
        assert_eq!(flags_for(b"zzzz"), ARBITRARY_TAG);
    }

    #[test]
    fn compressed_stream_holds_the_tables_in_order() {
        let font = Sfnt::parse(&fixtures::font(TRUETYPE)).unwrap();
        let woff2 = encode(&font).unwrap();

        assert_eq!(&woff2[0..4], b"wOF2");
        assert_eq!(read_u32(&woff2, 8).unwrap() as usize, woff2.len());
        assert_eq!(woff2.len() % 4, 0);

        let compressed_len = read_u32(&woff2, 20).unwrap() as usize;
        // five known tags, each with a one-byte length
        let directory_len = 5 * 2;
        let start = HEADER_LEN + directory_len;
        let mut stream = Vec::new();
        brotli::Decompressor::new(&woff2[start..start + compressed_len], 4096)
            .read_to_end(&mut stream)
            .unwrap();

        let expected: Vec<u8> = font.tables.iter().flat_map(|t| t.data.clone()).collect();
        assert_eq!(stream, expected);
    }

    #[test]
    fn encoding_is_deterministic() {
        let font = Sfnt::parse(&fixtures::font(TRUETYPE)).unwrap();
        assert_eq!(encode(&font).unwrap(), encode(&font).unwrap());
    }
}

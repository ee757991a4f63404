// src/transform/raster.rs

//! Raster image encoders built on the `image` crate.

use std::io::Cursor;

use image::codecs::avif::AvifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ImageEncoder};
use tracing::debug;

use crate::pipeline::{FileEntry, FileStep, TransformError};
use crate::transform::svg::minify_svg;

/// Extensions the raster encoders can decode.
pub const RASTER_INPUTS: &[&str] = &["jpg", "jpeg", "png", "gif", "tif", "tiff", "webp"];

const AVIF_SPEED: u8 = 6;

fn decode(step: &str, entry: &FileEntry) -> Result<DynamicImage, TransformError> {
    image::load_from_memory(&entry.contents)
        .map_err(|e| TransformError::step(step, &entry.path, format!("decode failed: {e}")))
}

/// Drop to 8-bit RGB or RGBA, the layouts every encoder here accepts.
fn to_8bit(img: DynamicImage) -> DynamicImage {
    if img.color().has_alpha() {
        DynamicImage::ImageRgba8(img.into_rgba8())
    } else {
        DynamicImage::ImageRgb8(img.into_rgb8())
    }
}

/// Encode raster input as AVIF next to the source name.
pub struct AvifEncode {
    quality: u8,
}

impl AvifEncode {
    pub fn new(quality: u8) -> Self {
        Self { quality }
    }
}

impl FileStep for AvifEncode {
    fn name(&self) -> &str {
        "avif"
    }

    fn accepts(&self, entry: &FileEntry) -> bool {
        entry.has_extension(RASTER_INPUTS)
    }

    fn transform(&self, entry: FileEntry) -> Result<Vec<FileEntry>, TransformError> {
        let img = to_8bit(decode(self.name(), &entry)?);
        let mut out = Vec::new();
        let encoder = AvifEncoder::new_with_speed_quality(&mut out, AVIF_SPEED, self.quality);
        img.write_with_encoder(encoder)
            .map_err(|e| TransformError::step(self.name(), &entry.path, format!("AVIF encode failed: {e}")))?;

        debug!(path = ?entry.path, bytes = out.len(), "encoded avif");
        Ok(vec![entry.derive("avif", out)])
    }
}

/// Encode raster input as lossless WebP.
pub struct WebpEncode;

impl FileStep for WebpEncode {
    fn name(&self) -> &str {
        "webp"
    }

    fn accepts(&self, entry: &FileEntry) -> bool {
        entry.has_extension(RASTER_INPUTS)
    }

    fn transform(&self, entry: FileEntry) -> Result<Vec<FileEntry>, TransformError> {
        let img = to_8bit(decode(self.name(), &entry)?);
        let mut out = Vec::new();
        img.write_with_encoder(WebPEncoder::new_lossless(&mut out))
            .map_err(|e| TransformError::step(self.name(), &entry.path, format!("WebP encode failed: {e}")))?;

        debug!(path = ?entry.path, bytes = out.len(), "encoded webp");
        Ok(vec![entry.derive("webp", out)])
    }
}

/// Recompress JPEG and PNG, minify SVG, pass GIF through.
///
/// The original bytes are kept whenever the result is not smaller.
pub struct Optimize {
    jpeg_quality: u8,
}

impl Optimize {
    pub fn new(jpeg_quality: u8) -> Self {
        Self { jpeg_quality }
    }

    fn encode_jpeg(&self, entry: &FileEntry) -> Result<Vec<u8>, TransformError> {
        let img = decode(self.name(), entry)?.into_rgb8();
        let mut out = Cursor::new(Vec::new());
        JpegEncoder::new_with_quality(&mut out, self.jpeg_quality)
            .write_image(img.as_raw(), img.width(), img.height(), image::ExtendedColorType::Rgb8)
            .map_err(|e| TransformError::step(self.name(), &entry.path, format!("JPEG encode failed: {e}")))?;
        Ok(out.into_inner())
    }

    fn encode_png(&self, entry: &FileEntry) -> Result<Vec<u8>, TransformError> {
        let img = to_8bit(decode(self.name(), entry)?);
        let mut out = Vec::new();
        let encoder =
            PngEncoder::new_with_quality(&mut out, CompressionType::Best, FilterType::Adaptive);
        img.write_with_encoder(encoder)
            .map_err(|e| TransformError::step(self.name(), &entry.path, format!("PNG encode failed: {e}")))?;
        Ok(out)
    }
}

impl FileStep for Optimize {
    fn name(&self) -> &str {
        "optimize"
    }

    fn accepts(&self, entry: &FileEntry) -> bool {
        entry.has_extension(&["jpg", "jpeg", "png", "svg", "gif"])
    }

    fn transform(&self, entry: FileEntry) -> Result<Vec<FileEntry>, TransformError> {
        let optimized = match entry.extension().as_deref() {
            Some("jpg" | "jpeg") => self.encode_jpeg(&entry)?,
            Some("png") => self.encode_png(&entry)?,
            Some("svg") => minify_svg(entry.text(self.name())?).into_bytes(),
            _ => return Ok(vec![entry]),
        };

        if optimized.len() >= entry.contents.len() {
            debug!(path = ?entry.path, "optimized output not smaller, keeping original");
            return Ok(vec![entry]);
        }

        debug!(
            path = ?entry.path,
            before = entry.contents.len(),
            after = optimized.len(),
            "optimized image"
        );
        Ok(vec![FileEntry::new(entry.path, optimized)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn png_fixture() -> Vec<u8> {
        let img = RgbImage::from_fn(16, 16, |x, y| Rgb([(x * 16) as u8, (y * 16) as u8, 128]));
        let mut out = Vec::new();
        PngEncoder::new_with_quality(&mut out, CompressionType::Fast, FilterType::NoFilter)
            .write_image(img.as_raw(), 16, 16, image::ExtendedColorType::Rgb8)
            .unwrap();
        out
    }

    #[test]
    fn webp_output_decodes_to_the_same_pixels() {
        let src = FileEntry::new("photo.png", png_fixture());
        let out = WebpEncode.transform(src.clone()).unwrap();

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].path, std::path::PathBuf::from("photo.webp"));
        let back = image::load_from_memory(&out[0].contents).unwrap().into_rgb8();
        let orig = image::load_from_memory(&src.contents).unwrap().into_rgb8();
        assert_eq!(back.as_raw(), orig.as_raw());
    }

    #[test]
    fn avif_output_is_named_after_the_source() {
        let out = AvifEncode::new(50)
            .transform(FileEntry::new("trip/photo.png", png_fixture()))
            .unwrap();
        assert_eq!(out[0].path, std::path::PathBuf::from("trip/photo.avif"));
        assert!(!out[0].contents.is_empty());
    }

    #[test]
    fn undecodable_input_is_a_step_error() {
        let err = WebpEncode
            .transform(FileEntry::new("broken.jpg", "not an image"))
            .unwrap_err();
        assert!(matches!(err, TransformError::Step { ref step, .. } if step == "webp"));
    }

    #[test]
    fn optimize_never_grows_a_file() {
        let src = FileEntry::new("photo.png", png_fixture());
        let out = Optimize::new(80).transform(src.clone()).unwrap();
        assert!(out[0].contents.len() <= src.contents.len());
        assert_eq!(out[0].path, src.path);
    }

    #[test]
    fn gif_passes_through() {
        let src = FileEntry::new("anim.gif", b"GIF89a....".to_vec());
        let out = Optimize::new(80).transform(src.clone()).unwrap();
        assert_eq!(out, vec![src]);
    }
}

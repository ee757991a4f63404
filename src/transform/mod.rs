// src/transform/mod.rs

//! The steps asset pipelines are assembled from.

pub mod concat;
pub mod font;
pub mod include;
pub mod minify;
pub mod prefix;
pub mod raster;
pub mod scss;
pub mod svg;

pub use concat::Concat;
pub use font::{FontConvert, FontFormat, Ttf2Woff2};
pub use include::Include;
pub use minify::JsMinify;
pub use prefix::Autoprefix;
pub use raster::{AvifEncode, Optimize, WebpEncode};
pub use scss::Scss;
pub use svg::SvgSprite;

// src/config/model.rs

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::transform::FontFormat;

/// Configuration as read from `Assetdag.toml`, before validation.
///
/// ```toml
/// [paths]
/// app = "app"
/// dist = "dist"
///
/// [server]
/// port = 3000
///
/// [styles]
/// vendor = ["node_modules/swiper/swiper-bundle.css"]
///
/// [images]
/// avif_quality = 50
/// ```
///
/// Every section is optional. An empty file is the stock project layout.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub paths: PathsSection,
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub styles: StylesSection,
    #[serde(default)]
    pub scripts: ScriptsSection,
    #[serde(default)]
    pub images: ImagesSection,
    #[serde(default)]
    pub fonts: FontsSection,
    #[serde(default)]
    pub sprite: SpriteSection,
    #[serde(default)]
    pub build: BuildSection,
}

/// Validated configuration.
///
/// Obtain one through `ConfigFile::try_from(raw)` or the loader.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub paths: PathsSection,
    pub server: ServerSection,
    pub styles: StylesSection,
    pub scripts: ScriptsSection,
    pub images: ImagesSection,
    pub fonts: FontsSection,
    pub sprite: SpriteSection,
    /// Ordered distribution globs, defaults already expanded.
    pub build_globs: Vec<String>,
}

impl ConfigFile {
    /// Construct without validation. Callers must have validated `raw`.
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        let build_globs = raw
            .build
            .globs
            .unwrap_or_else(|| default_build_globs(&raw.paths.app));
        Self {
            paths: raw.paths,
            server: raw.server,
            styles: raw.styles,
            scripts: raw.scripts,
            images: raw.images,
            fonts: raw.fonts,
            sprite: raw.sprite,
            build_globs,
        }
    }

    /// The stock configuration.
    pub fn defaults() -> Self {
        Self::new_unchecked(RawConfigFile::default())
    }

    pub fn app_dir(&self) -> &Path {
        &self.paths.app
    }

    pub fn dist_dir(&self) -> &Path {
        &self.paths.dist
    }

    /// Font output formats, in configured order.
    pub fn font_formats(&self) -> Vec<FontFormat> {
        self.fonts
            .formats
            .iter()
            .filter_map(|f| f.parse().ok())
            .collect()
    }

    pub fn server_addr(&self) -> SocketAddr {
        let ip = parse_host(&self.server.host).unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));
        SocketAddr::new(ip, self.server.port)
    }
}

pub(crate) fn parse_host(host: &str) -> Option<IpAddr> {
    match host.trim() {
        "localhost" => Some(IpAddr::V4(Ipv4Addr::LOCALHOST)),
        other => other.parse().ok(),
    }
}

/// `[paths]`: working and distribution directories, relative to the
/// project root.
#[derive(Debug, Clone, Deserialize)]
pub struct PathsSection {
    #[serde(default = "default_app")]
    pub app: PathBuf,
    #[serde(default = "default_dist")]
    pub dist: PathBuf,
}

fn default_app() -> PathBuf {
    PathBuf::from("app")
}

fn default_dist() -> PathBuf {
    PathBuf::from("dist")
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            app: default_app(),
            dist: default_dist(),
        }
    }
}

/// `[server]`: dev server address.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// `[styles]`: vendor stylesheets, SCSS entry point and bundle name.
///
/// `vendor` paths are relative to the project root, `entry` to the app
/// directory. Vendor files come first in the bundle.
#[derive(Debug, Clone, Deserialize)]
pub struct StylesSection {
    #[serde(default = "default_styles_vendor")]
    pub vendor: Vec<String>,
    #[serde(default = "default_styles_entry")]
    pub entry: String,
    #[serde(default = "default_styles_output")]
    pub output: String,
}

fn default_styles_vendor() -> Vec<String> {
    vec!["node_modules/swiper/swiper-bundle.css".to_string()]
}

fn default_styles_entry() -> String {
    "scss/style.scss".to_string()
}

fn default_styles_output() -> String {
    "style.min.css".to_string()
}

impl Default for StylesSection {
    fn default() -> Self {
        Self {
            vendor: default_styles_vendor(),
            entry: default_styles_entry(),
            output: default_styles_output(),
        }
    }
}

/// `[scripts]`: same shape as `[styles]`, for the JavaScript bundle.
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptsSection {
    #[serde(default = "default_scripts_vendor")]
    pub vendor: Vec<String>,
    #[serde(default = "default_scripts_entry")]
    pub entry: String,
    #[serde(default = "default_scripts_output")]
    pub output: String,
}

fn default_scripts_vendor() -> Vec<String> {
    vec!["node_modules/swiper/swiper-bundle.js".to_string()]
}

fn default_scripts_entry() -> String {
    "js/main.js".to_string()
}

fn default_scripts_output() -> String {
    "main.min.js".to_string()
}

impl Default for ScriptsSection {
    fn default() -> Self {
        Self {
            vendor: default_scripts_vendor(),
            entry: default_scripts_entry(),
            output: default_scripts_output(),
        }
    }
}

/// `[images]`: encoder qualities, 1 to 100.
#[derive(Debug, Clone, Deserialize)]
pub struct ImagesSection {
    #[serde(default = "default_avif_quality")]
    pub avif_quality: u32,
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u32,
}

fn default_avif_quality() -> u32 {
    50
}

fn default_jpeg_quality() -> u32 {
    80
}

impl Default for ImagesSection {
    fn default() -> Self {
        Self {
            avif_quality: default_avif_quality(),
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

/// `[fonts]`: formats produced from each source font.
#[derive(Debug, Clone, Deserialize)]
pub struct FontsSection {
    #[serde(default = "default_font_formats")]
    pub formats: Vec<String>,
}

fn default_font_formats() -> Vec<String> {
    vec!["woff".to_string(), "ttf".to_string()]
}

impl Default for FontsSection {
    fn default() -> Self {
        Self {
            formats: default_font_formats(),
        }
    }
}

/// `[sprite]`
#[derive(Debug, Clone, Deserialize)]
pub struct SpriteSection {
    /// Also write `symbol/sprite.symbol.html`, a preview of every symbol.
    #[serde(default = "default_true")]
    pub example: bool,
}

fn default_true() -> bool {
    true
}

impl Default for SpriteSection {
    fn default() -> Self {
        Self { example: true }
    }
}

/// `[build]`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuildSection {
    /// Ordered glob list; the last glob matching a file decides whether it
    /// ships. `None` means the stock list for the configured app directory.
    #[serde(default)]
    pub globs: Option<Vec<String>>,
}

/// Stock distribution globs for an app directory.
pub fn default_build_globs(app: &Path) -> Vec<String> {
    let app = app.to_string_lossy().replace('\\', "/");
    let app = app.trim_end_matches('/');
    [
        "{app}/css/style.min.css",
        "{app}/**/*.html",
        "!{app}/images/stack/*.html",
        "{app}/images/**/*.*",
        "!{app}/images/src/**/*.*",
        "!{app}/images/symbol/*.*",
        "!{app}/images/*.svg",
        "{app}/images/sprite.svg",
        "{app}/fonts/*.*",
        "{app}/js/main.min.js",
        "!{app}/components/*",
    ]
    .iter()
    .map(|g| g.replace("{app}", app))
    .collect()
}

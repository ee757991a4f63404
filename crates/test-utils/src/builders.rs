#![allow(dead_code)]

use assetdag::config::model::{
    BuildSection, FontsSection, ImagesSection, PathsSection, ServerSection, SpriteSection,
    StylesSection, ScriptsSection,
};
use assetdag::config::{ConfigFile, RawConfigFile};
use assetdag::errors::Result;

/// Builder for `ConfigFile` to simplify test setup.
///
/// Starts from the stock layout (`app/` and `dist/`); every setter overrides
/// one field.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                paths: PathsSection::default(),
                server: ServerSection::default(),
                styles: StylesSection::default(),
                scripts: ScriptsSection::default(),
                images: ImagesSection::default(),
                fonts: FontsSection::default(),
                sprite: SpriteSection::default(),
                build: BuildSection::default(),
            },
        }
    }

    pub fn app(mut self, dir: &str) -> Self {
        self.config.paths.app = dir.into();
        self
    }

    pub fn dist(mut self, dir: &str) -> Self {
        self.config.paths.dist = dir.into();
        self
    }

    pub fn server(mut self, host: &str, port: u16) -> Self {
        self.config.server.host = host.to_string();
        self.config.server.port = port;
        self
    }

    pub fn styles_vendor(mut self, files: &[&str]) -> Self {
        self.config.styles.vendor = files.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn scripts_vendor(mut self, files: &[&str]) -> Self {
        self.config.scripts.vendor = files.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn avif_quality(mut self, quality: u32) -> Self {
        self.config.images.avif_quality = quality;
        self
    }

    pub fn jpeg_quality(mut self, quality: u32) -> Self {
        self.config.images.jpeg_quality = quality;
        self
    }

    pub fn font_formats(mut self, formats: &[&str]) -> Self {
        self.config.fonts.formats = formats.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn sprite_example(mut self, example: bool) -> Self {
        self.config.sprite.example = example;
        self
    }

    pub fn build_globs(mut self, globs: &[&str]) -> Self {
        self.config.build.globs = Some(globs.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn raw(&self) -> &RawConfigFile {
        &self.config
    }

    pub fn try_build(self) -> Result<ConfigFile> {
        ConfigFile::try_from(self.config)
    }

    pub fn build(self) -> ConfigFile {
        self.try_build()
            .expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

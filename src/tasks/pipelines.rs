// src/tasks/pipelines.rs

//! The six asset pipelines, assembled from configuration.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::ConfigFile;
use crate::fs::FileSystem;
use crate::pipeline::select::slash_path;
use crate::pipeline::{AssetPipeline, NewerGuard, PerFile, SourceSelector, Stage, TransformError};
use crate::transform::{
    Autoprefix, AvifEncode, Concat, FontConvert, Include, JsMinify, Optimize, Scss, SvgSprite,
    Ttf2Woff2, WebpEncode,
};
use crate::types::TaskId;

/// Where the sprite lands, relative to the images directory.
pub const SPRITE_FILE: &str = "sprite.svg";
/// Symbol preview page, relative to the images directory.
pub const SPRITE_EXAMPLE: &str = "symbol/sprite.symbol.html";

/// Pipeline builder bound to one project.
#[derive(Debug, Clone)]
pub struct PipelineSet {
    cfg: ConfigFile,
    fs: Arc<dyn FileSystem>,
    root: PathBuf,
}

impl PipelineSet {
    pub fn new(cfg: ConfigFile, fs: Arc<dyn FileSystem>, root: impl Into<PathBuf>) -> Self {
        Self {
            cfg,
            fs,
            root: root.into(),
        }
    }

    /// App directory as a glob prefix.
    fn app(&self) -> String {
        slash_path(self.cfg.app_dir()).trim_end_matches('/').to_string()
    }

    fn app_path(&self, rel: &str) -> PathBuf {
        self.cfg.app_dir().join(rel)
    }

    /// Pipeline of an asset class, `None` for the other tasks.
    pub fn pipeline_for(&self, task: TaskId) -> Result<Option<AssetPipeline>, TransformError> {
        let pipeline = match task {
            TaskId::Styles => self.styles()?,
            TaskId::Scripts => self.scripts()?,
            TaskId::Pages => self.pages()?,
            TaskId::Fonts => self.fonts()?,
            TaskId::Images => self.images()?,
            TaskId::Sprite => self.sprite()?,
            TaskId::Building | TaskId::Clean | TaskId::Watching => return Ok(None),
        };
        Ok(Some(pipeline))
    }

    fn styles(&self) -> Result<AssetPipeline, TransformError> {
        let styles = &self.cfg.styles;
        let entry = format!("{}/{}", self.app(), styles.entry);
        let mut globs = styles.vendor.clone();
        globs.push(entry.clone());

        let load_path = self
            .root
            .join(Path::new(&entry).parent().unwrap_or(Path::new("")));

        Ok(AssetPipeline {
            task: TaskId::Styles,
            dest: self.app_path("css"),
            stages: vec![
                Stage::select(SourceSelector::new(globs)?)
                    .step(PerFile(Autoprefix))
                    .step(Concat::new(&styles.output))
                    .step(PerFile(Scss::new(vec![load_path]))),
            ],
        })
    }

    fn scripts(&self) -> Result<AssetPipeline, TransformError> {
        let scripts = &self.cfg.scripts;
        let mut globs = scripts.vendor.clone();
        globs.push(format!("{}/{}", self.app(), scripts.entry));

        Ok(AssetPipeline {
            task: TaskId::Scripts,
            dest: self.app_path("js"),
            stages: vec![
                Stage::select(SourceSelector::new(globs)?)
                    .step(Concat::new(&scripts.output))
                    .step(PerFile(JsMinify)),
            ],
        })
    }

    fn pages(&self) -> Result<AssetPipeline, TransformError> {
        let app_root = self.root.join(self.cfg.app_dir());
        let include = Include::new(
            Arc::clone(&self.fs),
            app_root.join("pages"),
            vec![app_root.join("components")],
        );

        Ok(AssetPipeline {
            task: TaskId::Pages,
            dest: self.cfg.app_dir().to_path_buf(),
            stages: vec![
                Stage::select(SourceSelector::new([format!("{}/pages/*.html", self.app())])?)
                    .step(PerFile(include)),
            ],
        })
    }

    fn fonts(&self) -> Result<AssetPipeline, TransformError> {
        let app = self.app();
        Ok(AssetPipeline {
            task: TaskId::Fonts,
            dest: self.app_path("fonts"),
            stages: vec![
                Stage::select(SourceSelector::new([format!("{app}/fonts/src/*.*")])?)
                    .step(PerFile(FontConvert::new(self.cfg.font_formats()))),
                Stage::select(SourceSelector::new([format!("{app}/fonts/*.ttf")])?)
                    .step(PerFile(Ttf2Woff2)),
            ],
        })
    }

    fn images(&self) -> Result<AssetPipeline, TransformError> {
        let app = self.app();
        let all_sources = format!("{app}/images/src/**/*.*");
        let images = &self.cfg.images;

        Ok(AssetPipeline {
            task: TaskId::Images,
            dest: self.app_path("images"),
            stages: vec![
                Stage::select(SourceSelector::new([
                    all_sources.clone(),
                    format!("!{app}/images/src/**/*.svg"),
                ])?)
                .guard(NewerGuard::with_extension("avif"))
                .step(PerFile(AvifEncode::new(clamp_quality(images.avif_quality)))),
                Stage::select(SourceSelector::new([all_sources.clone()])?)
                    .guard(NewerGuard::with_extension("webp"))
                    .step(PerFile(WebpEncode)),
                Stage::select(SourceSelector::new([all_sources])?)
                    .guard(NewerGuard::same_path())
                    .step(PerFile(Optimize::new(clamp_quality(images.jpeg_quality)))),
            ],
        })
    }

    fn sprite(&self) -> Result<AssetPipeline, TransformError> {
        let app = self.app();
        let selector = SourceSelector::new([
            format!("{app}/images/**/*.svg"),
            format!("!{app}/images/src/**"),
            format!("!{app}/images/{SPRITE_FILE}"),
            format!("!{app}/images/symbol/**"),
            format!("!{app}/images/stack/**"),
        ])?;

        let mut sprite = SvgSprite::new(SPRITE_FILE);
        if self.cfg.sprite.example {
            sprite = sprite.with_example(SPRITE_EXAMPLE);
        }

        Ok(AssetPipeline {
            task: TaskId::Sprite,
            dest: self.app_path("images"),
            stages: vec![Stage::select(selector).step(sprite)],
        })
    }
}

fn clamp_quality(value: u32) -> u8 {
    value.clamp(1, 100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MockFileSystem;
    use crate::pipeline::run_pipeline;

    fn set(fs: &MockFileSystem) -> PipelineSet {
        PipelineSet::new(ConfigFile::defaults(), Arc::new(fs.clone()), "/p")
    }

    fn run(fs: &MockFileSystem, task: TaskId) -> Vec<PathBuf> {
        let pipeline = set(fs).pipeline_for(task).unwrap().unwrap();
        run_pipeline(fs, Path::new("/p"), &pipeline).unwrap().written
    }

    fn text(fs: &MockFileSystem, path: &str) -> String {
        String::from_utf8(fs.contents(path).unwrap()).unwrap()
    }

    #[test]
    fn non_asset_tasks_have_no_pipeline() {
        let fs = MockFileSystem::new();
        for task in [TaskId::Building, TaskId::Clean, TaskId::Watching] {
            assert!(set(&fs).pipeline_for(task).unwrap().is_none());
        }
    }

    #[test]
    fn pages_expand_components_into_the_app_root() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/app/components/header.html", "<header>Hi</header>");
        fs.add_file(
            "/p/app/pages/index.html",
            "<body>\n<!--=include header.html -->\n</body>\n",
        );

        assert_eq!(run(&fs, TaskId::Pages), vec![PathBuf::from("app/index.html")]);
        let html = text(&fs, "/p/app/index.html");
        assert!(html.contains("<header>Hi</header>"));
        assert!(!html.contains("=include"));
    }

    #[test]
    fn scripts_concatenate_vendor_before_main() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/node_modules/swiper/swiper-bundle.js", "var swiperMarker = 1;");
        fs.add_file("/p/app/js/main.js", "var mainMarker = 2;");

        assert_eq!(run(&fs, TaskId::Scripts), vec![PathBuf::from("app/js/main.min.js")]);
        let js = text(&fs, "/p/app/js/main.min.js");
        let vendor = js.find("swiperMarker").unwrap();
        let main = js.find("mainMarker").unwrap();
        assert!(vendor < main);
    }

    #[test]
    fn scripts_without_vendor_bundle_still_build() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/app/js/main.js", "var only = 1;");
        assert_eq!(run(&fs, TaskId::Scripts), vec![PathBuf::from("app/js/main.min.js")]);
    }

    #[test]
    fn sprite_ignores_sources_and_its_own_output() {
        let fs = MockFileSystem::new();
        let icon = r#"<svg viewBox="0 0 1 1"><path d="M0 0"/></svg>"#;
        fs.add_file("/p/app/images/phone.svg", icon);
        fs.add_file("/p/app/images/src/raw.svg", icon);
        fs.add_file("/p/app/images/sprite.svg", "<svg>old</svg>");
        fs.add_file("/p/app/images/stack/other.svg", icon);

        let written = run(&fs, TaskId::Sprite);
        assert_eq!(
            written,
            vec![
                PathBuf::from("app/images/sprite.svg"),
                PathBuf::from("app/images/symbol/sprite.symbol.html"),
            ]
        );
        let sprite = text(&fs, "/p/app/images/sprite.svg");
        assert!(sprite.contains(r#"id="phone""#));
        assert!(!sprite.contains(r#"id="raw""#));
        assert!(!sprite.contains("old"));
        assert!(!sprite.contains(r#"id="other""#));
    }

    #[test]
    fn fonts_emit_woff_ttf_and_woff2() {
        use crate::transform::font::sfnt::{checksum, Sfnt, Table, TRUETYPE};

        let data = b"glyph data glyph data glyph data".to_vec();
        let font = Sfnt::new(
            TRUETYPE,
            vec![Table {
                tag: *b"glyf",
                checksum: checksum(&data),
                data,
            }],
        );
        let fs = MockFileSystem::new();
        fs.add_file("/p/app/fonts/src/Roboto.ttf", font.to_bytes());

        let written = run(&fs, TaskId::Fonts);
        assert_eq!(
            written,
            vec![
                PathBuf::from("app/fonts/Roboto.ttf"),
                PathBuf::from("app/fonts/Roboto.woff"),
                PathBuf::from("app/fonts/Roboto.woff2"),
            ]
        );
    }
}

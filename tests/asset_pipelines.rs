// tests/asset_pipelines.rs

use std::path::PathBuf;
use std::sync::Arc;

use assetdag::config::ConfigFile;
use assetdag::fs::MockFileSystem;
use assetdag::tasks::TaskContext;
use assetdag::types::TaskId;
use assetdag_test_utils::{init_tracing, ConfigFileBuilder};
use image::codecs::png::PngEncoder;
use image::{ImageEncoder, Rgb, RgbImage};

fn ctx(fs: &MockFileSystem, cfg: ConfigFile) -> TaskContext {
    init_tracing();
    TaskContext::new(cfg, Arc::new(fs.clone()), "/p")
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| Rgb([(x * 8) as u8, (y * 8) as u8, 200]));
    let mut out = Vec::new();
    PngEncoder::new(&mut out)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
    out
}

fn text(fs: &MockFileSystem, path: &str) -> String {
    String::from_utf8(fs.contents(path).unwrap()).unwrap()
}

#[test]
fn pages_inline_components_into_the_app_root() {
    let fs = MockFileSystem::new();
    fs.add_file("/p/app/components/header.html", "<header>Site</header>");
    fs.add_file("/p/app/components/footer.html", "<footer>Bye</footer>");
    fs.add_file(
        "/p/app/pages/index.html",
        "<body>\n  <!--=include header.html -->\n  <main>Home</main>\n  <!--=include footer.html -->\n</body>\n",
    );

    let report = ctx(&fs, ConfigFile::defaults()).run_blocking(TaskId::Pages).unwrap();

    assert_eq!(report.written, vec![PathBuf::from("app/index.html")]);
    let html = text(&fs, "/p/app/index.html");
    let header = html.find("<header>Site</header>").unwrap();
    let main = html.find("<main>Home</main>").unwrap();
    let footer = html.find("<footer>Bye</footer>").unwrap();
    assert!(header < main && main < footer);
    assert!(!html.contains("=include"));
}

#[test]
fn images_get_avif_and_webp_siblings_and_sources_stay_untouched() {
    let fs = MockFileSystem::new();
    let source = png(24, 24);
    fs.add_file("/p/app/images/src/trip/photo.png", source.clone());

    let report = ctx(&fs, ConfigFile::defaults()).run_blocking(TaskId::Images).unwrap();

    let mut written = report.written.clone();
    written.sort();
    assert_eq!(
        written,
        vec![
            PathBuf::from("app/images/trip/photo.avif"),
            PathBuf::from("app/images/trip/photo.png"),
            PathBuf::from("app/images/trip/photo.webp"),
        ]
    );
    assert_eq!(fs.contents("/p/app/images/src/trip/photo.png").unwrap(), source);

    let webp = fs.contents("/p/app/images/trip/photo.webp").unwrap();
    let decoded = image::load_from_memory(&webp).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (24, 24));
}

#[test]
fn styles_concatenate_vendor_before_the_entry() {
    let fs = MockFileSystem::new();
    fs.add_file(
        "/p/node_modules/swiper/swiper-bundle.css",
        ".swiper { position: relative; }\n",
    );
    fs.add_file(
        "/p/app/scss/style.scss",
        "$accent: #ff0000;\n.main {\n  color: $accent;\n}\n",
    );

    let report = ctx(&fs, ConfigFile::defaults()).run_blocking(TaskId::Styles).unwrap();

    assert_eq!(report.written, vec![PathBuf::from("app/css/style.min.css")]);
    let css = text(&fs, "/p/app/css/style.min.css");
    let vendor = css.find(".swiper").unwrap();
    let main = css.find(".main").unwrap();
    assert!(vendor < main);
    assert!(!css.contains("$accent"));
}

#[test]
fn repeated_runs_are_stable() {
    let fs = MockFileSystem::new();
    fs.add_file("/p/app/scss/style.scss", ".a {\n  user-select: none;\n}\n");
    fs.add_file("/p/app/js/main.js", "function greet(name) {\n  return 'hi ' + name;\n}\n");
    fs.add_file("/p/app/images/src/logo.png", png(8, 8));
    let ctx = ctx(&fs, ConfigFileBuilder::new().styles_vendor(&[]).scripts_vendor(&[]).build());

    for task in [TaskId::Styles, TaskId::Scripts] {
        ctx.run_blocking(task).unwrap();
    }
    let css = fs.contents("/p/app/css/style.min.css").unwrap();
    let js = fs.contents("/p/app/js/main.min.js").unwrap();

    for task in [TaskId::Styles, TaskId::Scripts] {
        ctx.run_blocking(task).unwrap();
    }
    assert_eq!(fs.contents("/p/app/css/style.min.css").unwrap(), css);
    assert_eq!(fs.contents("/p/app/js/main.min.js").unwrap(), js);

    // Image outputs are newer than their source after the first pass.
    assert!(!ctx.run_blocking(TaskId::Images).unwrap().written.is_empty());
    assert!(ctx.run_blocking(TaskId::Images).unwrap().written.is_empty());
}

#[test]
fn sprite_collects_loose_svgs_only() {
    let fs = MockFileSystem::new();
    let svg = |body: &str| {
        format!(r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 10 10">{body}</svg>"#)
    };
    fs.add_file("/p/app/images/icons/star.svg", svg("<path d=\"M0 0h10\"/>"));
    fs.add_file("/p/app/images/src/raw.svg", svg("<circle r=\"1\"/>"));
    fs.add_file("/p/app/images/stack/old.svg", svg("<rect/>"));

    let report = ctx(&fs, ConfigFileBuilder::new().sprite_example(false).build())
        .run_blocking(TaskId::Sprite)
        .unwrap();

    assert_eq!(report.written, vec![PathBuf::from("app/images/sprite.svg")]);
    let sprite = text(&fs, "/p/app/images/sprite.svg");
    assert!(sprite.contains(r#"id="icons--star""#));
    assert!(!sprite.contains("raw"));
    assert!(!sprite.contains("<rect"));
}

#[test]
fn styles_accept_a_block_closed_on_its_last_declaration() {
    let fs = MockFileSystem::new();
    fs.add_file("/p/app/scss/style.scss", ".a {\n  transition: all 1s; }\n");

    let report = ctx(&fs, ConfigFileBuilder::new().styles_vendor(&[]).build())
        .run_blocking(TaskId::Styles)
        .unwrap();

    assert_eq!(report.written, vec![PathBuf::from("app/css/style.min.css")]);
    let css = text(&fs, "/p/app/css/style.min.css");
    assert!(css.contains("-webkit-transition:all 1s"), "{css}");
    assert!(css.contains(".a{"), "{css}");
}

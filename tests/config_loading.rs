// tests/config_loading.rs

use std::fs;
use std::path::Path;

use assetdag::config::{load_and_validate, project_root, resolve_config};
use assetdag::errors::AssetdagError;
use assetdag::transform::FontFormat;
use assetdag_test_utils::ConfigFileBuilder;

#[test]
fn toml_file_overrides_only_what_it_names() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Assetdag.toml");
    fs::write(
        &path,
        r#"
[paths]
app = "src"
dist = "public"

[server]
port = 8080

[images]
avif_quality = 70

[fonts]
formats = ["woff"]
"#,
    )
    .unwrap();

    let cfg = load_and_validate(&path).unwrap();
    assert_eq!(cfg.app_dir(), Path::new("src"));
    assert_eq!(cfg.dist_dir(), Path::new("public"));
    assert_eq!(cfg.server_addr().port(), 8080);
    assert_eq!(cfg.images.avif_quality, 70);
    assert_eq!(cfg.images.jpeg_quality, 80);
    assert_eq!(cfg.font_formats(), vec![FontFormat::Woff]);
    assert_eq!(cfg.styles.entry, "scss/style.scss");
    assert!(cfg.build_globs.iter().all(|g| g.trim_start_matches('!').starts_with("src/")));

    assert_eq!(project_root(Some(&path)), dir.path());
}

#[test]
fn explicit_config_must_exist() {
    let dir = tempfile::tempdir().unwrap();
    let err = resolve_config(Some(&dir.path().join("missing.toml"))).unwrap_err();
    assert!(matches!(err, AssetdagError::ConfigError(_)));
}

#[test]
fn malformed_toml_is_a_toml_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Assetdag.toml");
    fs::write(&path, "[paths\napp = 1").unwrap();
    assert!(matches!(
        load_and_validate(&path).unwrap_err(),
        AssetdagError::TomlError(_)
    ));
}

#[test]
fn builder_rejects_invalid_layouts() {
    let cases = [
        ConfigFileBuilder::new().app("site").dist("site"),
        ConfigFileBuilder::new().dist("app/dist"),
        ConfigFileBuilder::new().avif_quality(0),
        ConfigFileBuilder::new().jpeg_quality(101),
        ConfigFileBuilder::new().font_formats(&["eot"]),
        ConfigFileBuilder::new().build_globs(&[]),
    ];

    for builder in cases {
        let raw = format!("{:?}", builder.raw());
        assert!(
            matches!(builder.try_build(), Err(AssetdagError::ConfigError(_))),
            "expected a config error for {raw}"
        );
    }
}

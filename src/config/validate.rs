// src/config/validate.rs

use std::path::{Component, Path};

use crate::config::model::{default_build_globs, parse_host, ConfigFile, RawConfigFile};
use crate::errors::{AssetdagError, Result};
use crate::pipeline::SourceSelector;
use crate::transform::FontFormat;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::AssetdagError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

/// Run every check against an unvalidated config.
pub fn validate_config(cfg: &RawConfigFile) -> Result<()> {
    validate_raw_config(cfg)
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_paths(cfg)?;
    validate_server(cfg)?;
    validate_bundles(cfg)?;
    validate_images(cfg)?;
    validate_fonts(cfg)?;
    validate_build(cfg)?;
    Ok(())
}

fn config_error(msg: impl Into<String>) -> AssetdagError {
    AssetdagError::ConfigError(msg.into())
}

/// Lexically normalised components, `.` dropped.
fn normalised(path: &Path) -> Vec<Component<'_>> {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

fn validate_paths(cfg: &RawConfigFile) -> Result<()> {
    let app = normalised(&cfg.paths.app);
    let dist = normalised(&cfg.paths.dist);

    if app.is_empty() {
        return Err(config_error("[paths].app must not be empty"));
    }
    if dist.is_empty() {
        return Err(config_error("[paths].dist must not be empty"));
    }
    if app == dist {
        return Err(config_error(format!(
            "[paths].app and [paths].dist must differ (both are {:?})",
            cfg.paths.app
        )));
    }
    if dist.starts_with(&app) {
        return Err(config_error(format!(
            "[paths].dist {:?} must not live inside [paths].app {:?}",
            cfg.paths.dist, cfg.paths.app
        )));
    }
    Ok(())
}

fn validate_server(cfg: &RawConfigFile) -> Result<()> {
    if parse_host(&cfg.server.host).is_none() {
        return Err(config_error(format!(
            "[server].host must be an IP address or \"localhost\" (got {:?})",
            cfg.server.host
        )));
    }
    Ok(())
}

fn validate_bundles(cfg: &RawConfigFile) -> Result<()> {
    let bundles = [
        ("styles", &cfg.styles.entry, &cfg.styles.output),
        ("scripts", &cfg.scripts.entry, &cfg.scripts.output),
    ];
    for (section, entry, output) in bundles {
        if entry.trim().is_empty() {
            return Err(config_error(format!("[{section}].entry must not be empty")));
        }
        if output.trim().is_empty() || output.contains(['/', '\\']) {
            return Err(config_error(format!(
                "[{section}].output must be a plain file name (got {output:?})"
            )));
        }
    }
    Ok(())
}

fn validate_images(cfg: &RawConfigFile) -> Result<()> {
    for (key, value) in [
        ("avif_quality", cfg.images.avif_quality),
        ("jpeg_quality", cfg.images.jpeg_quality),
    ] {
        if !(1..=100).contains(&value) {
            return Err(config_error(format!(
                "[images].{key} must be between 1 and 100 (got {value})"
            )));
        }
    }
    Ok(())
}

fn validate_fonts(cfg: &RawConfigFile) -> Result<()> {
    if cfg.fonts.formats.is_empty() {
        return Err(config_error("[fonts].formats must list at least one format"));
    }
    for format in &cfg.fonts.formats {
        format
            .parse::<FontFormat>()
            .map_err(|e| config_error(format!("[fonts].formats: {e}")))?;
    }
    Ok(())
}

fn validate_build(cfg: &RawConfigFile) -> Result<()> {
    let globs = cfg
        .build
        .globs
        .clone()
        .unwrap_or_else(|| default_build_globs(&cfg.paths.app));

    if !globs.iter().any(|g| !g.trim_start().starts_with('!')) {
        return Err(config_error(
            "[build].globs must contain at least one inclusion glob",
        ));
    }

    let selector = SourceSelector::new(&globs)
        .map_err(|e| config_error(format!("[build].globs: {e}")))?;
    let app = cfg.paths.app.to_string_lossy().replace('\\', "/");
    for pattern in selector.patterns() {
        let pattern = pattern.trim_start_matches('!');
        if !Path::new(pattern).starts_with(&cfg.paths.app) {
            return Err(config_error(format!(
                "[build].globs entry {pattern:?} must start with the app directory {app:?}"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_src: &str) -> Result<ConfigFile> {
        let raw: RawConfigFile = toml::from_str(toml_src)?;
        ConfigFile::try_from(raw)
    }

    fn expect_config_error(toml_src: &str, needle: &str) {
        match parse(toml_src) {
            Err(AssetdagError::ConfigError(msg)) => {
                assert!(msg.contains(needle), "{msg:?} does not mention {needle:?}")
            }
            other => panic!("expected ConfigError mentioning {needle:?}, got {other:?}"),
        }
    }

    #[test]
    fn stock_config_is_valid() {
        assert!(parse("").is_ok());
    }

    #[test]
    fn app_and_dist_must_differ() {
        expect_config_error("[paths]\napp = \"site\"\ndist = \"./site\"\n", "must differ");
    }

    #[test]
    fn dist_inside_app_is_rejected() {
        expect_config_error("[paths]\napp = \"app\"\ndist = \"app/dist\"\n", "inside");
    }

    #[test]
    fn empty_paths_are_rejected() {
        expect_config_error("[paths]\napp = \"\"\n", "[paths].app");
    }

    #[test]
    fn qualities_are_range_checked() {
        expect_config_error("[images]\navif_quality = 0\n", "avif_quality");
        expect_config_error("[images]\njpeg_quality = 101\n", "jpeg_quality");
    }

    #[test]
    fn unknown_font_formats_are_rejected() {
        expect_config_error("[fonts]\nformats = [\"eot\"]\n", "eot");
    }

    #[test]
    fn build_globs_need_an_inclusion() {
        expect_config_error("[build]\nglobs = []\n", "inclusion");
        expect_config_error("[build]\nglobs = [\"!app/x\"]\n", "inclusion");
    }

    #[test]
    fn invalid_build_globs_are_rejected() {
        expect_config_error("[build]\nglobs = [\"app/[oops\"]\n", "[build].globs");
    }

    #[test]
    fn build_globs_must_stay_in_the_app_dir() {
        expect_config_error("[build]\nglobs = [\"secrets/*.txt\"]\n", "app directory");
    }

    #[test]
    fn bad_host_is_rejected() {
        expect_config_error("[server]\nhost = \"example invalid\"\n", "[server].host");
    }

    #[test]
    fn bundle_output_must_be_a_file_name() {
        expect_config_error("[scripts]\noutput = \"js/main.min.js\"\n", "[scripts].output");
    }
}

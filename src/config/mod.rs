// src/config/mod.rs

//! Configuration loading and validation.
//!
//! - `model.rs`: the TOML-backed data model and its defaults.
//! - `loader.rs`: reading the file, or falling back to defaults.
//! - `validate.rs`: semantic checks, run by `TryFrom<RawConfigFile>`.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, project_root, resolve_config};
pub use model::{ConfigFile, RawConfigFile};
pub use validate::validate_config;

// src/config/mod.rs

//! Configuration loading and validation.
//!
//! - `model.rs`: TOML-backed data model and built-in defaults.
//! - `loader.rs`: reading the file (or falling back to defaults).
//! - `validate.rs`: `RawConfigFile` -> `ConfigFile`.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, load_or_default};
pub use model::{
    ActionKind, ActionSpec, ConfigFile, Destinations, RawConfigFile, ServerSection, TaskConfig,
    TaskSpec, WatchSection,
};

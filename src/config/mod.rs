// src/config/mod.rs

//! Configuration loading and validation for dirwatch.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate that every job compiles and the daemon section is usable
//!   (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_paths, load_and_validate, load_from_path};
pub use model::{ConfigFile, DaemonSection, JobConfig, RawConfigFile};

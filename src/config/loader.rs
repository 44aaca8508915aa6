// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{DirwatchError, Result};

/// Load a configuration file from a given path and return the raw
/// `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** check that the
/// jobs compile. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and run validation.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Load the first config found among [`default_config_paths`].
pub fn load_default() -> Result<ConfigFile> {
    let candidates = default_config_paths();
    for candidate in &candidates {
        if candidate.is_file() {
            return load_and_validate(candidate);
        }
    }
    Err(DirwatchError::ConfigError(format!(
        "no config file found (looked in {:?})",
        candidates
    )))
}

/// Locations searched when no `--config` is given: the system-wide file
/// first, then the one in the user's home directory.
pub fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("/etc/dirwatch.toml")];
    if let Some(home) = std::env::var_os("HOME") {
        paths.push(PathBuf::from(home).join(".dirwatch.toml"));
    }
    paths
}

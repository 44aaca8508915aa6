// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{DirwatchError, Result};
use crate::job::Job;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::DirwatchError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.daemon, raw.job))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_jobs(cfg)?;
    validate_daemon_section(cfg)?;
    validate_jobs(cfg)?;
    Ok(())
}

fn ensure_has_jobs(cfg: &RawConfigFile) -> Result<()> {
    if cfg.job.is_empty() {
        return Err(DirwatchError::ConfigError(
            "config must contain at least one [job.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_daemon_section(cfg: &RawConfigFile) -> Result<()> {
    if !cfg.daemon.pidfile.is_absolute() {
        return Err(DirwatchError::ConfigError(format!(
            "[daemon].pidfile must be an absolute path (got {:?})",
            cfg.daemon.pidfile
        )));
    }
    Ok(())
}

/// Every job must compile: known event names, absolute watch path, valid
/// `exclude_re`, renderable `outfile`.
fn validate_jobs(cfg: &RawConfigFile) -> Result<()> {
    for (name, job) in cfg.job.iter() {
        Job::from_config(name, job)?;
    }
    Ok(())
}

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dirwatch::config::{ConfigFile, DaemonSection, JobConfig, RawConfigFile};
use dirwatch::job::Job;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                daemon: DaemonSection::default(),
                job: BTreeMap::new(),
            },
        }
    }

    pub fn with_job(mut self, name: &str, job: JobConfig) -> Self {
        self.config.job.insert(name.to_string(), job);
        self
    }

    pub fn pidfile(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.daemon.pidfile = path.into();
        self
    }

    pub fn logfile(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.daemon.logfile = path.into();
        self
    }

    /// The unvalidated config, for tests exercising validation itself.
    pub fn build_raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `JobConfig`. Defaults match the TOML defaults, with
/// `events = ["create"]`.
pub struct JobConfigBuilder {
    job: JobConfig,
}

impl JobConfigBuilder {
    pub fn new(watch: impl AsRef<Path>, command: &str) -> Self {
        Self {
            job: JobConfig {
                watch: watch.as_ref().to_path_buf(),
                events: vec!["create".to_string()],
                command: command.to_string(),
                recursive: true,
                autoadd: true,
                excluded: vec![],
                include_extensions: vec![],
                exclude_extensions: vec![],
                exclude_re: None,
                background: false,
                log_output: true,
                outfile: None,
                action_on_success: None,
                action_on_failure: None,
            },
        }
    }

    pub fn events(mut self, events: &[&str]) -> Self {
        self.job.events = events.iter().map(|e| e.to_string()).collect();
        self
    }

    pub fn recursive(mut self, val: bool) -> Self {
        self.job.recursive = val;
        self
    }

    pub fn autoadd(mut self, val: bool) -> Self {
        self.job.autoadd = val;
        self
    }

    pub fn exclude_dir(mut self, prefix: &str) -> Self {
        self.job.excluded.push(prefix.to_string());
        self
    }

    pub fn include_ext(mut self, ext: &str) -> Self {
        self.job.include_extensions.push(ext.to_string());
        self
    }

    pub fn exclude_ext(mut self, ext: &str) -> Self {
        self.job.exclude_extensions.push(ext.to_string());
        self
    }

    pub fn exclude_re(mut self, re: &str) -> Self {
        self.job.exclude_re = Some(re.to_string());
        self
    }

    pub fn background(mut self, val: bool) -> Self {
        self.job.background = val;
        self
    }

    pub fn log_output(mut self, val: bool) -> Self {
        self.job.log_output = val;
        self
    }

    pub fn outfile(mut self, template: &str) -> Self {
        self.job.outfile = Some(template.to_string());
        self
    }

    pub fn on_success(mut self, template: &str) -> Self {
        self.job.action_on_success = Some(template.to_string());
        self
    }

    pub fn on_failure(mut self, template: &str) -> Self {
        self.job.action_on_failure = Some(template.to_string());
        self
    }

    pub fn build(self) -> JobConfig {
        self.job
    }

    /// Compile into a `Job` named `name`.
    pub fn compile(self, name: &str) -> Arc<Job> {
        Arc::new(Job::from_config(name, &self.job).expect("job config should compile"))
    }
}

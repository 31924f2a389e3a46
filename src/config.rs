//! Replay configuration.
use crate::{
    constants::{DEFAULT_MAX_OUTPUT_BYTES, DEFAULT_POLL_INTERVAL, DEFAULT_WAIT_TIMEOUT},
    jobs::PollConfig,
};
use eyre::Context;
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

/// Replay configuration.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayConfig {
    /// Simulator process configuration.
    #[serde(default)]
    pub simulator: SimulatorConfig,
    /// Job polling configuration.
    #[serde(default)]
    pub jobs: JobsConfig,
}

impl ReplayConfig {
    /// Sets the simulator binary. Takes precedence over every other lookup.
    pub fn with_simulator_path(mut self, path: Option<PathBuf>) -> Self {
        self.simulator.path = path.or(self.simulator.path);
        self
    }

    /// Sets the maximum number of bytes captured per simulator output stream.
    pub fn with_max_output_bytes(mut self, max_output_bytes: usize) -> Self {
        self.simulator.max_output_bytes = max_output_bytes;
        self
    }

    /// Sets the log filter forwarded to the simulator as `RUST_LOG`.
    pub fn with_simulator_log_level(mut self, log_level: Option<String>) -> Self {
        self.simulator.log_level = log_level.or(self.simulator.log_level);
        self
    }

    /// Sets the interval between two job polls.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.jobs.poll_interval = poll_interval;
        self
    }

    /// Sets how long to wait for a job before giving up.
    pub fn with_wait_timeout(mut self, wait_timeout: Duration) -> Self {
        self.jobs.wait_timeout = wait_timeout;
        self
    }

    /// Load from a YAML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> eyre::Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .wrap_err_with(|| format!("failed to read config file: {}", path.display()))?;
        let config = serde_yaml::from_reader(&file)
            .wrap_err_with(|| format!("failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Save to a YAML file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> eyre::Result<()> {
        let path = path.as_ref();
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)
            .wrap_err_with(|| format!("failed to write config file: {}", path.display()))?;
        Ok(())
    }
}

/// Simulator process configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Explicit simulator binary.
    ///
    /// If unset, the binary is looked up through the environment, the working directory and
    /// `PATH`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Maximum number of bytes kept from each of stdout and stderr.
    pub max_output_bytes: usize,
    /// Log filter forwarded to the simulator as `RUST_LOG`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self { path: None, max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES, log_level: None }
    }
}

/// Job polling configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobsConfig {
    /// Interval between two polls of a job.
    #[serde(with = "crate::serde::duration")]
    pub poll_interval: Duration,
    /// How long to wait for a job before giving up.
    #[serde(with = "crate::serde::duration")]
    pub wait_timeout: Duration,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self { poll_interval: DEFAULT_POLL_INTERVAL, wait_timeout: DEFAULT_WAIT_TIMEOUT }
    }
}

impl From<JobsConfig> for PollConfig {
    fn from(config: JobsConfig) -> Self {
        Self { interval: config.poll_interval, timeout: config.wait_timeout }
    }
}

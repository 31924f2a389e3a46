//! # Replay CLI
use crate::{
    config::ReplayConfig,
    jobs::{JobScheduler, JobStatus, PollConfig},
    simulator::ProcessRunner,
    types::SimulationRequest,
};
use clap::Parser;
use eyre::{Context, bail};
use std::{path::PathBuf, time::Duration};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Replays a transaction in the external simulator and reports security boundary violations.
#[derive(Debug, Parser)]
#[command(author, about = "Replay", long_about = None)]
pub struct Args {
    /// The configuration file.
    ///
    /// If missing, a default one will be used and stored in the working directory under
    /// `replay.yaml`.
    #[arg(long, value_name = "CONFIG", env = "REPLAY_CONFIG", default_value = "replay.yaml")]
    pub config: PathBuf,
    /// JSON file holding the simulation request.
    #[arg(long, value_name = "FILE")]
    pub request: PathBuf,
    /// The simulator binary. Takes precedence over the configuration and the environment.
    #[arg(long, value_name = "PATH")]
    pub simulator: Option<PathBuf>,
    /// Log filter forwarded to the simulator as `RUST_LOG`.
    #[arg(long = "simulator-log-level", value_name = "FILTER")]
    pub simulator_log_level: Option<String>,
    /// Maximum number of bytes captured from each simulator output stream.
    #[arg(long = "max-output-bytes", value_name = "BYTES")]
    pub max_output_bytes: Option<usize>,
    /// Interval between two job polls.
    #[arg(long = "poll-interval", value_name = "MILLIS", value_parser = parse_duration_millis)]
    pub poll_interval: Option<Duration>,
    /// How long to wait for the simulation before giving up.
    #[arg(long, value_name = "SECONDS", value_parser = parse_duration_secs)]
    pub timeout: Option<Duration>,
}

impl Args {
    /// Runs one simulation and prints the finished job as JSON.
    ///
    /// Cancelling `cancel` stops waiting for the job.
    pub async fn run(self, cancel: CancellationToken) -> eyre::Result<()> {
        let config = if !self.config.exists() {
            let config = self.merge_replay_config(ReplayConfig::default());
            config.save_to_file(&self.config)?;
            config
        } else {
            // File exists: load and override with CLI values.
            self.merge_replay_config(ReplayConfig::load_from_file(&self.config)?)
        };

        let request: SimulationRequest = {
            let file = std::fs::File::open(&self.request).wrap_err_with(|| {
                format!("failed to read request file: {}", self.request.display())
            })?;
            serde_json::from_reader(std::io::BufReader::new(file)).wrap_err_with(|| {
                format!("failed to parse request file: {}", self.request.display())
            })?
        };

        let runner = ProcessRunner::new(&config.simulator)?;
        info!(binary = %runner.binary().display(), "Using simulator");

        let scheduler = JobScheduler::new(runner);
        let id = scheduler.submit(request)?;
        let job = scheduler.wait(&cancel, &id, PollConfig::from(config.jobs)).await?;

        println!("{}", serde_json::to_string_pretty(&job)?);

        if job.status() == JobStatus::Failed {
            let error = job.error().unwrap_or_default();
            warn!(job_id = %id, %error, "Simulation failed");
            bail!("simulation {id} failed: {error}");
        }
        if let Some(response) = job.response() {
            for violation in &response.security_violations {
                warn!(
                    contract = %violation.contract,
                    severity = %violation.severity,
                    "{}", violation.description
                );
            }
        }

        Ok(())
    }

    /// Merges [`Args`] values into an existing [`ReplayConfig`] instance.
    pub fn merge_replay_config(&self, config: ReplayConfig) -> ReplayConfig {
        let mut config = config
            .with_simulator_path(self.simulator.clone())
            .with_simulator_log_level(self.simulator_log_level.clone());
        if let Some(max_output_bytes) = self.max_output_bytes {
            config = config.with_max_output_bytes(max_output_bytes);
        }
        if let Some(poll_interval) = self.poll_interval {
            config = config.with_poll_interval(poll_interval);
        }
        if let Some(timeout) = self.timeout {
            config = config.with_wait_timeout(timeout);
        }
        config
    }
}

/// Parses a string representing seconds to a [`Duration`].
fn parse_duration_secs(arg: &str) -> Result<Duration, std::num::ParseIntError> {
    let seconds = arg.parse()?;
    Ok(Duration::from_secs(seconds))
}

/// Parses a string representing milliseconds to a [`Duration`].
fn parse_duration_millis(arg: &str) -> Result<Duration, std::num::ParseIntError> {
    let millis = arg.parse()?;
    Ok(Duration::from_millis(millis))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_overrides_config() {
        let args = Args::parse_from([
            "replay",
            "--request",
            "tx.json",
            "--simulator",
            "/opt/replay-sim",
            "--poll-interval",
            "100",
            "--timeout",
            "60",
        ]);
        let config = args.merge_replay_config(
            ReplayConfig::default().with_simulator_log_level(Some("info".into())),
        );

        assert_eq!(config.simulator.path, Some(PathBuf::from("/opt/replay-sim")));
        assert_eq!(config.simulator.log_level.as_deref(), Some("info"));
        assert_eq!(config.jobs.poll_interval, Duration::from_millis(100));
        assert_eq!(config.jobs.wait_timeout, Duration::from_secs(60));
    }

    #[test]
    fn absent_flags_keep_config() {
        let args = Args::parse_from(["replay", "--request", "tx.json"]);
        let config = ReplayConfig::default()
            .with_max_output_bytes(42)
            .with_wait_timeout(Duration::from_secs(1));
        assert_eq!(args.merge_replay_config(config.clone()), config);
    }
}

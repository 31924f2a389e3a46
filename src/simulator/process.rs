use super::{SimulationRunner, capture::capture_bounded, locate_simulator};
use crate::{
    config::SimulatorConfig,
    constants::DEFAULT_MAX_OUTPUT_BYTES,
    error::SimulationError,
    security::analyze_security_boundary,
    types::{SimulationRequest, SimulationResponse, SimulationStatus},
};
use async_trait::async_trait;
use std::{
    io,
    path::{Path, PathBuf},
    process::{ExitStatus, Stdio},
};
use tokio::{
    io::AsyncWriteExt,
    process::{ChildStdin, Command},
};
use tracing::{debug, error, info, warn};

/// Runs simulations by spawning the external simulator.
///
/// Each call starts the simulator without arguments, writes the JSON request to its stdin, waits
/// for it to exit and parses the JSON response from its stdout. Successful responses are annotated
/// with the result of [`analyze_security_boundary`].
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    /// Path of the simulator executable.
    binary: PathBuf,
    /// Maximum number of bytes retained per output stream.
    max_output_bytes: usize,
    /// Log filter forwarded to the simulator through `RUST_LOG`.
    log_level: Option<String>,
}

impl ProcessRunner {
    /// Creates a new [`ProcessRunner`], locating the simulator as described in
    /// [`locate_simulator`].
    pub fn new(config: &SimulatorConfig) -> Result<Self, SimulationError> {
        let binary = locate_simulator(config.path.as_deref())?;
        Ok(Self::with_binary(binary)
            .with_max_output_bytes(config.max_output_bytes)
            .with_log_level(config.log_level.clone()))
    }

    /// Creates a new [`ProcessRunner`] for the given executable, without checking that it exists.
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self { binary: binary.into(), max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES, log_level: None }
    }

    /// Sets the maximum number of bytes retained per output stream.
    pub fn with_max_output_bytes(mut self, max_output_bytes: usize) -> Self {
        self.max_output_bytes = max_output_bytes;
        self
    }

    /// Sets the log filter forwarded to the simulator.
    pub fn with_log_level(mut self, log_level: Option<String>) -> Self {
        self.log_level = log_level;
        self
    }

    /// Path of the simulator executable.
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    fn io_error(&self, source: io::Error) -> SimulationError {
        SimulationError::Io { path: self.binary.clone(), source }
    }
}

#[async_trait]
impl SimulationRunner for ProcessRunner {
    async fn run(&self, request: &SimulationRequest) -> Result<SimulationResponse, SimulationError> {
        debug!(binary = %self.binary.display(), "Starting simulation");

        let input = serde_json::to_vec(request).map_err(|err| {
            error!(%err, "Failed to marshal simulation request");
            SimulationError::MarshalFailed(err)
        })?;
        debug!(input_size = input.len(), "Simulation request marshaled");

        let mut command = Command::new(&self.binary);
        command.stdin(Stdio::piped()).stdout(Stdio::piped()).stderr(Stdio::piped());
        if let Some(level) = &self.log_level {
            command.env("RUST_LOG", level);
        }

        info!("Executing simulator binary");
        let mut child = command.spawn().map_err(|err| self.io_error(err))?;
        let (Some(stdin), Some(stdout), Some(stderr)) =
            (child.stdin.take(), child.stdout.take(), child.stderr.take())
        else {
            return Err(self.io_error(io::Error::other("simulator pipes were not captured")));
        };

        // feed stdin while draining both outputs, a simulator may write before it finished reading
        let (written, stdout, stderr) = tokio::join!(
            write_request(stdin, &input),
            capture_bounded(stdout, self.max_output_bytes),
            capture_bounded(stderr, self.max_output_bytes),
        );
        let status = child.wait().await.map_err(|err| self.io_error(err))?;
        written.map_err(|err| self.io_error(err))?;
        let stdout = stdout.map_err(|err| self.io_error(err))?;
        let stderr = stderr.map_err(|err| self.io_error(err))?;

        for (stream, output) in [("stdout", &stdout), ("stderr", &stderr)] {
            if output.is_truncated() {
                warn!(
                    stream,
                    discarded = output.discarded,
                    limit = self.max_output_bytes,
                    "Simulator output exceeded capture limit"
                );
            }
        }

        if !status.success() {
            let stderr = stderr.to_string_lossy();
            error!(%status, %stderr, "Simulator execution failed");
            return Err(match status.code() {
                Some(_) => SimulationError::ProcessExecutionFailed { status, stderr },
                None => SimulationError::ProcessCrashed { signal: exit_signal(&status), stderr },
            });
        }

        debug!(
            stdout_size = stdout.bytes.len(),
            stderr_size = stderr.bytes.len(),
            "Simulator execution completed"
        );

        let mut response: SimulationResponse =
            serde_json::from_slice(&stdout.bytes).map_err(|source| {
                let output = stdout.to_string_lossy();
                error!(err = %source, %output, "Failed to unmarshal simulation response");
                SimulationError::UnmarshalFailed { source, output }
            })?;
        info!(status = ?response.status, "Simulation response received");

        match response.status {
            SimulationStatus::Success => {
                response.security_violations = analyze_security_boundary(&response.events);
                if response.security_violations.is_empty() {
                    info!("No security violations detected");
                } else {
                    warn!(
                        count = response.security_violations.len(),
                        "Security violations detected"
                    );
                    for violation in &response.security_violations {
                        warn!(
                            kind = %violation.kind,
                            severity = %violation.severity,
                            contract = %violation.contract,
                            "Violation"
                        );
                    }
                }

                info!("Simulation completed successfully");
                Ok(response)
            }
            SimulationStatus::Error => {
                let message = response.error.take().unwrap_or_default();
                error!(error = %message, "Simulation logic error");
                Err(SimulationError::SimulationLogicError(message))
            }
        }
    }
}

/// Writes the request and closes stdin.
///
/// A simulator that exits without reading its input closes the pipe early; that is not an error
/// here, its exit status tells what happened.
async fn write_request(mut stdin: ChildStdin, input: &[u8]) -> io::Result<()> {
    match stdin.write_all(input).await {
        Err(err) if err.kind() == io::ErrorKind::BrokenPipe => {
            debug!("Simulator closed stdin before reading the whole request");
            Ok(())
        }
        result => result,
    }
}

#[cfg(unix)]
fn exit_signal(status: &ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn exit_signal(_status: &ExitStatus) -> Option<i32> {
    None
}

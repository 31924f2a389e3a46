use std::{path::PathBuf, process::ExitStatus};
use thiserror::Error;

/// Errors returned while running a simulation.
///
/// Everything except [`SimulationError::SimulationLogicError`] is an infrastructure failure: the
/// simulator could not be found, started, fed, or understood. A logic error means the simulator
/// ran fine and reported that the simulated transaction itself failed.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// The simulator executable could not be located.
    #[error("simulator binary not found: {0}")]
    BinaryNotFound(String),
    /// The request could not be serialized. No process was started.
    #[error("failed to marshal request: {0}")]
    MarshalFailed(#[source] serde_json::Error),
    /// Spawning the simulator or talking to its pipes failed.
    #[error("simulator i/o error with {}: {source}", .path.display())]
    Io {
        /// Path of the simulator binary.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The simulator exited with a non-zero status.
    #[error("simulation execution failed ({status}): {stderr}")]
    ProcessExecutionFailed {
        /// Exit status of the simulator.
        status: ExitStatus,
        /// Captured diagnostic output.
        stderr: String,
    },
    /// The simulator was terminated without an exit code, e.g. by a signal.
    #[error("simulator process crashed (signal {}): {stderr}", display_signal(.signal))]
    ProcessCrashed {
        /// The terminating signal, if known.
        signal: Option<i32>,
        /// Captured diagnostic output.
        stderr: String,
    },
    /// The simulator output was not a well-formed response.
    #[error("failed to unmarshal response: {source}; output: {output}")]
    UnmarshalFailed {
        /// The parse error.
        #[source]
        source: serde_json::Error,
        /// Raw captured output.
        output: String,
    },
    /// The simulator ran to completion but reported a failed simulation.
    #[error("simulation logic error: {0}")]
    SimulationLogicError(String),
}

fn display_signal(signal: &Option<i32>) -> String {
    signal.map_or_else(|| "unknown".to_string(), |signal| signal.to_string())
}

impl SimulationError {
    /// Stable machine-readable code of the error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::BinaryNotFound(_) => "SIMULATOR_NOT_FOUND",
            Self::MarshalFailed(_) => "MARSHAL_FAILED",
            Self::Io { .. } => "SIMULATOR_IO",
            Self::ProcessExecutionFailed { .. } => "SIMULATION_FAILED",
            Self::ProcessCrashed { .. } => "SIMULATOR_CRASH",
            Self::UnmarshalFailed { .. } => "UNMARSHAL_FAILED",
            Self::SimulationLogicError(_) => "SIMULATION_LOGIC_ERROR",
        }
    }

    /// Whether the simulated transaction itself failed.
    pub fn is_logic_error(&self) -> bool {
        matches!(self, Self::SimulationLogicError(_))
    }

    /// Whether the failure points at the environment rather than the transaction.
    pub fn is_infrastructure(&self) -> bool {
        !self.is_logic_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logic_errors_are_not_infrastructure() {
        let err = SimulationError::SimulationLogicError("HostError: budget exceeded".into());
        assert!(err.is_logic_error());
        assert!(!err.is_infrastructure());
        assert_eq!(err.code(), "SIMULATION_LOGIC_ERROR");
        assert_eq!(err.to_string(), "simulation logic error: HostError: budget exceeded");

        let err = SimulationError::BinaryNotFound("set REPLAY_SIMULATOR_PATH".into());
        assert!(err.is_infrastructure());
        assert_eq!(err.code(), "SIMULATOR_NOT_FOUND");
    }

    #[test]
    fn unmarshal_failure_keeps_raw_output() {
        let source = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err = SimulationError::UnmarshalFailed { source, output: "not json".into() };
        assert!(err.to_string().ends_with("output: not json"));
    }
}

use crate::jobs::JobId;
use std::time::Duration;
use thiserror::Error;

/// Errors returned by the [`JobScheduler`](crate::jobs::JobScheduler) when looking up jobs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    /// The job was never submitted or has been cleaned up.
    #[error("job {0} not found")]
    NotFound(JobId),
    /// The job did not reach a terminal state in time.
    #[error("timeout waiting for job {id} after {timeout:?}")]
    Timeout {
        /// The job being waited on.
        id: JobId,
        /// The configured timeout.
        timeout: Duration,
    },
    /// Waiting was cancelled by the caller.
    #[error("wait for job {0} was cancelled")]
    Cancelled(JobId),
}

impl JobError {
    /// Stable machine-readable code of the error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "JOB_NOT_FOUND",
            Self::Timeout { .. } => "JOB_TIMEOUT",
            Self::Cancelled(_) => "JOB_CANCELLED",
        }
    }
}

use super::{Job, JobId, JobOutcome, store::JobStore};
use crate::{
    constants::{DEFAULT_POLL_INTERVAL, DEFAULT_WAIT_TIMEOUT},
    error::{JobError, SimulationError},
    simulator::SimulationRunner,
    types::SimulationRequest,
};
use futures_util::FutureExt;
use std::{panic::AssertUnwindSafe, sync::Arc, time::Duration};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span, trace, warn};

/// How [`JobScheduler::wait`] polls a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Time between two polls.
    pub interval: Duration,
    /// Time after which waiting gives up.
    pub timeout: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self { interval: DEFAULT_POLL_INTERVAL, timeout: DEFAULT_WAIT_TIMEOUT }
    }
}

impl PollConfig {
    /// Sets the poll interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Sets the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Runs simulations in the background and tracks them as [`Job`]s.
///
/// Every submitted request gets its own task, which is the only writer of its job record. Jobs
/// live in memory until [`JobScheduler::cleanup`] removes them.
///
/// Cancelling or timing out [`JobScheduler::wait`] only stops waiting. The simulation keeps
/// running and still records its outcome.
#[derive(Debug, Clone)]
pub struct JobScheduler {
    runner: Arc<dyn SimulationRunner>,
    store: Arc<JobStore>,
}

impl JobScheduler {
    /// Creates a new [`JobScheduler`] running simulations with `runner`.
    pub fn new(runner: impl SimulationRunner + 'static) -> Self {
        Self::with_shared_runner(Arc::new(runner))
    }

    /// Creates a new [`JobScheduler`] from a shared runner.
    pub fn with_shared_runner(runner: Arc<dyn SimulationRunner>) -> Self {
        Self { runner, store: Default::default() }
    }

    /// Submits a simulation and returns its job id without waiting for it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit(&self, request: SimulationRequest) -> Result<JobId, SimulationError> {
        serde_json::to_writer(std::io::sink(), &request).map_err(SimulationError::MarshalFailed)?;

        let id = JobId::generate();
        self.store.insert(Job::new(id));
        info!(job_id = %id, "Async simulation submitted");

        let runner = self.runner.clone();
        let store = self.store.clone();
        tokio::spawn(
            execute(id, request, runner, store).instrument(info_span!("job", job_id = %id)),
        );

        Ok(id)
    }

    /// Returns a snapshot of a job.
    pub fn poll(&self, id: &JobId) -> Result<Job, JobError> {
        self.store.get(id).ok_or(JobError::NotFound(*id))
    }

    /// Polls a job until it finishes, `config.timeout` elapses or `cancel` fires, whichever comes
    /// first.
    pub async fn wait(
        &self,
        cancel: &CancellationToken,
        id: &JobId,
        config: PollConfig,
    ) -> Result<Job, JobError> {
        let deadline = tokio::time::sleep(config.timeout);
        tokio::pin!(deadline);

        // a zero period would make `interval` panic
        let mut ticker = tokio::time::interval(config.interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(job_id = %id, "Stopped waiting for job, cancelled");
                    return Err(JobError::Cancelled(*id));
                }
                _ = &mut deadline => {
                    debug!(job_id = %id, timeout = ?config.timeout, "Stopped waiting for job, timed out");
                    return Err(JobError::Timeout { id: *id, timeout: config.timeout });
                }
                _ = ticker.tick() => {
                    let job = self.poll(id)?;
                    if job.is_terminal() {
                        return Ok(job);
                    }
                    trace!(job_id = %id, status = ?job.status(), "Job still in progress");
                }
            }
        }
    }

    /// Forgets a job, finished or not.
    pub fn cleanup(&self, id: &JobId) {
        if self.store.remove(id).is_some() {
            debug!(job_id = %id, "Cleaned up job");
        }
    }

    /// Number of tracked jobs.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Whether no jobs are tracked.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Runs one job to completion and records its outcome.
async fn execute(
    id: JobId,
    request: SimulationRequest,
    runner: Arc<dyn SimulationRunner>,
    store: Arc<JobStore>,
) {
    if store.update(&id, Job::start).is_none() {
        debug!("Job was cleaned up before it started");
        return;
    }

    let outcome = match AssertUnwindSafe(runner.run(&request)).catch_unwind().await {
        Ok(Ok(response)) => {
            info!(violations = response.security_violations.len(), "Async simulation completed");
            JobOutcome::Completed(Arc::new(response))
        }
        Ok(Err(err)) => {
            warn!(code = err.code(), %err, "Async simulation failed");
            JobOutcome::Failed(err.to_string())
        }
        Err(_) => {
            error!("Async simulation panicked");
            JobOutcome::Failed("simulation task panicked".to_string())
        }
    };

    if store.update(&id, |job| job.finish(outcome)).is_none() {
        debug!("Job was cleaned up before it finished, dropping outcome");
    }
}

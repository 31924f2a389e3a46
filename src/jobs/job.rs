use crate::types::SimulationResponse;
use alloy_primitives::wrap_fixed_bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer, ser::SerializeStruct};
use std::sync::Arc;

wrap_fixed_bytes! {
    /// Identifier of a submitted simulation job.
    ///
    /// 128 random bits, rendered as `0x`-prefixed hex.
    pub struct JobId<16>;
}

impl JobId {
    /// Generates a fresh, unguessable [`JobId`].
    pub fn generate() -> Self {
        Self::new(rand::random())
    }
}

/// Lifecycle state of a [`Job`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Submitted, not started yet.
    Pending,
    /// The simulation is running.
    Running,
    /// The simulation finished and produced a response.
    Completed,
    /// The simulation failed.
    Failed,
}

impl JobStatus {
    /// Whether the status is final.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Final result of a [`Job`].
#[derive(Debug, Clone)]
pub enum JobOutcome {
    /// The simulation produced a response.
    Completed(Arc<SimulationResponse>),
    /// The simulation failed with the given message.
    Failed(String),
}

#[derive(Debug, Clone)]
enum JobState {
    Pending,
    Running,
    Finished { completed_at: DateTime<Utc>, outcome: JobOutcome },
}

/// A submitted simulation and, once finished, its outcome.
///
/// A finished job holds either a response or an error, never both.
#[derive(Debug, Clone)]
pub struct Job {
    id: JobId,
    submitted_at: DateTime<Utc>,
    state: JobState,
}

impl Job {
    /// Creates a new pending [`Job`].
    pub(crate) fn new(id: JobId) -> Self {
        Self { id, submitted_at: Utc::now(), state: JobState::Pending }
    }

    /// Moves a pending job to running. Returns `false` if the job was not pending.
    pub(crate) fn start(&mut self) -> bool {
        if matches!(self.state, JobState::Pending) {
            self.state = JobState::Running;
            true
        } else {
            false
        }
    }

    /// Records the outcome of the job. Returns `false` if the job already finished.
    pub(crate) fn finish(&mut self, outcome: JobOutcome) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.state = JobState::Finished { completed_at: Utc::now(), outcome };
        true
    }

    /// The job identifier.
    pub fn id(&self) -> JobId {
        self.id
    }

    /// The current status.
    pub fn status(&self) -> JobStatus {
        match &self.state {
            JobState::Pending => JobStatus::Pending,
            JobState::Running => JobStatus::Running,
            JobState::Finished { outcome: JobOutcome::Completed(_), .. } => JobStatus::Completed,
            JobState::Finished { outcome: JobOutcome::Failed(_), .. } => JobStatus::Failed,
        }
    }

    /// Whether the job finished.
    pub fn is_terminal(&self) -> bool {
        matches!(self.state, JobState::Finished { .. })
    }

    /// When the job was submitted.
    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    /// When the job finished, if it did.
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        match &self.state {
            JobState::Finished { completed_at, .. } => Some(*completed_at),
            _ => None,
        }
    }

    /// The outcome, if the job finished.
    pub fn outcome(&self) -> Option<&JobOutcome> {
        match &self.state {
            JobState::Finished { outcome, .. } => Some(outcome),
            _ => None,
        }
    }

    /// The response of a completed job.
    pub fn response(&self) -> Option<&SimulationResponse> {
        match self.outcome()? {
            JobOutcome::Completed(response) => Some(&**response),
            JobOutcome::Failed(_) => None,
        }
    }

    /// The error of a failed job.
    pub fn error(&self) -> Option<&str> {
        match self.outcome()? {
            JobOutcome::Completed(_) => None,
            JobOutcome::Failed(error) => Some(error.as_str()),
        }
    }
}

impl Serialize for Job {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Job", 6)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("status", &self.status())?;
        state.serialize_field("submitted_at", &self.submitted_at)?;
        match self.completed_at() {
            Some(completed_at) => state.serialize_field("completed_at", &completed_at)?,
            None => state.skip_field("completed_at")?,
        }
        match self.response() {
            Some(response) => state.serialize_field("response", response)?,
            None => state.skip_field("response")?,
        }
        match self.error() {
            Some(error) => state.serialize_field("error", error)?,
            None => state.skip_field("error")?,
        }
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn job_ids_are_unique_hex() {
        let a = JobId::generate();
        let b = JobId::generate();
        assert_ne!(a, b);

        let rendered = a.to_string();
        assert_eq!(rendered.len(), 2 + 32);
        assert!(rendered.starts_with("0x"));
        assert_eq!(JobId::from_str(&rendered).unwrap(), a);
    }

    #[test]
    fn lifecycle_transitions() {
        let mut job = Job::new(JobId::generate());
        assert_eq!(job.status(), JobStatus::Pending);
        assert!(job.completed_at().is_none());

        assert!(job.start());
        assert!(!job.start());
        assert_eq!(job.status(), JobStatus::Running);
        assert!(job.response().is_none() && job.error().is_none());

        assert!(job.finish(JobOutcome::Failed("boom".into())));
        assert_eq!(job.status(), JobStatus::Failed);
        assert_eq!(job.error(), Some("boom"));
        assert!(job.response().is_none());
        let completed_at = job.completed_at().unwrap();
        assert!(completed_at >= job.submitted_at());

        // terminal states are final
        let response = Arc::new(SimulationResponse::success(Vec::new()));
        assert!(!job.finish(JobOutcome::Completed(response)));
        assert!(!job.start());
        assert_eq!(job.status(), JobStatus::Failed);
        assert_eq!(job.completed_at(), Some(completed_at));
    }

    #[test]
    fn serializes_flat_record() {
        let mut job = Job::new(JobId::generate());
        let pending = serde_json::to_value(&job).unwrap();
        assert_eq!(pending["status"], "pending");
        assert_eq!(pending["id"], job.id().to_string());
        assert!(pending.get("completed_at").is_none());
        assert!(pending.get("response").is_none());
        assert!(pending.get("error").is_none());

        job.start();
        job.finish(JobOutcome::Completed(Arc::new(SimulationResponse::success(vec![
            "event".into(),
        ]))));
        let completed = serde_json::to_value(&job).unwrap();
        assert_eq!(completed["status"], "completed");
        assert_eq!(completed["response"]["status"], "success");
        assert_eq!(completed["response"]["events"][0], "event");
        assert!(completed.get("completed_at").is_some());
        assert!(completed.get("error").is_none());
    }
}

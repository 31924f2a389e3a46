use super::{Job, JobId};
use parking_lot::RwLock;
use std::collections::HashMap;

/// In-memory job records keyed by [`JobId`].
///
/// Readers clone a snapshot under the read lock. Every update happens under the write lock, so a
/// half-written record is never observable.
#[derive(Debug, Default)]
pub(crate) struct JobStore {
    jobs: RwLock<HashMap<JobId, Job>>,
}

impl JobStore {
    /// Inserts a job, replacing any job with the same id.
    pub(crate) fn insert(&self, job: Job) {
        self.jobs.write().insert(job.id(), job);
    }

    /// Returns a snapshot of a job.
    pub(crate) fn get(&self, id: &JobId) -> Option<Job> {
        self.jobs.read().get(id).cloned()
    }

    /// Applies `f` to a job. Returns `None` if the job is not tracked.
    pub(crate) fn update<R>(&self, id: &JobId, f: impl FnOnce(&mut Job) -> R) -> Option<R> {
        self.jobs.write().get_mut(id).map(f)
    }

    /// Removes a job.
    pub(crate) fn remove(&self, id: &JobId) -> Option<Job> {
        self.jobs.write().remove(id)
    }

    /// Number of tracked jobs.
    pub(crate) fn len(&self) -> usize {
        self.jobs.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::{JobOutcome, JobStatus};

    #[test]
    fn update_only_touches_tracked_jobs() {
        let store = JobStore::default();
        let id = JobId::generate();
        assert_eq!(store.update(&id, Job::start), None);

        store.insert(Job::new(id));
        assert_eq!(store.len(), 1);
        assert_eq!(store.update(&id, Job::start), Some(true));
        assert_eq!(store.get(&id).unwrap().status(), JobStatus::Running);

        let removed = store.remove(&id).unwrap();
        assert_eq!(removed.id(), id);
        assert_eq!(store.update(&id, |job| job.finish(JobOutcome::Failed("late".into()))), None);
        assert!(store.get(&id).is_none());
        assert_eq!(store.len(), 0);
    }
}

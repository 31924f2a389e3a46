//! Asynchronous simulation jobs.

mod job;
pub use job::{Job, JobId, JobOutcome, JobStatus};

mod scheduler;
pub use scheduler::{JobScheduler, PollConfig};

mod store;

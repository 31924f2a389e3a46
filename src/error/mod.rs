//! Replay error types.

mod job;
pub use job::JobError;

mod simulation;
pub use simulation::SimulationError;

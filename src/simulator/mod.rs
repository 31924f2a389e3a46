//! Running simulations.
//!
//! A [`SimulationRunner`] turns a [`SimulationRequest`] into a [`SimulationResponse`]. The
//! [`ProcessRunner`] does so by spawning the external simulator, the [`MockRunner`] answers from a
//! closure and is meant for tests.

use crate::{
    error::SimulationError,
    types::{SimulationRequest, SimulationResponse},
};
use async_trait::async_trait;
use std::fmt::Debug;

mod capture;
pub use capture::{CapturedOutput, capture_bounded};

mod locate;
pub use locate::locate_simulator;

mod mock;
pub use mock::MockRunner;

mod process;
pub use process::ProcessRunner;

/// Something that can run a simulation.
#[async_trait]
pub trait SimulationRunner: Debug + Send + Sync {
    /// Runs the simulation described by `request`.
    async fn run(&self, request: &SimulationRequest) -> Result<SimulationResponse, SimulationError>;
}

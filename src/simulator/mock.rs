use super::SimulationRunner;
use crate::{
    error::SimulationError,
    types::{SimulationRequest, SimulationResponse},
};
use async_trait::async_trait;
use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

type Handler =
    dyn Fn(&SimulationRequest) -> Result<SimulationResponse, SimulationError> + Send + Sync;

type DelayFn = dyn Fn(&SimulationRequest) -> Duration + Send + Sync;

/// A [`SimulationRunner`] that answers from a closure. For testing only.
///
/// The default runner succeeds immediately with no events.
#[derive(Clone)]
pub struct MockRunner {
    handler: Arc<Handler>,
    delay: Option<Arc<DelayFn>>,
    calls: Arc<AtomicUsize>,
}

impl MockRunner {
    /// Creates a new [`MockRunner`] answering every request with `handler`.
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&SimulationRequest) -> Result<SimulationResponse, SimulationError>
            + Send
            + Sync
            + 'static,
    {
        Self { handler: Arc::new(handler), delay: None, calls: Default::default() }
    }

    /// Delays every answer by `delay`.
    pub fn with_delay(self, delay: Duration) -> Self {
        self.with_delay_fn(move |_| delay)
    }

    /// Delays each answer by a duration derived from the request.
    pub fn with_delay_fn<F>(mut self, delay: F) -> Self
    where
        F: Fn(&SimulationRequest) -> Duration + Send + Sync + 'static,
    {
        self.delay = Some(Arc::new(delay));
        self
    }

    /// Number of simulations started so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockRunner {
    fn default() -> Self {
        Self::new(|_| Ok(SimulationResponse::success(Vec::new())))
    }
}

impl fmt::Debug for MockRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockRunner")
            .field("delayed", &self.delay.is_some())
            .field("calls", &self.calls())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SimulationRunner for MockRunner {
    async fn run(&self, request: &SimulationRequest) -> Result<SimulationResponse, SimulationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = &self.delay {
            tokio::time::sleep(delay(request)).await;
        }
        (self.handler)(request)
    }
}

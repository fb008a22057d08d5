//! Simulated environment on turmoil's virtual clock.
//!
//! Inside a turmoil simulation tokio's timer is driven by the simulator, so
//! reading `tokio::time::Instant` gives deterministic virtual time.

use std::time::Duration;

use lcdproc_core::env::Environment;

/// Environment backed by the simulation clock.
#[derive(Clone, Default)]
pub struct SimEnv;

impl SimEnv {
    /// Create a new simulated environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SimEnv {
    type Instant = tokio::time::Instant;

    fn now(&self) -> Self::Instant {
        tokio::time::Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}

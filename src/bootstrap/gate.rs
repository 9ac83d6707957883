//! Bounded polling gate
//!
//! Neither task start-up nor gossip convergence pushes a notification, so
//! both are awaited by polling a fresh count until it reaches the expected
//! value or the attempt ceiling is hit.

use crate::common::{Error, Result};
use std::future::Future;
use std::time::Duration;

/// Result of a satisfied gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateOutcome {
    /// Probe evaluations, including the successful one
    pub attempts: u32,
    pub observed: usize,
}

#[derive(Debug, Clone)]
pub struct ReadinessGate {
    name: String,
    interval: Duration,
    max_attempts: u32,
}

impl ReadinessGate {
    pub fn new(name: impl Into<String>, interval: Duration, max_attempts: u32) -> Self {
        Self {
            name: name.into(),
            interval,
            max_attempts,
        }
    }

    /// Poll `probe` until it reports at least `expected`.
    ///
    /// The probe is evaluated at most `max_attempts` times with one sleep
    /// between consecutive evaluations. A probe error aborts the wait.
    pub async fn wait<F, Fut>(&self, expected: usize, mut probe: F) -> Result<GateOutcome>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<usize>>,
    {
        let mut observed = 0;

        for attempt in 1..=self.max_attempts {
            observed = probe().await?;
            tracing::debug!(
                gate = %self.name,
                attempt,
                observed,
                expected,
                "Readiness poll"
            );

            if observed >= expected {
                return Ok(GateOutcome {
                    attempts: attempt,
                    observed,
                });
            }

            if attempt < self.max_attempts {
                tokio::time::sleep(self.interval).await;
            }
        }

        tracing::error!(
            gate = %self.name,
            observed,
            expected,
            "Readiness gate exhausted"
        );
        Err(Error::Timeout {
            gate: self.name.clone(),
            observed,
            expected,
            attempts: self.max_attempts,
        })
    }
}

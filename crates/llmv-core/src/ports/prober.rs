//! Capability prober port.

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{ProbeAttempt, ProbeKind, Target};

/// Executes one typed probe attempt against one target.
///
/// Implementations must classify every failure into the outcome taxonomy
/// and must not mutate provider state beyond issuing the request. Retries,
/// caching and breaker bookkeeping are the orchestrator's concern.
#[async_trait]
pub trait CapabilityProber: Send + Sync {
    async fn probe(&self, target: &Target, kind: ProbeKind, timeout: Duration) -> ProbeAttempt;
}

//! Retry helper shared by every probe kind.
//!
//! The policy decides from the outcome class whether another attempt
//! follows and how long to wait. A [`RetryGate`] observes each attempt and can
//! veto further ones (the orchestrator plugs the provider breaker in here).
//! Backoff sleeps observe the run's cancellation token.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::domain::{ProbeAttempt, ProbeOutcome};
use crate::settings::VerifierConfig;

/// Backoff schedule and attempt budgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt for backoff-class outcomes.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Fixed wait before retrying `QuotaExceeded`.
    pub quota_cooldown: Duration,
    pub max_quota_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            quota_cooldown: Duration::from_secs(60),
            max_quota_retries: 1,
        }
    }
}

impl RetryPolicy {
    pub const fn from_config(config: &VerifierConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
            max_delay: Duration::from_millis(config.retry_max_delay_ms),
            quota_cooldown: Duration::from_secs(config.quota_cooldown_secs),
            max_quota_retries: config.max_quota_retries,
        }
    }

    /// Policy that never retries.
    pub const fn no_retries() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            quota_cooldown: Duration::ZERO,
            max_quota_retries: 0,
        }
    }

    /// Delay before retry number `retry` (1-based): `base * 2^(retry-1)`, capped.
    pub fn backoff(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(31);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }

    /// Wait before the next attempt, or `None` when the budget is spent or
    /// the outcome is not retryable.
    pub fn next_delay(
        &self,
        last: &ProbeAttempt,
        retries_used: u32,
        quota_retries_used: u32,
    ) -> Option<Duration> {
        match last.outcome {
            ProbeOutcome::QuotaExceeded => {
                (quota_retries_used < self.max_quota_retries).then_some(self.quota_cooldown)
            }
            ProbeOutcome::RateLimited | ProbeOutcome::TransientError | ProbeOutcome::Timeout => {
                if retries_used >= self.max_retries {
                    return None;
                }
                let backoff = self.backoff(retries_used + 1);
                match (last.outcome, last.retry_after) {
                    (ProbeOutcome::RateLimited, Some(hint)) => Some(hint.min(self.max_delay)),
                    _ => Some(backoff),
                }
            }
            _ => None,
        }
    }
}

/// Observer consulted between attempts.
#[async_trait]
pub trait RetryGate: Send {
    /// Called after every attempt, including the last.
    async fn observe(&mut self, attempt: &ProbeAttempt);

    /// Called before each retry; `Err(reason)` stops the sequence.
    async fn permit_retry(&mut self) -> Result<(), String>;
}

/// Gate that never vetoes.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenGate;

#[async_trait]
impl RetryGate for OpenGate {
    async fn observe(&mut self, _attempt: &ProbeAttempt) {}

    async fn permit_retry(&mut self) -> Result<(), String> {
        Ok(())
    }
}

/// Why a retry sequence ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryStop {
    /// Success or a terminal outcome.
    Completed,
    /// Retry budget ran out on a retryable outcome.
    Exhausted,
    /// Cancelled or vetoed by the gate.
    Halted(String),
}

/// Final attempt plus how the sequence ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryReport {
    pub last: ProbeAttempt,
    pub attempts: u32,
    pub stop: RetryStop,
}

impl RetryReport {
    /// Human-readable reason for the final record.
    pub fn reason(&self) -> Option<String> {
        let detail = self
            .last
            .detail
            .clone()
            .unwrap_or_else(|| self.last.outcome.to_string());
        match &self.stop {
            RetryStop::Completed => self.last.detail.clone(),
            RetryStop::Exhausted => Some(format!(
                "retries exhausted after {} attempts: {detail}",
                self.attempts
            )),
            RetryStop::Halted(why) => Some(format!("{why}; last outcome: {detail}")),
        }
    }
}

/// Run `attempt` until it succeeds, hits a terminal outcome, exhausts the
/// policy, or is halted by cancellation or the gate.
pub async fn run_with_retry<F, Fut, G>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    gate: &mut G,
    mut attempt: F,
) -> RetryReport
where
    F: FnMut(u32) -> Fut + Send,
    Fut: Future<Output = ProbeAttempt> + Send,
    G: RetryGate + ?Sized,
{
    let mut attempts = 0u32;
    let mut retries = 0u32;
    let mut quota_retries = 0u32;

    loop {
        attempts += 1;
        let last = attempt(attempts).await;
        gate.observe(&last).await;

        if !last.outcome.is_retryable() {
            return RetryReport {
                last,
                attempts,
                stop: RetryStop::Completed,
            };
        }

        let Some(delay) = policy.next_delay(&last, retries, quota_retries) else {
            return RetryReport {
                last,
                attempts,
                stop: RetryStop::Exhausted,
            };
        };
        if last.outcome == ProbeOutcome::QuotaExceeded {
            quota_retries += 1;
        } else {
            retries += 1;
        }

        debug!(
            outcome = %last.outcome,
            attempt = attempts,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "Retrying probe after backoff"
        );

        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                return RetryReport {
                    last,
                    attempts,
                    stop: RetryStop::Halted("run cancelled".to_string()),
                };
            }
            () = tokio::time::sleep(delay) => {}
        }

        if let Err(reason) = gate.permit_retry().await {
            return RetryReport {
                last,
                attempts,
                stop: RetryStop::Halted(reason),
            };
        }
    }
}

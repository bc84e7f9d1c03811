//! Per-provider circuit breakers.
//!
//! One state machine per provider, kept in a table. Each provider's state sits
//! behind its own async mutex, so updates for one provider are serialized
//! while different providers never contend.
//!
//! ```text
//!   Closed --(threshold consecutive failures)--> Open
//!   Open   --(cooldown elapsed)----------------> HalfOpen (one trial)
//!   HalfOpen --(trial success)-----------------> Closed
//!   HalfOpen --(trial failure)-----------------> Open (cooldown doubled, capped)
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info};

use crate::domain::ProbeOutcome;
use crate::ports::Clock;
use crate::settings::VerifierConfig;

/// Breaker tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerConfig {
    pub failure_threshold: u32,
    pub base_cooldown: Duration,
    pub max_cooldown: Duration,
}

impl BreakerConfig {
    pub const fn from_config(config: &VerifierConfig) -> Self {
        Self {
            failure_threshold: config.breaker_failure_threshold,
            base_cooldown: Duration::from_secs(config.breaker_base_cooldown_secs),
            max_cooldown: Duration::from_secs(config.breaker_max_cooldown_secs),
        }
    }
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            base_cooldown: Duration::from_secs(30),
            max_cooldown: Duration::from_secs(600),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakerPhase {
    Closed,
    Open,
    HalfOpen,
}

/// State of one provider's breaker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreakerState {
    pub phase: BreakerPhase,
    pub consecutive_failures: u32,
    pub opened_at: Option<DateTime<Utc>>,
    /// Cooldown that applies to the current (or next) open period.
    pub cooldown: Duration,
    /// Times the breaker opened since it last closed.
    pub trips: u32,
    #[serde(skip)]
    trial_in_flight: bool,
}

impl BreakerState {
    const fn closed(base_cooldown: Duration) -> Self {
        Self {
            phase: BreakerPhase::Closed,
            consecutive_failures: 0,
            opened_at: None,
            cooldown: base_cooldown,
            trips: 0,
            trial_in_flight: false,
        }
    }
}

/// Decision for one probe against a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Breaker closed; normal probe.
    Allowed,
    /// Breaker half-open; this probe is the single trial.
    Trial,
    /// Breaker open; do not touch the network.
    Rejected { retry_in: Duration },
}

impl Admission {
    pub const fn is_rejected(self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

/// Table of per-provider breakers.
pub struct BreakerTable {
    config: BreakerConfig,
    clock: Arc<dyn Clock>,
    providers: Mutex<HashMap<String, Arc<AsyncMutex<BreakerState>>>>,
}

impl BreakerTable {
    pub fn new(config: BreakerConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            providers: Mutex::new(HashMap::new()),
        }
    }

    pub const fn config(&self) -> &BreakerConfig {
        &self.config
    }

    fn slot(&self, provider_id: &str) -> Arc<AsyncMutex<BreakerState>> {
        let mut providers = self
            .providers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        providers
            .entry(provider_id.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(BreakerState::closed(self.config.base_cooldown))))
            .clone()
    }

    /// Decide whether a probe against `provider_id` may touch the network.
    pub async fn admit(&self, provider_id: &str) -> Admission {
        let slot = self.slot(provider_id);
        let mut state = slot.lock().await;
        match state.phase {
            BreakerPhase::Closed => Admission::Allowed,
            BreakerPhase::Open => {
                let elapsed = state
                    .opened_at
                    .and_then(|opened| (self.clock.now() - opened).to_std().ok())
                    .unwrap_or(Duration::ZERO);
                if elapsed >= state.cooldown {
                    state.phase = BreakerPhase::HalfOpen;
                    state.trial_in_flight = true;
                    debug!(provider = %provider_id, "Breaker half-open, admitting trial probe");
                    Admission::Trial
                } else {
                    Admission::Rejected {
                        retry_in: state.cooldown - elapsed,
                    }
                }
            }
            BreakerPhase::HalfOpen => {
                if state.trial_in_flight {
                    Admission::Rejected {
                        retry_in: Duration::ZERO,
                    }
                } else {
                    state.trial_in_flight = true;
                    Admission::Trial
                }
            }
        }
    }

    /// Record the outcome of a probe admitted by [`admit`](Self::admit).
    pub async fn record(&self, provider_id: &str, admission: Admission, outcome: ProbeOutcome) {
        if admission.is_rejected() {
            return;
        }
        let slot = self.slot(provider_id);
        let mut state = slot.lock().await;

        if admission == Admission::Trial {
            state.trial_in_flight = false;
            if state.phase != BreakerPhase::HalfOpen {
                return;
            }
            if outcome.is_success() {
                *state = BreakerState::closed(self.config.base_cooldown);
                info!(provider = %provider_id, "Breaker closed after successful trial");
            } else if outcome.counts_toward_breaker() {
                let doubled = state.cooldown.saturating_mul(2).min(self.config.max_cooldown);
                state.cooldown = doubled;
                state.phase = BreakerPhase::Open;
                state.opened_at = Some(self.clock.now());
                state.trips = state.trips.saturating_add(1);
                info!(
                    provider = %provider_id,
                    outcome = %outcome,
                    cooldown_secs = doubled.as_secs(),
                    "Breaker reopened after failed trial"
                );
            }
            return;
        }

        // Results from probes dispatched before the breaker tripped
        if state.phase != BreakerPhase::Closed {
            return;
        }

        if outcome.is_success() {
            state.consecutive_failures = 0;
        } else if outcome.counts_toward_breaker() {
            state.consecutive_failures = state.consecutive_failures.saturating_add(1);
            if state.consecutive_failures >= self.config.failure_threshold {
                state.phase = BreakerPhase::Open;
                state.opened_at = Some(self.clock.now());
                state.trips = state.trips.saturating_add(1);
                info!(
                    provider = %provider_id,
                    failures = state.consecutive_failures,
                    cooldown_secs = state.cooldown.as_secs(),
                    "Breaker opened"
                );
            }
        }
    }

    /// Current state of one provider's breaker.
    pub async fn state(&self, provider_id: &str) -> BreakerState {
        self.slot(provider_id).lock().await.clone()
    }

    /// States of every provider seen so far, sorted by provider id.
    pub async fn snapshot(&self) -> Vec<(String, BreakerState)> {
        let slots: Vec<(String, Arc<AsyncMutex<BreakerState>>)> = {
            let providers = self
                .providers
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            providers
                .iter()
                .map(|(id, slot)| (id.clone(), Arc::clone(slot)))
                .collect()
        };

        let mut states = Vec::with_capacity(slots.len());
        for (id, slot) in slots {
            states.push((id, slot.lock().await.clone()));
        }
        states.sort_by(|a, b| a.0.cmp(&b.0));
        states
    }

    /// Operator reset of one provider.
    pub async fn reset(&self, provider_id: &str) {
        *self.slot(provider_id).lock().await = BreakerState::closed(self.config.base_cooldown);
    }

    /// Operator reset of every provider.
    pub fn reset_all(&self) {
        self.providers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

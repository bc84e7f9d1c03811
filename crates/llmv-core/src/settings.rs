//! Verifier configuration and validation.
//!
//! The configuration surface consumed by the orchestrator and the scorer.
//! These are pure domain types; loading them from disk is the caller's job.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::{ProbeKind, WeightVector};

/// Default number of concurrent probe workers.
pub const DEFAULT_CONCURRENCY: usize = 16;

/// Default per-probe timeout in milliseconds.
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 10_000;

/// Default result cache TTL (24 hours).
pub const DEFAULT_CACHE_TTL_SECS: u64 = 86_400;

/// Verifier configuration.
///
/// Every field has a default, so a partial JSON document is a valid config.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VerifierConfig {
    /// Worker count for the probe pool.
    pub concurrency: usize,

    /// Upper bound for a single probe attempt.
    pub probe_timeout_ms: u64,

    /// Wall-clock budget for a whole run; `None` disables the deadline.
    pub global_deadline_secs: Option<u64>,

    /// How long probe results are served from cache.
    pub cache_ttl_secs: u64,

    /// Consecutive provider-wide failures that open a breaker.
    pub breaker_failure_threshold: u32,

    /// First cooldown after a breaker opens.
    pub breaker_base_cooldown_secs: u64,

    /// Cap for the doubling cooldown on repeated trips.
    pub breaker_max_cooldown_secs: u64,

    /// Retries after the first attempt for retryable outcomes.
    pub max_retries: u32,

    /// First backoff step; doubles per retry.
    pub retry_base_delay_ms: u64,

    /// Cap for any single backoff, including `Retry-After` hints.
    pub retry_max_delay_ms: u64,

    /// Wait before retrying a `QuotaExceeded` outcome.
    pub quota_cooldown_secs: u64,

    /// Retries allowed for `QuotaExceeded`.
    pub max_quota_retries: u32,

    /// Probe kinds dispatched per target.
    pub probe_kinds: Vec<ProbeKind>,

    /// Scoring weights; must sum to 1.0.
    pub weights: WeightVector,
}

impl VerifierConfig {
    /// Create a configuration with sensible defaults.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            probe_timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
            global_deadline_secs: Some(900),
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            breaker_failure_threshold: 5,
            breaker_base_cooldown_secs: 30,
            breaker_max_cooldown_secs: 600,
            max_retries: 3,
            retry_base_delay_ms: 500,
            retry_max_delay_ms: 30_000,
            quota_cooldown_secs: 60,
            max_quota_retries: 1,
            probe_kinds: ProbeKind::ALL.to_vec(),
            weights: WeightVector::DEFAULT,
        }
    }

    /// Parse a configuration from JSON. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply partial overrides.
    pub fn merge(&mut self, overrides: &ConfigOverrides) {
        if let Some(concurrency) = overrides.concurrency {
            self.concurrency = concurrency;
        }
        if let Some(timeout) = overrides.probe_timeout_ms {
            self.probe_timeout_ms = timeout;
        }
        if let Some(deadline) = overrides.global_deadline_secs {
            self.global_deadline_secs = deadline;
        }
        if let Some(ttl) = overrides.cache_ttl_secs {
            self.cache_ttl_secs = ttl;
        }
    }

    pub const fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn global_deadline(&self) -> Option<Duration> {
        self.global_deadline_secs.map(Duration::from_secs)
    }

    pub const fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Partial configuration update, e.g. from command-line flags.
///
/// `None` leaves a field unchanged. `global_deadline_secs: Some(None)`
/// removes the deadline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub concurrency: Option<usize>,
    pub probe_timeout_ms: Option<u64>,
    pub global_deadline_secs: Option<Option<u64>>,
    pub cache_ttl_secs: Option<u64>,
}

/// Configuration validation error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Concurrency must be at least 1")]
    ZeroConcurrency,

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("Breaker failure threshold must be at least 1")]
    ZeroBreakerThreshold,

    #[error("Breaker max cooldown ({max}s) is shorter than the base cooldown ({base}s)")]
    CooldownCap { base: u64, max: u64 },

    #[error("At least one probe kind must be configured")]
    NoProbeKinds,

    #[error("Weight for {component} must be a non-negative finite number, got {weight}")]
    InvalidWeight {
        component: &'static str,
        weight: f64,
    },

    #[error("Weights must sum to 1.0 (within 1e-6), got {sum}")]
    WeightSum { sum: f64 },

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Validate configuration values.
pub fn validate_config(config: &VerifierConfig) -> Result<(), ConfigError> {
    if config.concurrency == 0 {
        return Err(ConfigError::ZeroConcurrency);
    }

    for (name, value) in [
        ("probe_timeout_ms", config.probe_timeout_ms),
        ("cache_ttl_secs", config.cache_ttl_secs),
        ("breaker_base_cooldown_secs", config.breaker_base_cooldown_secs),
        ("retry_base_delay_ms", config.retry_base_delay_ms),
    ] {
        if value == 0 {
            return Err(ConfigError::ZeroDuration(name));
        }
    }

    if config.global_deadline_secs == Some(0) {
        return Err(ConfigError::ZeroDuration("global_deadline_secs"));
    }

    if config.breaker_failure_threshold == 0 {
        return Err(ConfigError::ZeroBreakerThreshold);
    }

    if config.breaker_max_cooldown_secs < config.breaker_base_cooldown_secs {
        return Err(ConfigError::CooldownCap {
            base: config.breaker_base_cooldown_secs,
            max: config.breaker_max_cooldown_secs,
        });
    }

    if config.probe_kinds.is_empty() {
        return Err(ConfigError::NoProbeKinds);
    }

    config.weights.validate()
}

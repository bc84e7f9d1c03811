//! Probe kinds, the outcome taxonomy, and immutable probe records.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::features::AdvertisedFeatures;
use super::target::TargetKey;

/// A typed network check against one target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeKind {
    Existence,
    Responsiveness,
    Streaming,
    FunctionCalling,
    Vision,
    Embeddings,
    CompressionSupport,
}

impl ProbeKind {
    pub const ALL: [Self; 7] = [
        Self::Existence,
        Self::Responsiveness,
        Self::Streaming,
        Self::FunctionCalling,
        Self::Vision,
        Self::Embeddings,
        Self::CompressionSupport,
    ];

    /// Kinds that count toward the capability score.
    pub const CAPABILITIES: [Self; 4] = [
        Self::Streaming,
        Self::FunctionCalling,
        Self::Vision,
        Self::Embeddings,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Existence => "existence",
            Self::Responsiveness => "responsiveness",
            Self::Streaming => "streaming",
            Self::FunctionCalling => "function_calling",
            Self::Vision => "vision",
            Self::Embeddings => "embeddings",
            Self::CompressionSupport => "compression_support",
        }
    }

    pub const fn is_capability(self) -> bool {
        matches!(
            self,
            Self::Streaming | Self::FunctionCalling | Self::Vision | Self::Embeddings
        )
    }

    /// The registry flag that claims support for this kind, if any.
    pub const fn advertised_flag(self) -> Option<AdvertisedFeatures> {
        match self {
            Self::Streaming => Some(AdvertisedFeatures::STREAMING),
            Self::FunctionCalling => Some(AdvertisedFeatures::FUNCTION_CALLING),
            Self::Vision => Some(AdvertisedFeatures::VISION),
            Self::Embeddings => Some(AdvertisedFeatures::EMBEDDINGS),
            Self::CompressionSupport => Some(AdvertisedFeatures::COMPRESSION),
            Self::Existence | Self::Responsiveness => None,
        }
    }
}

impl fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown kind or outcome name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {what} '{value}'")]
pub struct ParseNameError {
    what: &'static str,
    value: String,
}

impl FromStr for ProbeKind {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ParseNameError {
                what: "probe kind",
                value: s.to_string(),
            })
    }
}

/// Normalized classification of a probe. Every probe maps to exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeOutcome {
    Success,
    /// Terminal, never retried.
    AuthFailure,
    /// Terminal, never retried. The model or capability is not served.
    NotFound,
    RateLimited,
    QuotaExceeded,
    TransientError,
    Timeout,
    /// Rejected locally by the provider's circuit breaker.
    BreakerOpen,
    /// Terminal, never attempted.
    MissingCredential,
}

impl ProbeOutcome {
    pub const ALL: [Self; 9] = [
        Self::Success,
        Self::AuthFailure,
        Self::NotFound,
        Self::RateLimited,
        Self::QuotaExceeded,
        Self::TransientError,
        Self::Timeout,
        Self::BreakerOpen,
        Self::MissingCredential,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::AuthFailure => "auth_failure",
            Self::NotFound => "not_found",
            Self::RateLimited => "rate_limited",
            Self::QuotaExceeded => "quota_exceeded",
            Self::TransientError => "transient_error",
            Self::Timeout => "timeout",
            Self::BreakerOpen => "breaker_open",
            Self::MissingCredential => "missing_credential",
        }
    }

    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }

    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::AuthFailure | Self::NotFound | Self::MissingCredential
        )
    }

    pub const fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::QuotaExceeded | Self::TransientError | Self::Timeout
        )
    }

    /// Failures that indicate a provider-wide problem.
    pub const fn counts_toward_breaker(self) -> bool {
        matches!(self, Self::TransientError | Self::Timeout | Self::RateLimited)
    }

    /// Whether a request actually reached the network.
    pub const fn was_attempted(self) -> bool {
        !matches!(self, Self::BreakerOpen | Self::MissingCredential)
    }

    /// Outcomes stable enough to serve from cache for a full TTL.
    pub const fn is_cacheable(self) -> bool {
        matches!(self, Self::Success | Self::AuthFailure | Self::NotFound)
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProbeOutcome {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|outcome| outcome.as_str() == s)
            .ok_or_else(|| ParseNameError {
                what: "probe outcome",
                value: s.to_string(),
            })
    }
}

/// Cache identity: (provider id, model id, probe kind).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey {
    pub provider_id: String,
    pub model_id: String,
    pub kind: ProbeKind,
}

impl CacheKey {
    pub fn new(target: &TargetKey, kind: ProbeKind) -> Self {
        Self {
            provider_id: target.provider_id.clone(),
            model_id: target.model_id.clone(),
            kind,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}#{}", self.provider_id, self.model_id, self.kind)
    }
}

/// What a prober observed for a single network attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeAttempt {
    pub outcome: ProbeOutcome,
    /// Dispatch to full response consumption.
    pub latency: Duration,
    /// Dispatch to first body chunk, streaming probes only.
    pub time_to_first_chunk: Option<Duration>,
    /// Server-provided backoff hint.
    pub retry_after: Option<Duration>,
    pub detail: Option<String>,
}

impl ProbeAttempt {
    pub const fn new(outcome: ProbeOutcome, latency: Duration) -> Self {
        Self {
            outcome,
            latency,
            time_to_first_chunk: None,
            retry_after: None,
            detail: None,
        }
    }

    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    #[must_use]
    pub const fn with_time_to_first_chunk(mut self, ttfc: Duration) -> Self {
        self.time_to_first_chunk = Some(ttfc);
        self
    }

    #[must_use]
    pub const fn with_retry_after(mut self, retry_after: Duration) -> Self {
        self.retry_after = Some(retry_after);
        self
    }
}

/// Immutable record of one probe of one kind against one target.
///
/// A later probe of the same kind produces a new record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub target: TargetKey,
    pub kind: ProbeKind,
    pub outcome: ProbeOutcome,
    pub latency_ms: u64,
    pub time_to_first_chunk_ms: Option<u64>,
    /// Network attempts made, zero when the probe was never dispatched.
    pub attempts: u32,
    /// Set when the retry budget ran out on a retryable outcome.
    pub retries_exhausted: bool,
    pub reason: Option<String>,
    pub recorded_at: DateTime<Utc>,
    #[serde(default)]
    pub from_cache: bool,
}

impl ProbeResult {
    /// Build the record for the final attempt of a probe.
    pub fn from_attempt(
        target: TargetKey,
        kind: ProbeKind,
        attempt: &ProbeAttempt,
        attempts: u32,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            target,
            kind,
            outcome: attempt.outcome,
            latency_ms: duration_to_ms(attempt.latency),
            time_to_first_chunk_ms: attempt.time_to_first_chunk.map(duration_to_ms),
            attempts,
            retries_exhausted: false,
            reason: attempt.detail.clone(),
            recorded_at,
            from_cache: false,
        }
    }

    /// Record for a probe that was rejected before any network call.
    pub fn not_attempted(
        target: TargetKey,
        kind: ProbeKind,
        outcome: ProbeOutcome,
        reason: impl Into<String>,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            target,
            kind,
            outcome,
            latency_ms: 0,
            time_to_first_chunk_ms: None,
            attempts: 0,
            retries_exhausted: false,
            reason: Some(reason.into()),
            recorded_at,
            from_cache: false,
        }
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey::new(&self.target, self.kind)
    }

    /// A `Failed` record: retries ran out and `outcome` is the last one seen.
    pub const fn is_failed(&self) -> bool {
        self.retries_exhausted
    }
}

/// Milliseconds, saturating at `u64::MAX`.
pub fn duration_to_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

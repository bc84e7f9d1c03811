//! Mapping of HTTP statuses and transport failures onto probe outcomes.

use std::time::Duration;

use llmv_core::ProbeOutcome;

use crate::error::ProbeHttpError;

/// Body substrings that turn a 429 into a quota failure.
const QUOTA_MARKERS: [&str; 3] = ["insufficient_quota", "quota", "billing"];

/// Classify a non-2xx status.
pub fn classify_status(status: u16, body: &str) -> ProbeOutcome {
    match status {
        401 | 403 => ProbeOutcome::AuthFailure,
        402 => ProbeOutcome::QuotaExceeded,
        429 if mentions_quota(body) => ProbeOutcome::QuotaExceeded,
        429 => ProbeOutcome::RateLimited,
        408 | 504 => ProbeOutcome::Timeout,
        400..=499 => ProbeOutcome::NotFound,
        _ => ProbeOutcome::TransientError,
    }
}

fn mentions_quota(body: &str) -> bool {
    let lower = body.to_ascii_lowercase();
    QUOTA_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Parse a `Retry-After` header given in seconds.
///
/// HTTP-date values are ignored; the retry policy's own backoff applies then.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    let secs: f64 = value.trim().parse().ok()?;
    if secs.is_finite() && secs >= 0.0 {
        Some(Duration::from_secs_f64(secs.min(86_400.0)))
    } else {
        None
    }
}

pub const fn classify_transport(error: &ProbeHttpError) -> ProbeOutcome {
    match error {
        ProbeHttpError::Timeout(_) => ProbeOutcome::Timeout,
        ProbeHttpError::InvalidUrl(_) => ProbeOutcome::NotFound,
        ProbeHttpError::Connect(_) | ProbeHttpError::Body(_) | ProbeHttpError::Client(_) => {
            ProbeOutcome::TransientError
        }
    }
}

//! [`CapabilityProber`] implementation over HTTP.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use llmv_core::{AuthStyle, CapabilityProber, CredentialResolver, ProbeAttempt, ProbeKind, ProbeOutcome, Secret, Target};
use tracing::debug;
use url::Url;

use crate::classify::{classify_status, classify_transport, parse_retry_after};
use crate::config::ProberConfig;
use crate::error::{ProbeHttpError, ProbeHttpResult};
use crate::http::{HttpBackend, HttpRequest, HttpResponse, ReqwestBackend};
use crate::wire::{ShapeVerdict, check_response, wire_request};

/// Longest body excerpt kept in a failure detail.
const DETAIL_BODY_CHARS: usize = 200;

/// Probes OpenAI-compatible providers over HTTP.
///
/// Never retries on its own; each call is exactly one request.
pub struct HttpProber<B = ReqwestBackend> {
    backend: B,
    credentials: Arc<dyn CredentialResolver>,
    config: ProberConfig,
}

impl HttpProber<ReqwestBackend> {
    /// Create a prober backed by reqwest.
    pub fn new(config: ProberConfig, credentials: Arc<dyn CredentialResolver>) -> ProbeHttpResult<Self> {
        let backend = ReqwestBackend::new(&config)?;
        Ok(Self::with_backend(backend, config, credentials))
    }
}

impl<B: HttpBackend> HttpProber<B> {
    pub fn with_backend(backend: B, config: ProberConfig, credentials: Arc<dyn CredentialResolver>) -> Self {
        Self {
            backend,
            credentials,
            config,
        }
    }

    fn build_request(
        &self,
        target: &Target,
        kind: ProbeKind,
        secret: &Secret,
        timeout: Duration,
    ) -> ProbeHttpResult<HttpRequest> {
        let wire = wire_request(kind, target.model_id(), &self.config.prompt);
        let url = endpoint_url(&target.base_url, wire.path)?;

        let mut headers: Vec<(String, String)> = wire
            .headers
            .iter()
            .map(|(name, value)| ((*name).to_string(), (*value).to_string()))
            .collect();
        headers.push(match &target.auth_style {
            AuthStyle::Bearer => (
                "authorization".to_string(),
                format!("Bearer {}", secret.expose()),
            ),
            AuthStyle::Header { name } => (name.clone(), secret.expose().to_string()),
        });

        Ok(HttpRequest {
            method: wire.method,
            url,
            headers,
            body: wire.body,
            timeout,
        })
    }
}

/// Join an endpoint path onto a provider base URL, keeping any path prefix such as `/v1`.
fn endpoint_url(base_url: &str, path: &str) -> Result<Url, ProbeHttpError> {
    let mut base = base_url.trim().trim_end_matches('/').to_string();
    base.push('/');
    Ok(Url::parse(&base)?.join(path)?)
}

fn body_excerpt(body: &str) -> String {
    let trimmed = body.trim();
    let mut excerpt: String = trimmed.chars().take(DETAIL_BODY_CHARS).collect();
    if trimmed.chars().count() > DETAIL_BODY_CHARS {
        excerpt.push_str("...");
    }
    excerpt
}

fn interpret(kind: ProbeKind, model_id: &str, response: &HttpResponse, latency: Duration) -> ProbeAttempt {
    if response.is_success() {
        return match check_response(kind, model_id, response) {
            ShapeVerdict::Supported => {
                let attempt = ProbeAttempt::new(ProbeOutcome::Success, latency);
                match response.time_to_first_chunk {
                    Some(ttfc) if kind == ProbeKind::Streaming => attempt.with_time_to_first_chunk(ttfc),
                    _ => attempt,
                }
            }
            ShapeVerdict::Unsupported(why) => ProbeAttempt::new(ProbeOutcome::NotFound, latency).with_detail(why),
            ShapeVerdict::Malformed(why) => {
                ProbeAttempt::new(ProbeOutcome::TransientError, latency).with_detail(why)
            }
        };
    }

    let outcome = classify_status(response.status, &response.body);
    let attempt = ProbeAttempt::new(outcome, latency).with_detail(format!(
        "HTTP {}: {}",
        response.status,
        body_excerpt(&response.body)
    ));
    match response.header("retry-after").and_then(parse_retry_after) {
        Some(wait) if outcome == ProbeOutcome::RateLimited => attempt.with_retry_after(wait),
        _ => attempt,
    }
}

#[async_trait]
impl<B: HttpBackend> CapabilityProber for HttpProber<B> {
    async fn probe(&self, target: &Target, kind: ProbeKind, timeout: Duration) -> ProbeAttempt {
        let started = Instant::now();

        let Some(secret) = self.credentials.resolve(&target.credential) else {
            debug!(target_key = %target.key, credential = %target.credential, "Credential did not resolve");
            return ProbeAttempt::new(ProbeOutcome::MissingCredential, Duration::ZERO)
                .with_detail(format!("credential '{}' did not resolve", target.credential));
        };

        let request = match self.build_request(target, kind, &secret, timeout) {
            Ok(request) => request,
            Err(e) => {
                return ProbeAttempt::new(classify_transport(&e), started.elapsed())
                    .with_detail(e.to_string());
            }
        };

        let attempt = match self.backend.send(request).await {
            Ok(response) => interpret(kind, target.model_id(), &response, started.elapsed()),
            Err(e) => ProbeAttempt::new(classify_transport(&e), started.elapsed()).with_detail(e.to_string()),
        };

        debug!(
            target_key = %target.key,
            %kind,
            outcome = %attempt.outcome,
            latency_ms = u64::try_from(attempt.latency.as_millis()).unwrap_or(u64::MAX),
            "Probe attempt complete"
        );
        attempt
    }
}

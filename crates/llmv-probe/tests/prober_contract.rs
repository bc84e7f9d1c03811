//! Contract tests for the public prober API with a caller-supplied backend.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use llmv_core::{
    AuthStyle, CapabilityProber, CredentialRef, ModelMetadata, ProbeKind, ProbeOutcome, Target,
    TargetKey,
};
use llmv_probe::{
    EnvCredentialResolver, HttpBackend, HttpMethod, HttpProber, HttpRequest, HttpResponse,
    ProbeHttpResult, ProberConfig,
};

/// Answers every request with one status and body, remembering what was sent.
struct StaticBackend {
    status: u16,
    body: String,
    seen: Arc<Mutex<Vec<HttpRequest>>>,
}

impl StaticBackend {
    fn new(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            seen: Arc::default(),
        }
    }
}

#[async_trait]
impl HttpBackend for StaticBackend {
    async fn send(&self, request: HttpRequest) -> ProbeHttpResult<HttpResponse> {
        self.seen.lock().unwrap().push(request);
        Ok(HttpResponse {
            status: self.status,
            headers: Vec::new(),
            body: self.body.clone(),
            time_to_first_chunk: None,
        })
    }
}

fn target() -> Target {
    Target {
        key: TargetKey::new("delta", "d1"),
        base_url: "https://delta.test/openai/v1".to_string(),
        credential: CredentialRef::new("sk-inline"),
        auth_style: AuthStyle::Bearer,
        metadata: ModelMetadata::default(),
    }
}

fn prober(backend: StaticBackend) -> HttpProber<StaticBackend> {
    HttpProber::with_backend(
        backend,
        ProberConfig::new().with_prompt("hello"),
        Arc::new(EnvCredentialResolver::with_lookup(|_| None)),
    )
}

#[tokio::test]
async fn each_kind_hits_its_endpoint_once() {
    let expected = [
        (ProbeKind::Existence, HttpMethod::Get, "/openai/v1/models"),
        (ProbeKind::Responsiveness, HttpMethod::Post, "/openai/v1/chat/completions"),
        (ProbeKind::Embeddings, HttpMethod::Post, "/openai/v1/embeddings"),
    ];

    for (kind, method, path) in expected {
        let backend = StaticBackend::new(503, "overloaded");
        let seen = Arc::clone(&backend.seen);
        let outcome = prober(backend)
            .probe(&target(), kind, Duration::from_secs(2))
            .await
            .outcome;

        assert_eq!(outcome, ProbeOutcome::TransientError);
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1, "{kind} must send exactly one request");
        assert_eq!(seen[0].method, method);
        assert_eq!(seen[0].url.path(), path);
    }
}

#[tokio::test]
async fn unlisted_model_is_not_found() {
    let backend = StaticBackend::new(200, r#"{"data":[{"id":"other"}]}"#);
    let attempt = prober(backend)
        .probe(&target(), ProbeKind::Existence, Duration::from_secs(2))
        .await;
    assert_eq!(attempt.outcome, ProbeOutcome::NotFound);
}

#[tokio::test]
async fn literal_credentials_are_sent_as_bearer() {
    let backend = StaticBackend::new(200, r#"{"choices":[{"message":{"content":"hi"}}]}"#);
    let seen = Arc::clone(&backend.seen);
    let attempt = prober(backend)
        .probe(&target(), ProbeKind::Responsiveness, Duration::from_secs(2))
        .await;

    assert_eq!(attempt.outcome, ProbeOutcome::Success);
    let seen = seen.lock().unwrap();
    let body = seen[0].body.as_ref().unwrap();
    assert_eq!(body["messages"][0]["content"], "hello");
    assert!(
        seen[0]
            .headers
            .iter()
            .any(|(name, value)| name == "authorization" && value == "Bearer sk-inline")
    );
}

//! HTTP backend abstraction for probe requests.
//!
//! The prober builds a plain [`HttpRequest`] and hands it to an
//! [`HttpBackend`]. The production backend uses reqwest and records when the
//! first body chunk arrives; tests substitute a fake with canned replies.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures_util::StreamExt;
use url::Url;

use crate::config::ProberConfig;
use crate::error::ProbeHttpResult;

// ============================================================================
// Request / Response
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// One outgoing probe request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    /// JSON body; sent with `Content-Type: application/json`.
    pub body: Option<serde_json::Value>,
    /// Whole-request deadline, including reading the body.
    pub timeout: Duration,
}

/// Status, headers and (possibly truncated) body of a response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// Header names are lowercase.
    pub headers: Vec<(String, String)>,
    pub body: String,
    /// Time from sending the request until the first non-empty body chunk.
    pub time_to_first_chunk: Option<Duration>,
}

impl HttpResponse {
    /// First value of a header, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

// ============================================================================
// HTTP Backend Trait
// ============================================================================

/// Sends probe requests.
///
/// Implementations return `Err` only for transport failures; every HTTP
/// status, including 4xx and 5xx, is an `Ok` response.
#[async_trait]
pub trait HttpBackend: Send + Sync {
    async fn send(&self, request: HttpRequest) -> ProbeHttpResult<HttpResponse>;
}

// ============================================================================
// Reqwest Backend
// ============================================================================

/// Production HTTP backend using reqwest.
///
/// Unlike a general-purpose client it never retries: retry policy belongs to
/// the orchestrator, which needs to see every attempt.
pub struct ReqwestBackend {
    client: reqwest::Client,
    max_body_bytes: usize,
}

impl ReqwestBackend {
    pub fn new(config: &ProberConfig) -> ProbeHttpResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self {
            client,
            max_body_bytes: config.max_body_bytes,
        })
    }

    fn build_request(&self, request: &HttpRequest) -> reqwest::RequestBuilder {
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(request.url.as_str()),
            HttpMethod::Post => self.client.post(request.url.as_str()),
        };
        builder = builder.timeout(request.timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }
        builder
    }
}

#[async_trait]
impl HttpBackend for ReqwestBackend {
    async fn send(&self, request: HttpRequest) -> ProbeHttpResult<HttpResponse> {
        let started = Instant::now();
        let response = self.build_request(&request).send().await?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();

        let mut body = Vec::new();
        let mut time_to_first_chunk = None;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            if chunk.is_empty() {
                continue;
            }
            if time_to_first_chunk.is_none() {
                time_to_first_chunk = Some(started.elapsed());
            }
            let room = self.max_body_bytes.saturating_sub(body.len());
            body.extend_from_slice(&chunk[..chunk.len().min(room)]);
            if body.len() >= self.max_body_bytes {
                break;
            }
        }

        Ok(HttpResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&body).into_owned(),
            time_to_first_chunk,
        })
    }
}

// ============================================================================
// Fake Backend for Testing
// ============================================================================


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let response = HttpResponse {
            status: 200,
            headers: vec![("content-encoding".to_string(), "br".to_string())],
            ..HttpResponse::default()
        };
        assert_eq!(response.header("Content-Encoding"), Some("br"));
        assert_eq!(response.header("retry-after"), None);
        assert!(response.is_success());
    }

    #[test]
    fn test_reqwest_backend_creation() {
        let config = ProberConfig::new().with_max_body_bytes(4096);
        let backend = ReqwestBackend::new(&config).unwrap();
        assert_eq!(backend.max_body_bytes, 4096);
    }

    mod fake_backend_tests {
        use super::super::testing::*;
        use super::*;
        use serde_json::json;

        fn request(url: &str, body: Option<serde_json::Value>) -> HttpRequest {
            HttpRequest {
                method: HttpMethod::Post,
                url: Url::parse(url).unwrap(),
                headers: Vec::new(),
                body,
                timeout: Duration::from_secs(1),
            }
        }

        #[tokio::test]
        async fn test_fake_backend_matches_body_routes_first() {
            let backend = FakeBackend::new()
                .with_body_route("chat", "tools", Canned::json(200, json!({"kind": "tools"})))
                .with_route("chat", Canned::json(200, json!({"kind": "plain"})));

            let tools = backend
                .send(request("https://x.test/chat", Some(json!({"tools": []}))))
                .await
                .unwrap();
            let plain = backend
                .send(request("https://x.test/chat", Some(json!({"messages": []}))))
                .await
                .unwrap();

            assert!(tools.body.contains("\"tools\""));
            assert!(plain.body.contains("\"plain\""));
            assert_eq!(backend.requests().len(), 2);
        }

        #[tokio::test]
        async fn test_fake_backend_returns_404_for_unknown_url() {
            let backend = FakeBackend::new();
            let response = backend.send(request("https://x.test/unknown", None)).await.unwrap();
            assert_eq!(response.status, 404);
        }
    }
}

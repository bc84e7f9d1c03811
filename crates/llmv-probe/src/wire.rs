//! Request shapes and success checks for each probe kind.
//!
//! All endpoints follow the OpenAI-compatible API surface.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use llmv_core::ProbeKind;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::http::{HttpMethod, HttpResponse};

/// 1x1 RGBA PNG sent by the vision probe.
const PROBE_PNG: [u8; 70] = [
    0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1f, 0x15, 0xc4,
    0x89, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x44, 0x41, 0x54, 0x78, 0xda, 0x63, 0x64, 0x60, 0xf8, 0x5f,
    0x0f, 0x00, 0x02, 0x87, 0x01, 0x80, 0xeb, 0x47, 0xba, 0x92, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45,
    0x4e, 0x44, 0xae, 0x42, 0x60, 0x82,
];

const TOOL_NAME: &str = "get_current_weather";

/// Where and how a probe kind is sent.
#[derive(Debug, Clone, PartialEq)]
pub struct WireRequest {
    pub method: HttpMethod,
    /// Path relative to the provider base URL.
    pub path: &'static str,
    pub headers: Vec<(&'static str, &'static str)>,
    pub body: Option<Value>,
}

/// How a 2xx response measured up against the kind's expected shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeVerdict {
    Supported,
    /// Well-formed reply, but the capability is not there.
    Unsupported(String),
    /// The body could not be understood.
    Malformed(String),
}

pub fn wire_request(kind: ProbeKind, model_id: &str, prompt: &str) -> WireRequest {
    let chat = |body: Value| WireRequest {
        method: HttpMethod::Post,
        path: "chat/completions",
        headers: Vec::new(),
        body: Some(body),
    };

    match kind {
        ProbeKind::Existence => WireRequest {
            method: HttpMethod::Get,
            path: "models",
            headers: Vec::new(),
            body: None,
        },
        ProbeKind::Responsiveness => chat(json!({
            "model": model_id,
            "messages": [{"role": "user", "content": prompt}],
            "max_tokens": 8,
        })),
        ProbeKind::Streaming => chat(json!({
            "model": model_id,
            "messages": [{"role": "user", "content": prompt}],
            "max_tokens": 8,
            "stream": true,
        })),
        ProbeKind::FunctionCalling => chat(json!({
            "model": model_id,
            "messages": [{"role": "user", "content": "What is the weather in Paris right now?"}],
            "tools": [{
                "type": "function",
                "function": {
                    "name": TOOL_NAME,
                    "description": "Get the current weather for a location",
                    "parameters": {
                        "type": "object",
                        "properties": {
                            "location": {"type": "string", "description": "City name"}
                        },
                        "required": ["location"],
                    },
                },
            }],
            "tool_choice": "auto",
            "max_tokens": 64,
        })),
        ProbeKind::Vision => chat(json!({
            "model": model_id,
            "messages": [{
                "role": "user",
                "content": [
                    {"type": "text", "text": "Describe this image in one word."},
                    {"type": "image_url", "image_url": {
                        "url": format!("data:image/png;base64,{}", STANDARD.encode(PROBE_PNG)),
                    }},
                ],
            }],
            "max_tokens": 8,
        })),
        ProbeKind::Embeddings => WireRequest {
            method: HttpMethod::Post,
            path: "embeddings",
            headers: Vec::new(),
            body: Some(json!({"model": model_id, "input": prompt})),
        },
        ProbeKind::CompressionSupport => WireRequest {
            headers: vec![("accept-encoding", "br")],
            ..chat(json!({
                "model": model_id,
                "messages": [{"role": "user", "content": prompt}],
                "max_tokens": 1,
            }))
        },
    }
}

// ============================================================================
// Response shapes
// ============================================================================

#[derive(Debug, Deserialize)]
struct ModelList {
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    tool_calls: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingList {
    data: Vec<EmbeddingEntry>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingEntry {
    #[serde(default)]
    embedding: Value,
}

fn parse<'a, T: Deserialize<'a>>(body: &'a str) -> Result<T, ShapeVerdict> {
    serde_json::from_str(body).map_err(|e| ShapeVerdict::Malformed(format!("unexpected response body: {e}")))
}

fn check_chat(body: &str) -> Result<ChatCompletion, ShapeVerdict> {
    let completion: ChatCompletion = parse(body)?;
    if completion.choices.is_empty() {
        return Err(ShapeVerdict::Malformed("response has no choices".to_string()));
    }
    Ok(completion)
}

/// SSE `data:` payloads other than the `[DONE]` terminator.
fn sse_chunks(body: &str) -> usize {
    body.lines()
        .filter_map(|line| line.trim_start().strip_prefix("data:"))
        .map(str::trim)
        .filter(|payload| !payload.is_empty() && *payload != "[DONE]")
        .count()
}

/// Judge a 2xx response for `kind`.
pub fn check_response(kind: ProbeKind, model_id: &str, response: &HttpResponse) -> ShapeVerdict {
    let body = response.body.as_str();
    let verdict = match kind {
        ProbeKind::Existence => parse::<ModelList>(body).map(|list| {
            if list.data.iter().any(|m| m.id == model_id) {
                ShapeVerdict::Supported
            } else {
                ShapeVerdict::Unsupported(format!("model '{model_id}' is not listed by the provider"))
            }
        }),
        ProbeKind::Responsiveness | ProbeKind::Vision => {
            check_chat(body).map(|_| ShapeVerdict::Supported)
        }
        ProbeKind::Streaming => {
            if sse_chunks(body) > 0 {
                Ok(ShapeVerdict::Supported)
            } else {
                // A complete JSON reply means the provider ignored `stream`
                check_chat(body).map(|_| ShapeVerdict::Unsupported("streaming not supported".to_string()))
            }
        }
        ProbeKind::FunctionCalling => check_chat(body).map(|completion| {
            let called = completion
                .choices
                .first()
                .and_then(|choice| choice.message.as_ref())
                .and_then(|message| message.tool_calls.as_ref())
                .is_some_and(|calls| !calls.is_empty());
            if called {
                ShapeVerdict::Supported
            } else {
                ShapeVerdict::Unsupported("capability not supported: no tool call returned".to_string())
            }
        }),
        ProbeKind::Embeddings => parse::<EmbeddingList>(body).map(|list| {
            let non_empty = list.data.first().is_some_and(|entry| match &entry.embedding {
                Value::Array(values) => !values.is_empty(),
                Value::String(encoded) => !encoded.is_empty(),
                _ => false,
            });
            if non_empty {
                ShapeVerdict::Supported
            } else {
                ShapeVerdict::Unsupported("no embedding returned".to_string())
            }
        }),
        ProbeKind::CompressionSupport => Ok(
            if response
                .header("content-encoding")
                .is_some_and(|enc| enc.to_ascii_lowercase().contains("br"))
            {
                ShapeVerdict::Supported
            } else {
                ShapeVerdict::Unsupported("response is not brotli-encoded".to_string())
            },
        ),
    };
    verdict.unwrap_or_else(|malformed| malformed)
}

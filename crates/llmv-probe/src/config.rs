//! Public configuration for the HTTP prober.

use std::time::Duration;

/// Configuration for [`HttpProber`](crate::HttpProber).
///
/// # Example
///
/// ```
/// use llmv_probe::ProberConfig;
/// use std::time::Duration;
///
/// let config = ProberConfig::new()
///     .with_connect_timeout(Duration::from_secs(5))
///     .with_user_agent("my-verifier/1.0");
/// ```
#[derive(Debug, Clone)]
pub struct ProberConfig {
    /// User agent string for HTTP requests
    pub(crate) user_agent: String,
    /// TCP/TLS connect timeout, separate from the per-probe deadline
    pub(crate) connect_timeout: Duration,
    /// Bodies longer than this are truncated before shape checks
    pub(crate) max_body_bytes: usize,
    /// Prompt sent by chat-based probes
    pub(crate) prompt: String,
}

impl Default for ProberConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("llmv/", env!("CARGO_PKG_VERSION")).to_string(),
            connect_timeout: Duration::from_secs(10),
            max_body_bytes: 1024 * 1024,
            prompt: "ping".to_string(),
        }
    }
}

impl ProberConfig {
    /// Create a new configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Defaults to 10 seconds.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Defaults to 1 MiB.
    #[must_use]
    pub const fn with_max_body_bytes(mut self, bytes: usize) -> Self {
        self.max_body_bytes = bytes;
        self
    }

    #[must_use]
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }
}

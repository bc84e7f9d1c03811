#![doc = include_str!("../README.md")]
#![deny(unused_crate_dependencies)]

mod classify;
mod config;
mod credentials;
mod error;
mod http;
mod prober;
mod wire;

// ============================================================================
// Public API
// ============================================================================

pub use classify::{classify_status, parse_retry_after};
pub use config::ProberConfig;
pub use credentials::EnvCredentialResolver;
pub use error::{ProbeHttpError, ProbeHttpResult};
pub use http::{HttpBackend, HttpMethod, HttpRequest, HttpResponse, ReqwestBackend};
pub use prober::HttpProber;

// Silence unused dev-dependency warnings
#[cfg(test)]
use tokio as _;
#[cfg(test)]
use tokio_test as _;

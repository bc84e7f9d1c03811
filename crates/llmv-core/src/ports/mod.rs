//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces that the verification core expects from
//! infrastructure. They contain no implementation details and use only
//! domain types.
//!
//! # Design Rules
//!
//! - No `sqlx` or `reqwest` types in any signature
//! - The registry is read-only; the result sink is append-only
//! - Probers classify every failure; they never return transport errors
//! - Time is read through [`Clock`] so expiry logic is testable

pub mod clock;
pub mod credentials;
pub mod prober;
pub mod registry;
pub mod result_sink;

use std::sync::Arc;
use thiserror::Error;

pub use clock::{Clock, ManualClock, SystemClock};
pub use credentials::{CredentialResolver, Secret};
pub use prober::CapabilityProber;
pub use registry::{Registry, StaticRegistry};
pub use result_sink::{ResultHistory, ResultSink};

/// Container for the storage-backed ports.
///
/// Lives in `llmv-core` so that services can accept it without depending
/// on `llmv-db`.
#[derive(Clone)]
pub struct Stores {
    /// Registry snapshot source.
    pub registry: Arc<dyn Registry>,
    /// Append-only sink for probe results and score records.
    pub sink: Arc<dyn ResultSink>,
    /// Read side of persisted results.
    pub history: Arc<dyn ResultHistory>,
}

impl Stores {
    /// Create a new Stores container.
    pub fn new(
        registry: Arc<dyn Registry>,
        sink: Arc<dyn ResultSink>,
        history: Arc<dyn ResultHistory>,
    ) -> Self {
        Self {
            registry,
            sink,
            history,
        }
    }
}

/// Domain-specific errors for repository operations.
///
/// This error type abstracts away storage implementation details (e.g., sqlx errors)
/// and provides a clean interface for services to handle storage failures.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The requested entity was not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// An entity with the same identifier already exists.
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Storage backend error (database, filesystem, etc.).
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A constraint was violated (e.g., foreign key, unique constraint).
    #[error("Constraint violation: {0}")]
    Constraint(String),
}

/// Core error type for semantic domain errors.
///
/// Adapters map this to their own error types (CLI exit codes).
#[derive(Debug, Error)]
pub enum CoreError {
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Configuration rejected, including invalid weight vectors.
    #[error(transparent)]
    Config(#[from] crate::settings::ConfigError),

    /// Validation error (invalid input).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Internal error (unexpected condition).
    #[error("Internal error: {0}")]
    Internal(String),
}

//! Registry port: the read-only source of providers and models.

use async_trait::async_trait;

use super::RepositoryError;
use crate::domain::RegistrySnapshot;

/// Read-only access to the provider/model registry.
#[async_trait]
pub trait Registry: Send + Sync {
    /// Snapshot taken at the start of a run.
    async fn snapshot(&self) -> Result<RegistrySnapshot, RepositoryError>;
}

/// Registry backed by an in-memory snapshot, e.g. a parsed JSON file.
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    snapshot: RegistrySnapshot,
}

impl StaticRegistry {
    pub const fn new(snapshot: RegistrySnapshot) -> Self {
        Self { snapshot }
    }
}

#[async_trait]
impl Registry for StaticRegistry {
    async fn snapshot(&self) -> Result<RegistrySnapshot, RepositoryError> {
        Ok(self.snapshot.clone())
    }
}

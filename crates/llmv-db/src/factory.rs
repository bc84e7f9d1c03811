//! Composition utilities for building storage ports with `SQLite` backends.
//!
//! Construction only; no domain logic lives here.

use sqlx::SqlitePool;
use std::sync::Arc;

use llmv_core::Stores;

use crate::repositories::{SqliteRegistry, SqliteResultSink};

/// Factory for creating repository instances with `SQLite` backends.
pub struct StoreFactory;

impl StoreFactory {
    /// Build every storage port from a pool.
    ///
    /// The sink and history share one `SqliteResultSink`.
    pub fn build_stores(pool: SqlitePool) -> Stores {
        let results = Arc::new(SqliteResultSink::new(pool.clone()));
        Stores::new(
            Arc::new(SqliteRegistry::new(pool)),
            results.clone(),
            results,
        )
    }

    /// Create a registry from a pool.
    pub fn registry(pool: SqlitePool) -> Arc<SqliteRegistry> {
        Arc::new(SqliteRegistry::new(pool))
    }

    /// Create a result sink from a pool.
    pub fn result_sink(pool: SqlitePool) -> Arc<SqliteResultSink> {
        Arc::new(SqliteResultSink::new(pool))
    }
}

/// Test database helper for integration tests.
///
/// Wraps an in-memory `SQLite` database with the production schema applied.
#[cfg(any(test, feature = "test-utils"))]
pub struct TestDb {
    pool: SqlitePool,
}

#[cfg(any(test, feature = "test-utils"))]
impl TestDb {
    pub async fn new() -> anyhow::Result<Self> {
        let pool = crate::setup::setup_test_database().await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn registry(&self) -> SqliteRegistry {
        SqliteRegistry::new(self.pool.clone())
    }

    pub fn result_sink(&self) -> SqliteResultSink {
        SqliteResultSink::new(self.pool.clone())
    }

    pub fn stores(&self) -> Stores {
        StoreFactory::build_stores(self.pool.clone())
    }
}

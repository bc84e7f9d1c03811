//! CLI bootstrap - the composition root.
//!
//! This module is the ONLY place where infrastructure is wired together
//! for the CLI adapter:
//! - Database pool, registry and result sink (via llmv-db)
//! - HTTP prober and credential resolver (via llmv-probe)
//! - Cache, breaker table and orchestrator (via llmv-core)
//!
//! Command handlers receive a [`CliContext`] and never open the database
//! themselves.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use llmv_core::{
    BreakerConfig, BreakerTable, Clock, OrchestratorConfig, ResultCache, Stores, SystemClock,
    VerificationOrchestrator, VerifierConfig,
};
use llmv_db::{SqliteRegistry, StoreFactory, setup_database};
use llmv_probe::{EnvCredentialResolver, HttpProber, ProberConfig};
use tracing_subscriber::EnvFilter;

use crate::error::CliError;

/// Bootstrap configuration for the CLI.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// `SQLite` database file.
    pub db_path: PathBuf,
}

impl CliConfig {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }
}

/// Fully composed context for CLI commands.
pub struct CliContext {
    stores: Stores,
    registry: Arc<SqliteRegistry>,
    clock: Arc<dyn Clock>,
    db_path: PathBuf,
}

impl CliContext {
    /// Storage ports for the verification pipeline.
    pub const fn stores(&self) -> &Stores {
        &self.stores
    }

    /// Concrete registry, needed for snapshot imports.
    pub const fn registry(&self) -> &Arc<SqliteRegistry> {
        &self.registry
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Assemble an orchestrator for one `verify` run.
    ///
    /// Credentials come from the process environment (`env:NAME` references).
    pub fn build_orchestrator(&self, config: &VerifierConfig) -> Result<VerificationOrchestrator> {
        let prober = HttpProber::new(
            ProberConfig::new(),
            Arc::new(EnvCredentialResolver::new()),
        )
        .context("Failed to build HTTP prober")?;

        Ok(VerificationOrchestrator::new(
            Arc::new(prober),
            Arc::new(ResultCache::new(config.cache_ttl(), self.clock.clone())),
            Arc::new(BreakerTable::new(
                BreakerConfig::from_config(config),
                self.clock.clone(),
            )),
            self.stores.sink.clone(),
            self.clock.clone(),
            OrchestratorConfig::from_config(config),
        ))
    }
}

/// Open the database and build the storage ports.
pub async fn bootstrap(config: CliConfig) -> Result<CliContext> {
    let pool = setup_database(&config.db_path)
        .await
        .map_err(|e| {
            CliError::Database(format!(
                "cannot open database at {}: {e:#}",
                config.db_path.display()
            ))
        })?;

    Ok(CliContext {
        stores: StoreFactory::build_stores(pool.clone()),
        registry: StoreFactory::registry(pool),
        clock: Arc::new(SystemClock),
        db_path: config.db_path,
    })
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins; otherwise `info`, or `debug` with `--verbose`.
/// Logs go to stderr so tables on stdout stay clean.
pub fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{level},sqlx=warn,hyper=warn,reqwest=warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

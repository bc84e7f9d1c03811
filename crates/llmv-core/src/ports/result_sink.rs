//! Result sink ports: append-only writes plus keyed reads.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::RepositoryError;
use crate::domain::{CacheKey, ProbeResult, ScoreRecord, TargetKey};

/// Append-only destination for probe results and score records.
///
/// The read methods exist so the orchestrator can warm its cache from
/// previously persisted results.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn append_probe(&self, result: &ProbeResult) -> Result<(), RepositoryError>;

    async fn append_score(&self, record: &ScoreRecord) -> Result<(), RepositoryError>;

    /// Most recent persisted result for a key.
    async fn latest_probe(&self, key: &CacheKey) -> Result<Option<ProbeResult>, RepositoryError>;

    /// Every result recorded at or after `since`, oldest first.
    async fn probes_since(&self, since: DateTime<Utc>)
    -> Result<Vec<ProbeResult>, RepositoryError>;
}

/// Reporting queries over persisted results.
#[async_trait]
pub trait ResultHistory: Send + Sync {
    /// Newest results for one target, newest first.
    async fn probe_history(
        &self,
        target: &TargetKey,
        limit: u32,
    ) -> Result<Vec<ProbeResult>, RepositoryError>;

    /// Newest score per target, best composite first, unscored last.
    async fn latest_scores(&self, limit: u32) -> Result<Vec<ScoreRecord>, RepositoryError>;
}

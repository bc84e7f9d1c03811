//! `SQLite` implementation of the `ResultSink` and `ResultHistory` ports.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use llmv_core::{
    CacheKey, ProbeResult, RepositoryError, ResultHistory, ResultSink, ScoreRecord, TargetKey,
};

use super::row_mappers::{
    PROBE_SELECT_COLUMNS, ProbeRow, SCORE_SELECT_COLUMNS, ScoreRow, format_timestamp,
    row_to_probe_result, row_to_score_record,
};

/// Append-only store for probe results and score records.
///
/// Rows are only ever inserted; nothing in this type updates or deletes.
pub struct SqliteResultSink {
    pool: SqlitePool,
}

impl SqliteResultSink {
    /// Create a new `SQLite` result sink.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Total number of persisted probe results.
    pub async fn probe_count(&self) -> Result<i64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM probe_results")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| RepositoryError::Storage(e.to_string()))?;
        Ok(count)
    }
}

#[async_trait]
impl ResultSink for SqliteResultSink {
    async fn append_probe(&self, result: &ProbeResult) -> Result<(), RepositoryError> {
        let row = ProbeRow::from_result(result);
        sqlx::query(
            r#"
            INSERT INTO probe_results (
                provider_id, model_id, kind, outcome, latency_ms, time_to_first_chunk_ms,
                attempts, retries_exhausted, reason, recorded_at, from_cache
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(row.provider_id)
        .bind(row.model_id)
        .bind(row.kind)
        .bind(row.outcome)
        .bind(row.latency_ms)
        .bind(row.time_to_first_chunk_ms)
        .bind(row.attempts)
        .bind(row.retries_exhausted)
        .bind(row.reason)
        .bind(&row.recorded_at)
        .bind(row.from_cache)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        Ok(())
    }

    async fn append_score(&self, record: &ScoreRecord) -> Result<(), RepositoryError> {
        let row = ScoreRow::from_record(record)?;
        sqlx::query(
            r#"
            INSERT INTO score_records (
                provider_id, model_id, status, composite, components, unscored_reason,
                weights, calculation_hash, computed_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(row.provider_id)
        .bind(row.model_id)
        .bind(row.status)
        .bind(row.composite)
        .bind(&row.components)
        .bind(row.unscored_reason)
        .bind(&row.weights)
        .bind(row.calculation_hash)
        .bind(&row.computed_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        Ok(())
    }

    async fn latest_probe(&self, key: &CacheKey) -> Result<Option<ProbeResult>, RepositoryError> {
        let sql = format!(
            "SELECT {PROBE_SELECT_COLUMNS} FROM probe_results \
             WHERE provider_id = ? AND model_id = ? AND kind = ? \
             ORDER BY recorded_at DESC, id DESC LIMIT 1"
        );
        let row = sqlx::query(&sql)
            .bind(&key.provider_id)
            .bind(&key.model_id)
            .bind(key.kind.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        row.as_ref().map(row_to_probe_result).transpose()
    }

    async fn probes_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<ProbeResult>, RepositoryError> {
        let sql = format!(
            "SELECT {PROBE_SELECT_COLUMNS} FROM probe_results \
             WHERE recorded_at >= ? ORDER BY recorded_at ASC, id ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(format_timestamp(since))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        rows.iter().map(row_to_probe_result).collect()
    }
}

#[async_trait]
impl ResultHistory for SqliteResultSink {
    async fn probe_history(
        &self,
        target: &TargetKey,
        limit: u32,
    ) -> Result<Vec<ProbeResult>, RepositoryError> {
        let sql = format!(
            "SELECT {PROBE_SELECT_COLUMNS} FROM probe_results \
             WHERE provider_id = ? AND model_id = ? \
             ORDER BY recorded_at DESC, id DESC LIMIT ?"
        );
        let rows = sqlx::query(&sql)
            .bind(&target.provider_id)
            .bind(&target.model_id)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        rows.iter().map(row_to_probe_result).collect()
    }

    async fn latest_scores(&self, limit: u32) -> Result<Vec<ScoreRecord>, RepositoryError> {
        // Newest record per target; unscored records sort after every score
        let sql = format!(
            "SELECT {SCORE_SELECT_COLUMNS} FROM score_records \
             WHERE id IN (SELECT MAX(id) FROM score_records GROUP BY provider_id, model_id) \
             ORDER BY composite IS NULL, composite DESC, provider_id, model_id LIMIT ?"
        );
        let rows = sqlx::query(&sql)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        rows.iter().map(row_to_score_record).collect()
    }
}

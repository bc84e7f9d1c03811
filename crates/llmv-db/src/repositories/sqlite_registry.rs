//! `SQLite` implementation of the `Registry` port.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use llmv_core::{Registry, RegistrySnapshot, RepositoryError};

use super::row_mappers::{format_timestamp, row_to_model, row_to_provider};

/// Counts written by [`SqliteRegistry::import_snapshot`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub providers: usize,
    pub models: usize,
}

/// Provider and model registry stored in `SQLite`.
///
/// The verification pipeline only reads it; imports happen out of band.
pub struct SqliteRegistry {
    pool: SqlitePool,
}

impl SqliteRegistry {
    /// Create a new `SQLite` registry.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert or update every provider and model in `snapshot`.
    ///
    /// Runs in one transaction; entries absent from the snapshot are kept.
    pub async fn import_snapshot(
        &self,
        snapshot: &RegistrySnapshot,
    ) -> Result<ImportSummary, RepositoryError> {
        let updated_at = format_timestamp(Utc::now());
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        for provider in &snapshot.providers {
            let auth_style = serde_json::to_string(&provider.auth_style)
                .map_err(|e| RepositoryError::Serialization(e.to_string()))?;
            sqlx::query(
                r#"
                INSERT INTO providers (id, base_url, credential_ref, auth_style, updated_at)
                VALUES (?, ?, ?, ?, ?)
                ON CONFLICT(id) DO UPDATE SET
                    base_url = excluded.base_url,
                    credential_ref = excluded.credential_ref,
                    auth_style = excluded.auth_style,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(&provider.id)
            .bind(&provider.base_url)
            .bind(provider.credential.as_ref().map(|c| c.as_str().to_string()))
            .bind(&auth_style)
            .bind(&updated_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::Storage(e.to_string()))?;
        }

        for model in &snapshot.models {
            let metadata = serde_json::to_string(&model.metadata)
                .map_err(|e| RepositoryError::Serialization(e.to_string()))?;
            sqlx::query(
                r#"
                INSERT INTO models (provider_id, model_id, metadata, updated_at)
                VALUES (?, ?, ?, ?)
                ON CONFLICT(provider_id, model_id) DO UPDATE SET
                    metadata = excluded.metadata,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(&model.provider_id)
            .bind(&model.model_id)
            .bind(&metadata)
            .bind(&updated_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::Storage(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        let summary = ImportSummary {
            providers: snapshot.providers.len(),
            models: snapshot.models.len(),
        };
        info!(providers = summary.providers, models = summary.models, "Imported registry snapshot");
        Ok(summary)
    }
}

#[async_trait]
impl Registry for SqliteRegistry {
    async fn snapshot(&self) -> Result<RegistrySnapshot, RepositoryError> {
        let provider_rows = sqlx::query(
            "SELECT id, base_url, credential_ref, auth_style FROM providers ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        let model_rows = sqlx::query(
            "SELECT provider_id, model_id, metadata FROM models ORDER BY provider_id, model_id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        Ok(RegistrySnapshot {
            providers: provider_rows
                .iter()
                .map(row_to_provider)
                .collect::<Result<_, _>>()?,
            models: model_rows.iter().map(row_to_model).collect::<Result<_, _>>()?,
        })
    }
}

//! Row mapping helpers for `SQLite` queries.

use chrono::{DateTime, SecondsFormat, Utc};
use llmv_core::{
    AuthStyle, CredentialRef, ModelMetadata, ModelTarget, ProbeKind, ProbeOutcome, ProbeResult,
    ProviderTarget, RepositoryError, ScoreComponents, ScoreOutcome, ScoreRecord, TargetKey,
    WeightVector,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

/// Shared SELECT column list for probe result queries.
pub const PROBE_SELECT_COLUMNS: &str = "provider_id, model_id, kind, outcome, latency_ms, time_to_first_chunk_ms, attempts, retries_exhausted, reason, recorded_at, from_cache";

/// Shared SELECT column list for score record queries.
pub const SCORE_SELECT_COLUMNS: &str = "provider_id, model_id, status, composite, components, unscored_reason, weights, calculation_hash, computed_at";

fn storage(e: impl ToString) -> RepositoryError {
    RepositoryError::Storage(e.to_string())
}

fn serialization(e: impl ToString) -> RepositoryError {
    RepositoryError::Serialization(e.to_string())
}

/// Fixed-width UTC timestamp; lexical order equals time order.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored RFC 3339 timestamp.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| serialization(format!("invalid timestamp '{raw}': {e}")))
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn to_u64(value: i64) -> u64 {
    u64::try_from(value).unwrap_or_default()
}

/// Bindable column values for one probe result.
pub struct ProbeRow<'a> {
    pub provider_id: &'a str,
    pub model_id: &'a str,
    pub kind: &'static str,
    pub outcome: &'static str,
    pub latency_ms: i64,
    pub time_to_first_chunk_ms: Option<i64>,
    pub attempts: i64,
    pub retries_exhausted: bool,
    pub reason: Option<&'a str>,
    pub recorded_at: String,
    pub from_cache: bool,
}

impl<'a> ProbeRow<'a> {
    pub fn from_result(result: &'a ProbeResult) -> Self {
        Self {
            provider_id: &result.target.provider_id,
            model_id: &result.target.model_id,
            kind: result.kind.as_str(),
            outcome: result.outcome.as_str(),
            latency_ms: to_i64(result.latency_ms),
            time_to_first_chunk_ms: result.time_to_first_chunk_ms.map(to_i64),
            attempts: i64::from(result.attempts),
            retries_exhausted: result.retries_exhausted,
            reason: result.reason.as_deref(),
            recorded_at: format_timestamp(result.recorded_at),
            from_cache: result.from_cache,
        }
    }
}

/// Parse a database row into a probe result.
pub fn row_to_probe_result(row: &SqliteRow) -> Result<ProbeResult, RepositoryError> {
    let kind: String = row.try_get("kind").map_err(storage)?;
    let outcome: String = row.try_get("outcome").map_err(storage)?;
    let recorded_at: String = row.try_get("recorded_at").map_err(storage)?;
    let attempts: i64 = row.try_get("attempts").map_err(storage)?;

    Ok(ProbeResult {
        target: TargetKey::new(
            row.try_get::<String, _>("provider_id").map_err(storage)?,
            row.try_get::<String, _>("model_id").map_err(storage)?,
        ),
        kind: kind.parse::<ProbeKind>().map_err(serialization)?,
        outcome: outcome.parse::<ProbeOutcome>().map_err(serialization)?,
        latency_ms: to_u64(row.try_get("latency_ms").map_err(storage)?),
        time_to_first_chunk_ms: row
            .try_get::<Option<i64>, _>("time_to_first_chunk_ms")
            .map_err(storage)?
            .map(to_u64),
        attempts: u32::try_from(attempts).unwrap_or_default(),
        retries_exhausted: row.try_get("retries_exhausted").map_err(storage)?,
        reason: row.try_get("reason").map_err(storage)?,
        recorded_at: parse_timestamp(&recorded_at)?,
        from_cache: row.try_get("from_cache").map_err(storage)?,
    })
}

/// Bindable column values for one score record.
pub struct ScoreRow<'a> {
    pub provider_id: &'a str,
    pub model_id: &'a str,
    pub status: &'static str,
    pub composite: Option<f64>,
    pub components: Option<String>,
    pub unscored_reason: Option<&'a str>,
    pub weights: String,
    pub calculation_hash: &'a str,
    pub computed_at: String,
}

impl<'a> ScoreRow<'a> {
    pub fn from_record(record: &'a ScoreRecord) -> Result<Self, RepositoryError> {
        let (status, composite, components, unscored_reason) = match &record.outcome {
            ScoreOutcome::Scored {
                components,
                composite,
            } => (
                "scored",
                Some(*composite),
                Some(serde_json::to_string(components).map_err(serialization)?),
                None,
            ),
            ScoreOutcome::Unscored { reason } => ("unscored", None, None, Some(reason.as_str())),
        };

        Ok(Self {
            provider_id: &record.target.provider_id,
            model_id: &record.target.model_id,
            status,
            composite,
            components,
            unscored_reason,
            weights: serde_json::to_string(&record.weights).map_err(serialization)?,
            calculation_hash: &record.calculation_hash,
            computed_at: format_timestamp(record.computed_at),
        })
    }
}

/// Parse a database row into a score record.
pub fn row_to_score_record(row: &SqliteRow) -> Result<ScoreRecord, RepositoryError> {
    let status: String = row.try_get("status").map_err(storage)?;
    let weights: String = row.try_get("weights").map_err(storage)?;
    let computed_at: String = row.try_get("computed_at").map_err(storage)?;

    let outcome = match status.as_str() {
        "scored" => {
            let components: Option<String> = row.try_get("components").map_err(storage)?;
            let components: ScoreComponents =
                serde_json::from_str(components.as_deref().unwrap_or_default())
                    .map_err(serialization)?;
            let composite: Option<f64> = row.try_get("composite").map_err(storage)?;
            ScoreOutcome::Scored {
                components,
                composite: composite
                    .ok_or_else(|| serialization("scored record without composite"))?,
            }
        }
        "unscored" => ScoreOutcome::Unscored {
            reason: row
                .try_get::<Option<String>, _>("unscored_reason")
                .map_err(storage)?
                .unwrap_or_default(),
        },
        other => return Err(serialization(format!("unknown score status '{other}'"))),
    };

    Ok(ScoreRecord {
        target: TargetKey::new(
            row.try_get::<String, _>("provider_id").map_err(storage)?,
            row.try_get::<String, _>("model_id").map_err(storage)?,
        ),
        weights: serde_json::from_str::<WeightVector>(&weights).map_err(serialization)?,
        outcome,
        computed_at: parse_timestamp(&computed_at)?,
        calculation_hash: row.try_get("calculation_hash").map_err(storage)?,
    })
}

/// Parse a `providers` row.
pub fn row_to_provider(row: &SqliteRow) -> Result<ProviderTarget, RepositoryError> {
    let auth_style: String = row.try_get("auth_style").map_err(storage)?;
    Ok(ProviderTarget {
        id: row.try_get("id").map_err(storage)?,
        base_url: row.try_get("base_url").map_err(storage)?,
        credential: row
            .try_get::<Option<String>, _>("credential_ref")
            .map_err(storage)?
            .map(CredentialRef::new),
        auth_style: serde_json::from_str::<AuthStyle>(&auth_style).map_err(serialization)?,
    })
}

/// Parse a `models` row.
pub fn row_to_model(row: &SqliteRow) -> Result<ModelTarget, RepositoryError> {
    let metadata: String = row.try_get("metadata").map_err(storage)?;
    Ok(ModelTarget {
        provider_id: row.try_get("provider_id").map_err(storage)?,
        model_id: row.try_get("model_id").map_err(storage)?,
        metadata: serde_json::from_str::<ModelMetadata>(&metadata).map_err(serialization)?,
    })
}

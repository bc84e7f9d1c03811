//! Scoring engine.
//!
//! A pure function from (probe results, static metadata, weights, computed-at)
//! to a [`ScoreRecord`]. Every mapping below is built from `+ - * /` only and
//! evaluated in a fixed order, so identical inputs give bit-identical
//! composites on any IEEE-754 machine. Transcendental functions are avoided
//! because libm implementations differ in the last bit.

use std::cmp::Ordering;
use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::domain::{
    AdvertisedFeatures, ModelMetadata, ProbeKind, ProbeOutcome, ProbeResult, ScoreComponents,
    ScoreOutcome, ScoreRecord, TargetKey, WeightVector,
};
use crate::settings::ConfigError;

/// Score used when the input for a component is unknown.
pub const NEUTRAL_SCORE: f64 = 5.0;

const MAX_COMPONENT: f64 = 10.0;

/// Latency at which the speed component is 5.0.
const SPEED_HALF_POINT_MS: f64 = 2000.0;

/// Parameter count (billions) at which the efficiency component is 5.0.
const EFFICIENCY_HALF_POINT_B: f64 = 20.0;

const MULTIMODAL_BONUS: f64 = 1.0;

/// Price (USD per million tokens) at which the cost component is 5.0.
const COST_HALF_POINT_USD: f64 = 1.0;

/// Age in days at which the recency component is 5.0.
const RECENCY_HALF_POINT_DAYS: f64 = 365.0;

/// Deducted per advertised capability whose probe ran and did not pass.
const OVERCLAIM_PENALTY: f64 = 1.0;

const fn capability_weight(kind: ProbeKind) -> f64 {
    match kind {
        ProbeKind::FunctionCalling => 1.5,
        ProbeKind::Embeddings => 0.5,
        ProbeKind::Streaming | ProbeKind::Vision => 1.0,
        ProbeKind::Existence | ProbeKind::Responsiveness | ProbeKind::CompressionSupport => 0.0,
    }
}

/// Most recent result per kind, indexed like [`ProbeKind::ALL`].
///
/// Ties on `recorded_at` fall back to outcome, then latency, so the choice
/// never depends on input order.
fn latest_per_kind<'a>(target: &TargetKey, results: &'a [ProbeResult]) -> [Option<&'a ProbeResult>; 7] {
    let mut latest: [Option<&ProbeResult>; 7] = [None; 7];
    for (slot, kind) in latest.iter_mut().zip(ProbeKind::ALL) {
        *slot = results
            .iter()
            .filter(|r| r.kind == kind && &r.target == target)
            .max_by(|a, b| {
                a.recorded_at
                    .cmp(&b.recorded_at)
                    .then_with(|| b.outcome.cmp(&a.outcome))
                    .then_with(|| b.latency_ms.cmp(&a.latency_ms))
                    .then_with(|| b.attempts.cmp(&a.attempts))
            });
    }
    latest
}

fn passed(latest: &[Option<&ProbeResult>; 7], kind: ProbeKind) -> bool {
    latest[kind_index(kind)].is_some_and(|r| r.outcome.is_success())
}

fn kind_index(kind: ProbeKind) -> usize {
    ProbeKind::ALL
        .iter()
        .position(|k| *k == kind)
        .unwrap_or_default()
}

/// `10 * h / (h + x)`: 10 at zero, 5 at `h`, approaching 0.
fn decreasing(x: f64, half_point: f64) -> f64 {
    if x <= 0.0 {
        return MAX_COMPONENT;
    }
    MAX_COMPONENT * half_point / (half_point + x)
}

fn clamp_component(value: f64) -> f64 {
    value.clamp(0.0, MAX_COMPONENT)
}

#[allow(clippy::cast_precision_loss)]
fn speed_score(latest: &[Option<&ProbeResult>; 7]) -> f64 {
    let success = |kind: ProbeKind| latest[kind_index(kind)].filter(|r| r.outcome.is_success());

    let latency_ms = success(ProbeKind::Responsiveness)
        .map(|r| r.latency_ms as f64)
        .or_else(|| {
            success(ProbeKind::Streaming)
                .and_then(|r| r.time_to_first_chunk_ms)
                .map(|ms| ms as f64)
        })
        .or_else(|| {
            let mut total = 0.0;
            let mut count = 0.0;
            for result in latest.iter().flatten().filter(|r| r.outcome.is_success()) {
                total += result.latency_ms as f64;
                count += 1.0;
            }
            (count > 0.0).then(|| total / count)
        });

    latency_ms.map_or(NEUTRAL_SCORE, |ms| clamp_component(decreasing(ms, SPEED_HALF_POINT_MS)))
}

#[allow(clippy::cast_precision_loss)]
fn efficiency_score(latest: &[Option<&ProbeResult>; 7], metadata: &ModelMetadata) -> f64 {
    let base = metadata.parameter_count.map_or(NEUTRAL_SCORE, |params| {
        let billions = params as f64 / 1_000_000_000.0;
        decreasing(billions, EFFICIENCY_HALF_POINT_B)
    });
    let multimodal = metadata.features.contains(AdvertisedFeatures::VISION)
        || passed(latest, ProbeKind::Vision);
    let bonus = if multimodal { MULTIMODAL_BONUS } else { 0.0 };
    clamp_component(base + bonus)
}

fn cost_score(metadata: &ModelMetadata) -> f64 {
    match metadata.price_per_million_tokens {
        Some(price) if price.is_finite() => clamp_component(decreasing(price, COST_HALF_POINT_USD)),
        _ => NEUTRAL_SCORE,
    }
}

/// Passed weight over the weight of kinds that were either advertised or
/// actually attempted. Kinds that are neither are left out of the denominator.
fn capability_score(latest: &[Option<&ProbeResult>; 7], metadata: &ModelMetadata) -> f64 {
    let mut total = 0.0;
    let mut earned = 0.0;
    let mut penalty = 0.0;

    for kind in ProbeKind::CAPABILITIES {
        let weight = capability_weight(kind);
        let result = latest[kind_index(kind)];
        let advertised = kind
            .advertised_flag()
            .is_some_and(|flag| metadata.features.contains(flag));
        let attempted = result.is_some_and(|r| r.outcome.was_attempted());
        if !advertised && !attempted {
            continue;
        }

        total += weight;
        if result.is_some_and(|r| r.outcome.is_success()) {
            earned += weight;
        } else if advertised && attempted {
            penalty += OVERCLAIM_PENALTY;
        }
    }

    if total <= 0.0 {
        return NEUTRAL_SCORE;
    }
    clamp_component(MAX_COMPONENT * earned / total - penalty)
}

#[allow(clippy::cast_precision_loss)]
fn recency_score(metadata: &ModelMetadata, computed_at: DateTime<Utc>) -> f64 {
    let Some(date) = metadata.release_date.or(metadata.training_cutoff) else {
        return NEUTRAL_SCORE;
    };
    let age_days = (computed_at.date_naive() - date).num_days().max(0);
    clamp_component(decreasing(age_days as f64, RECENCY_HALF_POINT_DAYS))
}

/// Composite in `[0, 100]`, summed in component order.
fn composite(components: &ScoreComponents, weights: &WeightVector) -> f64 {
    let weighted = components.speed * weights.speed
        + components.efficiency * weights.efficiency
        + components.cost * weights.cost
        + components.capability * weights.capability
        + components.recency * weights.recency;
    (MAX_COMPONENT * weighted).clamp(0.0, 100.0)
}

fn calculation_hash(
    target: &TargetKey,
    latest: &[Option<&ProbeResult>; 7],
    metadata: &ModelMetadata,
    weights: &WeightVector,
    computed_at: DateTime<Utc>,
) -> String {
    let mut canonical = format!("target={target};computed_at={};", computed_at.to_rfc3339());
    for (name, weight) in weights.named() {
        let _ = write!(canonical, "w.{name}={:016x};", weight.to_bits());
    }
    for result in latest.iter().flatten() {
        let _ = write!(
            canonical,
            "probe.{}={},{},{:?};",
            result.kind, result.outcome, result.latency_ms, result.time_to_first_chunk_ms
        );
    }
    let _ = write!(
        canonical,
        "meta={:?},{:?},{:?},{:?},{};",
        metadata.parameter_count,
        metadata.price_per_million_tokens.map(f64::to_bits),
        metadata.release_date,
        metadata.training_cutoff,
        metadata.features.bits()
    );

    format!("{:x}", Sha256::digest(canonical.as_bytes()))
}

/// Explicit unscored record, e.g. for targets that were never probed.
pub fn unscored(
    target: TargetKey,
    reason: impl Into<String>,
    weights: WeightVector,
    computed_at: DateTime<Utc>,
) -> ScoreRecord {
    let reason = reason.into();
    let canonical = format!("target={target};computed_at={};unscored={reason}", computed_at.to_rfc3339());
    ScoreRecord {
        target,
        weights,
        outcome: ScoreOutcome::Unscored { reason },
        computed_at,
        calculation_hash: format!("{:x}", Sha256::digest(canonical.as_bytes())),
    }
}

/// Score one target.
///
/// `results` may contain records for other targets and several records per
/// kind; only the latest per kind for `target` is used. A target without
/// any `Success` is returned as unscored, never as a numeric zero.
pub fn score_target(
    target: &TargetKey,
    results: &[ProbeResult],
    metadata: &ModelMetadata,
    weights: &WeightVector,
    computed_at: DateTime<Utc>,
) -> Result<ScoreRecord, ConfigError> {
    weights.validate()?;

    let latest = latest_per_kind(target, results);
    let calculation_hash = calculation_hash(target, &latest, metadata, weights, computed_at);

    let any_success = latest
        .iter()
        .flatten()
        .any(|r| r.outcome == ProbeOutcome::Success);
    if !any_success {
        let reason = if latest.iter().flatten().next().is_none() {
            "no probe results".to_string()
        } else {
            "no successful probes".to_string()
        };
        return Ok(ScoreRecord {
            target: target.clone(),
            weights: *weights,
            outcome: ScoreOutcome::Unscored { reason },
            computed_at,
            calculation_hash,
        });
    }

    let components = ScoreComponents {
        speed: speed_score(&latest),
        efficiency: efficiency_score(&latest, metadata),
        cost: cost_score(metadata),
        capability: capability_score(&latest, metadata),
        recency: recency_score(metadata, computed_at),
    };
    let composite = composite(&components, weights);

    Ok(ScoreRecord {
        target: target.clone(),
        weights: *weights,
        outcome: ScoreOutcome::Scored {
            components,
            composite,
        },
        computed_at,
        calculation_hash,
    })
}

/// Order records best first, unscored last, ties by target.
pub fn rank(records: &mut [ScoreRecord]) {
    records.sort_by(|a, b| match (a.composite(), b.composite()) {
        (Some(x), Some(y)) => y.total_cmp(&x).then_with(|| a.target.cmp(&b.target)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.target.cmp(&b.target),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 1, 12, 0, 0).unwrap()
    }

    fn probe(kind: ProbeKind, outcome: ProbeOutcome, latency_ms: u64) -> ProbeResult {
        ProbeResult {
            target: TargetKey::new("alpha", "m1"),
            kind,
            outcome,
            latency_ms,
            time_to_first_chunk_ms: None,
            attempts: 1,
            retries_exhausted: false,
            reason: None,
            recorded_at: at(),
            from_cache: false,
        }
    }

    fn alpha_metadata() -> ModelMetadata {
        ModelMetadata {
            parameter_count: None,
            price_per_million_tokens: Some(0.5),
            release_date: Some(at().date_naive() - chrono::Duration::days(182)),
            training_cutoff: None,
            features: AdvertisedFeatures::empty(),
        }
    }

    fn alpha_results() -> Vec<ProbeResult> {
        vec![
            probe(ProbeKind::Existence, ProbeOutcome::Success, 200),
            probe(ProbeKind::Responsiveness, ProbeOutcome::Success, 1200),
            probe(ProbeKind::Streaming, ProbeOutcome::NotFound, 300),
            probe(ProbeKind::FunctionCalling, ProbeOutcome::NotFound, 300),
        ]
    }

    #[test]
    fn alpha_scenario_is_pinned() {
        let record = score_target(
            &TargetKey::new("alpha", "m1"),
            &alpha_results(),
            &alpha_metadata(),
            &WeightVector::DEFAULT,
            at(),
        )
        .unwrap();

        let components = record.components().unwrap();
        assert!((components.speed - 6.25).abs() < 1e-12);
        assert!((components.efficiency - NEUTRAL_SCORE).abs() < 1e-12);
        assert!((components.cost - 20.0 / 3.0).abs() < 1e-12);
        assert!(components.capability.abs() < 1e-12);
        assert!((components.recency - 3650.0 / 547.0).abs() < 1e-12);

        let composite = record.composite().unwrap();
        assert!(composite > 40.0 && composite < 70.0);
        assert!((composite - 48.964_427).abs() < 1e-4, "got {composite}");
        assert_eq!(record.score_suffix().as_deref(), Some("(SC:4.9)"));
    }

    #[test]
    fn identical_inputs_give_bit_identical_composites() {
        let mut shuffled = alpha_results();
        shuffled.reverse();

        let a = score_target(
            &TargetKey::new("alpha", "m1"),
            &alpha_results(),
            &alpha_metadata(),
            &WeightVector::DEFAULT,
            at(),
        )
        .unwrap();
        let b = score_target(
            &TargetKey::new("alpha", "m1"),
            &shuffled,
            &alpha_metadata(),
            &WeightVector::DEFAULT,
            at(),
        )
        .unwrap();

        assert_eq!(
            a.composite().unwrap().to_bits(),
            b.composite().unwrap().to_bits()
        );
        assert_eq!(a.calculation_hash, b.calculation_hash);
    }

    #[test]
    fn invalid_weights_are_a_configuration_error() {
        let weights = WeightVector {
            speed: 0.5,
            ..WeightVector::DEFAULT
        };
        let result = score_target(
            &TargetKey::new("alpha", "m1"),
            &alpha_results(),
            &alpha_metadata(),
            &weights,
            at(),
        );
        assert!(matches!(result, Err(ConfigError::WeightSum { .. })));
    }

    #[test]
    fn composite_stays_in_range_for_valid_weights() {
        let extremes = [
            WeightVector::new(1.0, 0.0, 0.0, 0.0, 0.0).unwrap(),
            WeightVector::new(0.0, 0.0, 0.0, 0.0, 1.0).unwrap(),
            WeightVector::new(0.2, 0.2, 0.2, 0.2, 0.2).unwrap(),
            WeightVector::new(0.25, 0.20, 0.25, 0.20, 0.100_000_9).unwrap(),
        ];
        let best = ModelMetadata {
            parameter_count: Some(1),
            price_per_million_tokens: Some(0.0),
            release_date: Some(at().date_naive()),
            training_cutoff: None,
            features: AdvertisedFeatures::VISION,
        };
        let mut all_pass: Vec<ProbeResult> = ProbeKind::ALL
            .iter()
            .map(|k| probe(*k, ProbeOutcome::Success, 0))
            .collect();
        all_pass.push(probe(ProbeKind::Responsiveness, ProbeOutcome::Success, 0));

        for weights in extremes {
            for (results, metadata) in [
                (all_pass.clone(), best.clone()),
                (alpha_results(), alpha_metadata()),
                (
                    vec![probe(ProbeKind::Existence, ProbeOutcome::Success, u64::MAX)],
                    ModelMetadata {
                        parameter_count: Some(u64::MAX),
                        price_per_million_tokens: Some(f64::MAX),
                        release_date: NaiveDate::from_ymd_opt(1970, 1, 1),
                        ..ModelMetadata::default()
                    },
                ),
            ] {
                let record =
                    score_target(&TargetKey::new("alpha", "m1"), &results, &metadata, &weights, at())
                        .unwrap();
                let composite = record.composite().unwrap();
                assert!((0.0..=100.0).contains(&composite), "{composite} out of range");
            }
        }
    }

    #[test]
    fn no_success_is_unscored_not_zero() {
        let results = vec![
            probe(ProbeKind::Existence, ProbeOutcome::BreakerOpen, 0),
            probe(ProbeKind::Responsiveness, ProbeOutcome::Timeout, 10_000),
        ];
        let record = score_target(
            &TargetKey::new("alpha", "m1"),
            &results,
            &alpha_metadata(),
            &WeightVector::DEFAULT,
            at(),
        )
        .unwrap();
        assert!(!record.is_scored());
        assert!(record.composite().is_none());
    }

    #[test]
    fn empty_results_are_unscored() {
        let record = score_target(
            &TargetKey::new("alpha", "m1"),
            &[],
            &alpha_metadata(),
            &WeightVector::DEFAULT,
            at(),
        )
        .unwrap();
        assert_eq!(
            record.outcome,
            ScoreOutcome::Unscored {
                reason: "no probe results".to_string()
            }
        );
    }

    #[test]
    fn latest_result_per_kind_wins() {
        let mut old_failure = probe(ProbeKind::Streaming, ProbeOutcome::TransientError, 0);
        old_failure.recorded_at = at() - chrono::Duration::hours(1);
        let results = vec![
            probe(ProbeKind::Existence, ProbeOutcome::Success, 100),
            probe(ProbeKind::Streaming, ProbeOutcome::Success, 400),
            old_failure,
        ];
        let record = score_target(
            &TargetKey::new("alpha", "m1"),
            &results,
            &ModelMetadata::default(),
            &WeightVector::DEFAULT,
            at(),
        )
        .unwrap();
        // Streaming is the only capability measured
        assert!((record.components().unwrap().capability - 10.0).abs() < 1e-12);
    }

    #[test]
    fn advertised_but_failed_capability_is_penalized() {
        let results = vec![
            probe(ProbeKind::Existence, ProbeOutcome::Success, 100),
            probe(ProbeKind::Streaming, ProbeOutcome::Success, 100),
            probe(ProbeKind::FunctionCalling, ProbeOutcome::NotFound, 100),
        ];
        let honest = ModelMetadata::default();
        let overclaiming = ModelMetadata {
            features: AdvertisedFeatures::FUNCTION_CALLING,
            ..ModelMetadata::default()
        };

        let score = |metadata: &ModelMetadata| {
            score_target(
                &TargetKey::new("alpha", "m1"),
                &results,
                metadata,
                &WeightVector::DEFAULT,
                at(),
            )
            .unwrap()
            .components()
            .unwrap()
            .capability
        };
        assert!((score(&honest) - score(&overclaiming) - OVERCLAIM_PENALTY).abs() < 1e-12);
    }

    fn capability_of(results: &[ProbeResult], metadata: &ModelMetadata) -> f64 {
        score_target(
            &TargetKey::new("alpha", "m1"),
            results,
            metadata,
            &WeightVector::DEFAULT,
            at(),
        )
        .unwrap()
        .components()
        .unwrap()
        .capability
    }

    #[test]
    fn unmeasured_capabilities_are_neutral() {
        let results = vec![
            probe(ProbeKind::Existence, ProbeOutcome::Success, 100),
            probe(ProbeKind::Responsiveness, ProbeOutcome::Success, 100),
        ];
        let capability = capability_of(&results, &ModelMetadata::default());
        assert!((capability - NEUTRAL_SCORE).abs() < 1e-12);
    }

    #[test]
    fn breaker_open_capability_is_not_scored_as_unsupported() {
        let streaming_only = ModelMetadata {
            features: AdvertisedFeatures::STREAMING,
            ..ModelMetadata::default()
        };
        let with_vision = |outcome: ProbeOutcome| {
            vec![
                probe(ProbeKind::Existence, ProbeOutcome::Success, 100),
                probe(ProbeKind::Streaming, ProbeOutcome::Success, 100),
                probe(ProbeKind::Vision, outcome, 0),
            ]
        };

        let blocked = capability_of(&with_vision(ProbeOutcome::BreakerOpen), &streaming_only);
        let unsupported = capability_of(&with_vision(ProbeOutcome::NotFound), &streaming_only);
        assert!((blocked - 10.0).abs() < 1e-12);
        assert!((unsupported - 5.0).abs() < 1e-12);
    }

    #[test]
    fn advertised_but_never_attempted_capability_counts_against_the_model() {
        let claims_vision = ModelMetadata {
            features: AdvertisedFeatures::STREAMING | AdvertisedFeatures::VISION,
            ..ModelMetadata::default()
        };
        let results = vec![
            probe(ProbeKind::Existence, ProbeOutcome::Success, 100),
            probe(ProbeKind::Streaming, ProbeOutcome::Success, 100),
            probe(ProbeKind::Vision, ProbeOutcome::BreakerOpen, 0),
        ];
        // no overclaim penalty: the vision probe never ran
        assert!((capability_of(&results, &claims_vision) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn missing_price_is_neutral_not_zero() {
        let metadata = ModelMetadata::default();
        assert!((cost_score(&metadata) - NEUTRAL_SCORE).abs() < f64::EPSILON);
    }

    #[test]
    fn speed_falls_back_to_time_to_first_chunk() {
        let mut streaming = probe(ProbeKind::Streaming, ProbeOutcome::Success, 5000);
        streaming.time_to_first_chunk_ms = Some(2000);
        let record = score_target(
            &TargetKey::new("alpha", "m1"),
            &[streaming],
            &ModelMetadata::default(),
            &WeightVector::DEFAULT,
            at(),
        )
        .unwrap();
        assert!((record.components().unwrap().speed - 5.0).abs() < 1e-12);
    }

    #[test]
    fn recency_decreases_with_age_and_clamps_future_dates() {
        let fresh = ModelMetadata {
            release_date: Some(at().date_naive() + chrono::Duration::days(30)),
            ..ModelMetadata::default()
        };
        let year_old = ModelMetadata {
            release_date: Some(at().date_naive() - chrono::Duration::days(365)),
            ..ModelMetadata::default()
        };
        let cutoff_only = ModelMetadata {
            training_cutoff: Some(at().date_naive() - chrono::Duration::days(365)),
            ..ModelMetadata::default()
        };
        assert!((recency_score(&fresh, at()) - 10.0).abs() < f64::EPSILON);
        assert!((recency_score(&year_old, at()) - 5.0).abs() < f64::EPSILON);
        assert!((recency_score(&cutoff_only, at()) - 5.0).abs() < f64::EPSILON);
        assert!((recency_score(&ModelMetadata::default(), at()) - NEUTRAL_SCORE).abs() < f64::EPSILON);
    }

    #[test]
    fn rank_puts_unscored_last() {
        let scored = score_target(
            &TargetKey::new("alpha", "m1"),
            &alpha_results(),
            &alpha_metadata(),
            &WeightVector::DEFAULT,
            at(),
        )
        .unwrap();
        let empty = unscored(
            TargetKey::new("aaa", "first"),
            "missing credential",
            WeightVector::DEFAULT,
            at(),
        );
        let mut records = vec![empty, scored];
        rank(&mut records);
        assert!(records[0].is_scored());
        assert!(!records[1].is_scored());
    }
}

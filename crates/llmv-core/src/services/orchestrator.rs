//! Concurrent verification orchestrator.
//!
//! A bounded pool of workers pulls targets from a shared queue. For every
//! (target, probe kind) pair a worker:
//!
//! 1. serves the result from the cache when a live entry exists;
//! 2. otherwise asks the provider's breaker for admission and records
//!    `BreakerOpen` without any network call when it is rejected;
//! 3. otherwise runs the probe through the retry helper, with the breaker
//!    observing every attempt.
//!
//! Results stream back over a channel to the collector, which appends them to
//! the result sink as they arrive. A run-scoped cancellation token is shared by
//! the deadline watchdog, the operator, and every suspension point: once it
//! fires no new probe is dispatched, in-flight probes finish or time out, and
//! the run is reported as partial.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::circuit_breaker::{Admission, BreakerTable};
use super::result_cache::{CacheLookup, ResultCache};
use super::retry::{RetryGate, RetryPolicy, RetryStop, run_with_retry};
use super::scoring::{score_target, unscored};
use super::target_set::{SkipReason, SkippedTarget, TargetSet};
use crate::domain::{
    CacheKey, ProbeAttempt, ProbeKind, ProbeOutcome, ProbeResult, ScoreRecord, Target,
    WeightVector,
};
use crate::ports::{CapabilityProber, Clock, CoreError, RepositoryError, ResultSink};
use crate::settings::VerifierConfig;

/// Orchestrator tuning, derived from [`VerifierConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorConfig {
    pub concurrency: usize,
    pub probe_timeout: Duration,
    pub global_deadline: Option<Duration>,
    pub probe_kinds: Vec<ProbeKind>,
    pub retry: RetryPolicy,
}

impl OrchestratorConfig {
    pub fn from_config(config: &VerifierConfig) -> Self {
        Self {
            concurrency: config.concurrency.max(1),
            probe_timeout: config.probe_timeout(),
            global_deadline: config.global_deadline(),
            probe_kinds: config.probe_kinds.clone(),
            retry: RetryPolicy::from_config(config),
        }
    }

    /// Configured kinds, deduplicated, with `Existence` first when present.
    fn dispatch_order(&self) -> Vec<ProbeKind> {
        let mut kinds: Vec<ProbeKind> = Vec::with_capacity(self.probe_kinds.len());
        if self.probe_kinds.contains(&ProbeKind::Existence) {
            kinds.push(ProbeKind::Existence);
        }
        for kind in &self.probe_kinds {
            if !kinds.contains(kind) {
                kinds.push(*kind);
            }
        }
        kinds
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self::from_config(&VerifierConfig::with_defaults())
    }
}

/// Why a run ended early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PartialReason {
    DeadlineExceeded,
    Cancelled,
}

impl fmt::Display for PartialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeadlineExceeded => f.write_str("global deadline exceeded"),
            Self::Cancelled => f.write_str("cancelled by operator"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunStatus {
    Complete,
    Partial { reason: PartialReason },
}

impl RunStatus {
    pub const fn is_partial(self) -> bool {
        matches!(self, Self::Partial { .. })
    }
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub status: RunStatus,
    pub results: Vec<ProbeResult>,
    pub skipped: Vec<SkippedTarget>,
    /// Pairs never dispatched because the run was cut short.
    pub undispatched: usize,
    /// Pairs not dispatched because `Existence` was terminal for the target.
    pub short_circuited: usize,
    pub cache_hits: usize,
    pub network_probes: usize,
    pub sink_failures: usize,
}

impl RunReport {
    /// Count of results per outcome, in taxonomy order, omitting zeros.
    pub fn summary(&self) -> Vec<(ProbeOutcome, usize)> {
        ProbeOutcome::ALL
            .into_iter()
            .map(|outcome| {
                let count = self.results.iter().filter(|r| r.outcome == outcome).count();
                (outcome, count)
            })
            .filter(|(_, count)| *count > 0)
            .collect()
    }

    /// Results that ran out of retries.
    pub fn failed(&self) -> impl Iterator<Item = &ProbeResult> {
        self.results.iter().filter(|r| r.is_failed())
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct WorkerStats {
    cache_hits: usize,
    network_probes: usize,
    short_circuited: usize,
    undispatched: usize,
}

impl WorkerStats {
    const fn absorb(&mut self, other: Self) {
        self.cache_hits += other.cache_hits;
        self.network_probes += other.network_probes;
        self.short_circuited += other.short_circuited;
        self.undispatched += other.undispatched;
    }
}

/// Shared dependencies handed to each worker.
#[derive(Clone)]
struct WorkerDeps {
    prober: Arc<dyn CapabilityProber>,
    cache: Arc<ResultCache>,
    breakers: Arc<BreakerTable>,
    clock: Arc<dyn Clock>,
    config: Arc<OrchestratorConfig>,
}

/// Feeds each attempt to the provider breaker and re-asks admission
/// before every retry.
struct BreakerGate<'a> {
    breakers: &'a BreakerTable,
    provider_id: &'a str,
    admission: Admission,
}

#[async_trait]
impl RetryGate for BreakerGate<'_> {
    async fn observe(&mut self, attempt: &ProbeAttempt) {
        self.breakers
            .record(self.provider_id, self.admission, attempt.outcome)
            .await;
    }

    async fn permit_retry(&mut self) -> Result<(), String> {
        let admission = self.breakers.admit(self.provider_id).await;
        if admission.is_rejected() {
            return Err("retry halted: provider circuit opened".to_string());
        }
        self.admission = admission;
        Ok(())
    }
}

/// The verification pipeline's scheduler.
pub struct VerificationOrchestrator {
    deps: WorkerDeps,
    sink: Arc<dyn ResultSink>,
}

impl VerificationOrchestrator {
    pub fn new(
        prober: Arc<dyn CapabilityProber>,
        cache: Arc<ResultCache>,
        breakers: Arc<BreakerTable>,
        sink: Arc<dyn ResultSink>,
        clock: Arc<dyn Clock>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            deps: WorkerDeps {
                prober,
                cache,
                breakers,
                clock,
                config: Arc::new(config),
            },
            sink,
        }
    }

    pub const fn cache(&self) -> &Arc<ResultCache> {
        &self.deps.cache
    }

    pub const fn breakers(&self) -> &Arc<BreakerTable> {
        &self.deps.breakers
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.deps.config
    }

    /// Seed the cache from results persisted within the last TTL.
    pub async fn warm_cache(&self) -> Result<usize, RepositoryError> {
        let ttl = chrono::Duration::from_std(self.deps.cache.ttl()).unwrap_or(chrono::Duration::MAX);
        let since = self
            .deps
            .clock
            .now()
            .checked_sub_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let results = self.sink.probes_since(since).await?;
        let seeded = self.deps.cache.warm(results).await;
        info!(seeded, "Warmed result cache from sink");
        Ok(seeded)
    }

    /// Probe every target in the set.
    ///
    /// `cancel` is the operator's abort signal. The configured global
    /// deadline cancels a child of it.
    pub async fn run(&self, target_set: &TargetSet, cancel: CancellationToken) -> RunReport {
        let run_id = Uuid::new_v4();
        let started_at = self.deps.clock.now();
        let kinds_per_target = self.deps.config.dispatch_order().len();

        info!(
            %run_id,
            targets = target_set.len(),
            skipped = target_set.skipped().len(),
            concurrency = self.deps.config.concurrency,
            "Verification run starting"
        );
        for skipped in target_set.skipped() {
            warn!(target_key = %skipped.target, reason = %skipped.reason, "Target skipped");
        }

        let run_cancel = cancel.child_token();
        let deadline_hit = Arc::new(AtomicBool::new(false));
        let watchdog = self.deps.config.global_deadline.map(|deadline| {
            let token = run_cancel.clone();
            let flag = Arc::clone(&deadline_hit);
            tokio::spawn(async move {
                tokio::select! {
                    () = token.cancelled() => {}
                    () = tokio::time::sleep(deadline) => {
                        flag.store(true, Ordering::SeqCst);
                        warn!(deadline_secs = deadline.as_secs(), "Global deadline reached; no new probes will be dispatched");
                        token.cancel();
                    }
                }
            })
        });

        let queue: Arc<Mutex<VecDeque<Arc<Target>>>> = Arc::new(Mutex::new(
            target_set.targets().iter().cloned().map(Arc::new).collect(),
        ));
        let (tx, mut rx) = mpsc::unbounded_channel::<ProbeResult>();

        let worker_count = self.deps.config.concurrency.min(target_set.len()).max(1);
        let mut workers = JoinSet::new();
        for worker_id in 0..worker_count {
            workers.spawn(worker_loop(
                worker_id,
                self.deps.clone(),
                Arc::clone(&queue),
                tx.clone(),
                run_cancel.clone(),
            ));
        }
        drop(tx);

        let mut results = Vec::new();
        let mut sink_failures = 0;
        while let Some(result) = rx.recv().await {
            if let Err(e) = self.sink.append_probe(&result).await {
                sink_failures += 1;
                warn!(target_key = %result.target, kind = %result.kind, error = %e, "Failed to persist probe result");
            }
            results.push(result);
        }

        let mut stats = WorkerStats::default();
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(worker_stats) => stats.absorb(worker_stats),
                Err(e) => warn!(error = %e, "Probe worker task failed"),
            }
        }

        // Targets still queued were never picked up
        stats.undispatched += queue.lock().await.len() * kinds_per_target;

        let interrupted = run_cancel.is_cancelled();
        run_cancel.cancel();
        if let Some(handle) = watchdog {
            let _ = handle.await;
        }

        let status = if !interrupted {
            RunStatus::Complete
        } else if deadline_hit.load(Ordering::SeqCst) {
            RunStatus::Partial {
                reason: PartialReason::DeadlineExceeded,
            }
        } else {
            RunStatus::Partial {
                reason: PartialReason::Cancelled,
            }
        };

        let report = RunReport {
            run_id,
            started_at,
            finished_at: self.deps.clock.now(),
            status,
            results,
            skipped: target_set.skipped().to_vec(),
            undispatched: stats.undispatched,
            short_circuited: stats.short_circuited,
            cache_hits: stats.cache_hits,
            network_probes: stats.network_probes,
            sink_failures,
        };

        info!(
            %run_id,
            results = report.results.len(),
            cache_hits = report.cache_hits,
            network_probes = report.network_probes,
            undispatched = report.undispatched,
            partial = report.status.is_partial(),
            "Verification run finished"
        );
        report
    }

    /// Score every target of a run and append the records to the sink.
    ///
    /// Skipped targets receive an explicit unscored record. Records come back
    /// in target-set order, skipped targets last.
    pub async fn score_run(
        &self,
        report: &RunReport,
        target_set: &TargetSet,
        weights: &WeightVector,
        computed_at: DateTime<Utc>,
    ) -> Result<Vec<ScoreRecord>, CoreError> {
        weights.validate()?;

        let mut records = Vec::with_capacity(target_set.len() + report.skipped.len());
        for target in target_set.targets() {
            let record = score_target(
                &target.key,
                &report.results,
                &target.metadata,
                weights,
                computed_at,
            )?;
            records.push(record);
        }
        for skipped in &report.skipped {
            let reason = match skipped.reason {
                SkipReason::MissingCredential => "missing credential",
                SkipReason::UnknownProvider => "unknown provider",
            };
            records.push(unscored(
                skipped.target.clone(),
                reason,
                *weights,
                computed_at,
            ));
        }

        for record in &records {
            self.sink.append_score(record).await?;
        }
        Ok(records)
    }
}

async fn worker_loop(
    worker_id: usize,
    deps: WorkerDeps,
    queue: Arc<Mutex<VecDeque<Arc<Target>>>>,
    tx: mpsc::UnboundedSender<ProbeResult>,
    cancel: CancellationToken,
) -> WorkerStats {
    let mut stats = WorkerStats::default();
    let kinds = deps.config.dispatch_order();

    loop {
        if cancel.is_cancelled() {
            break;
        }
        let Some(target) = queue.lock().await.pop_front() else {
            break;
        };
        debug!(worker_id, target_key = %target.key, "Worker picked target");

        for (index, kind) in kinds.iter().copied().enumerate() {
            if cancel.is_cancelled() {
                stats.undispatched += kinds.len() - index;
                break;
            }

            let result = probe_pair(&deps, &target, kind, &cancel, &mut stats).await;
            let terminal_existence = kind == ProbeKind::Existence
                && matches!(
                    result.outcome,
                    ProbeOutcome::AuthFailure
                        | ProbeOutcome::NotFound
                        | ProbeOutcome::MissingCredential
                );
            let _ = tx.send(result);

            if terminal_existence {
                let remaining = kinds.len() - index - 1;
                stats.short_circuited += remaining;
                debug!(target_key = %target.key, remaining, "Existence probe terminal; skipping remaining kinds");
                break;
            }
        }
    }

    stats
}

async fn probe_pair(
    deps: &WorkerDeps,
    target: &Target,
    kind: ProbeKind,
    cancel: &CancellationToken,
    stats: &mut WorkerStats,
) -> ProbeResult {
    let key = CacheKey::new(&target.key, kind);
    if let CacheLookup::Hit(cached) = deps.cache.get(&key).await {
        stats.cache_hits += 1;
        debug!(cache_key = %key, outcome = %cached.outcome, "Cache hit");
        return cached;
    }

    let provider_id = target.provider_id();
    let admission = deps.breakers.admit(provider_id).await;
    if let Admission::Rejected { retry_in } = admission {
        debug!(cache_key = %key, "Provider circuit open; probe rejected");
        return ProbeResult::not_attempted(
            target.key.clone(),
            kind,
            ProbeOutcome::BreakerOpen,
            format!("provider circuit open; retry in {}s", retry_in.as_secs()),
            deps.clock.now(),
        );
    }

    let timeout = deps.config.probe_timeout;
    let mut gate = BreakerGate {
        breakers: &deps.breakers,
        provider_id,
        admission,
    };
    let prober = &deps.prober;
    let report = run_with_retry(&deps.config.retry, cancel, &mut gate, |attempt| async move {
        debug!(provider = %target.provider_id(), model = %target.model_id(), %kind, attempt, "Dispatching probe");
        match tokio::time::timeout(timeout, prober.probe(target, kind, timeout)).await {
            Ok(observed) => observed,
            Err(_) => ProbeAttempt::new(ProbeOutcome::Timeout, timeout).with_detail(format!(
                "no response within {}ms",
                timeout.as_millis()
            )),
        }
    })
    .await;

    let mut result = ProbeResult::from_attempt(
        target.key.clone(),
        kind,
        &report.last,
        report.attempts,
        deps.clock.now(),
    );
    result.retries_exhausted = report.stop == RetryStop::Exhausted;
    result.reason = report.reason();
    if result.outcome.was_attempted() {
        stats.network_probes += 1;
    } else {
        // e.g. the credential vanished between target-set build and dispatch
        result.attempts = 0;
    }

    debug!(
        cache_key = %key,
        outcome = %result.outcome,
        attempts = result.attempts,
        latency_ms = result.latency_ms,
        "Probe finished"
    );

    deps.cache.set(result.clone()).await;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AuthStyle, CredentialRef, ModelMetadata, ModelTarget, ProviderTarget, RegistrySnapshot};
    use crate::ports::ManualClock;
    use crate::ports::result_sink::MockResultSink;
    use crate::services::circuit_breaker::BreakerConfig;
    use crate::services::target_set::build_target_set;
    use std::sync::atomic::AtomicUsize;

    /// Prober that answers every probe with a fixed outcome and counts calls.
    struct FixedProber {
        outcome: ProbeOutcome,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CapabilityProber for FixedProber {
        async fn probe(&self, _target: &Target, _kind: ProbeKind, _timeout: Duration) -> ProbeAttempt {
            self.calls.fetch_add(1, Ordering::SeqCst);
            ProbeAttempt::new(self.outcome, Duration::from_millis(20))
        }
    }

    fn snapshot() -> RegistrySnapshot {
        RegistrySnapshot {
            providers: vec![ProviderTarget {
                id: "alpha".to_string(),
                base_url: "https://alpha.test/v1".to_string(),
                credential: Some(CredentialRef::new("env:ALPHA")),
                auth_style: AuthStyle::Bearer,
            }],
            models: vec![ModelTarget {
                provider_id: "alpha".to_string(),
                model_id: "m1".to_string(),
                metadata: ModelMetadata::default(),
            }],
        }
    }

    fn orchestrator(prober: Arc<dyn CapabilityProber>, sink: MockResultSink) -> VerificationOrchestrator {
        let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(Utc::now()));
        let config = OrchestratorConfig {
            concurrency: 2,
            probe_timeout: Duration::from_secs(1),
            global_deadline: None,
            probe_kinds: vec![ProbeKind::Responsiveness, ProbeKind::Existence],
            retry: RetryPolicy::no_retries(),
        };
        VerificationOrchestrator::new(
            prober,
            Arc::new(ResultCache::new(Duration::from_secs(60), clock.clone())),
            Arc::new(BreakerTable::new(BreakerConfig::default(), clock.clone())),
            Arc::new(sink),
            clock,
            config,
        )
    }

    #[test]
    fn existence_is_dispatched_first() {
        let config = OrchestratorConfig {
            probe_kinds: vec![ProbeKind::Streaming, ProbeKind::Existence, ProbeKind::Streaming],
            ..OrchestratorConfig::default()
        };
        assert_eq!(
            config.dispatch_order(),
            vec![ProbeKind::Existence, ProbeKind::Streaming]
        );
    }

    #[tokio::test]
    async fn every_result_is_appended_to_sink() {
        let mut sink = MockResultSink::new();
        sink.expect_append_probe().times(2).returning(|_| Ok(()));

        let prober = Arc::new(FixedProber {
            outcome: ProbeOutcome::Success,
            calls: AtomicUsize::new(0),
        });
        let orchestrator = orchestrator(prober.clone(), sink);
        let report = orchestrator
            .run(&build_target_set(&snapshot()), CancellationToken::new())
            .await;

        assert_eq!(report.status, RunStatus::Complete);
        assert_eq!(report.results.len(), 2);
        assert_eq!(report.results[0].kind, ProbeKind::Existence);
        assert_eq!(report.sink_failures, 0);
        assert_eq!(prober.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn sink_failures_are_counted_not_fatal() {
        let mut sink = MockResultSink::new();
        sink.expect_append_probe()
            .returning(|_| Err(RepositoryError::Storage("disk full".to_string())));

        let prober = Arc::new(FixedProber {
            outcome: ProbeOutcome::Success,
            calls: AtomicUsize::new(0),
        });
        let report = orchestrator(prober, sink)
            .run(&build_target_set(&snapshot()), CancellationToken::new())
            .await;

        assert_eq!(report.results.len(), 2);
        assert_eq!(report.sink_failures, 2);
    }

    #[tokio::test]
    async fn terminal_existence_short_circuits_target() {
        let mut sink = MockResultSink::new();
        sink.expect_append_probe().times(1).returning(|_| Ok(()));

        let prober = Arc::new(FixedProber {
            outcome: ProbeOutcome::NotFound,
            calls: AtomicUsize::new(0),
        });
        let report = orchestrator(prober.clone(), sink)
            .run(&build_target_set(&snapshot()), CancellationToken::new())
            .await;

        assert_eq!(report.results.len(), 1);
        assert_eq!(report.short_circuited, 1);
        assert_eq!(prober.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unresolvable_credential_is_not_a_network_probe() {
        let mut sink = MockResultSink::new();
        sink.expect_append_probe().times(1).returning(|_| Ok(()));

        let prober = Arc::new(FixedProber {
            outcome: ProbeOutcome::MissingCredential,
            calls: AtomicUsize::new(0),
        });
        let report = orchestrator(prober.clone(), sink)
            .run(&build_target_set(&snapshot()), CancellationToken::new())
            .await;

        assert_eq!(report.results.len(), 1);
        assert_eq!(report.results[0].kind, ProbeKind::Existence);
        assert_eq!(report.results[0].outcome, ProbeOutcome::MissingCredential);
        assert_eq!(report.results[0].attempts, 0);
        assert_eq!(report.network_probes, 0);
        assert_eq!(report.short_circuited, 1);
        assert_eq!(prober.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cancelled_run_is_partial_and_dispatches_nothing() {
        let mut sink = MockResultSink::new();
        sink.expect_append_probe().never();

        let prober = Arc::new(FixedProber {
            outcome: ProbeOutcome::Success,
            calls: AtomicUsize::new(0),
        });
        let cancel = CancellationToken::new();
        cancel.cancel();
        let report = orchestrator(prober.clone(), sink)
            .run(&build_target_set(&snapshot()), cancel)
            .await;

        assert_eq!(
            report.status,
            RunStatus::Partial {
                reason: PartialReason::Cancelled
            }
        );
        assert_eq!(report.undispatched, 2);
        assert_eq!(prober.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn score_run_appends_scores_and_unscored_for_skipped() {
        let mut sink = MockResultSink::new();
        sink.expect_append_probe().returning(|_| Ok(()));
        sink.expect_append_score().times(2).returning(|_| Ok(()));

        let mut snapshot = snapshot();
        snapshot.providers.push(ProviderTarget {
            id: "gamma".to_string(),
            base_url: "https://gamma.test".to_string(),
            credential: None,
            auth_style: AuthStyle::Bearer,
        });
        snapshot.models.push(ModelTarget {
            provider_id: "gamma".to_string(),
            model_id: "g1".to_string(),
            metadata: ModelMetadata::default(),
        });
        let target_set = build_target_set(&snapshot);

        let prober = Arc::new(FixedProber {
            outcome: ProbeOutcome::Success,
            calls: AtomicUsize::new(0),
        });
        let orchestrator = orchestrator(prober, sink);
        let report = orchestrator.run(&target_set, CancellationToken::new()).await;
        let records = orchestrator
            .score_run(&report, &target_set, &WeightVector::DEFAULT, Utc::now())
            .await
            .unwrap();

        assert_eq!(records.len(), 2);
        assert!(records[0].is_scored());
        assert!(!records[1].is_scored());
        assert_eq!(records[1].target.provider_id, "gamma");
    }

    #[tokio::test]
    async fn score_run_rejects_bad_weights() {
        let sink = MockResultSink::new();
        let prober = Arc::new(FixedProber {
            outcome: ProbeOutcome::Success,
            calls: AtomicUsize::new(0),
        });
        let orchestrator = orchestrator(prober, sink);
        let report = RunReport {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: Utc::now(),
            status: RunStatus::Complete,
            results: Vec::new(),
            skipped: Vec::new(),
            undispatched: 0,
            short_circuited: 0,
            cache_hits: 0,
            network_probes: 0,
            sink_failures: 0,
        };
        let weights = WeightVector {
            recency: 0.5,
            ..WeightVector::DEFAULT
        };
        let result = orchestrator
            .score_run(&report, &TargetSet::default(), &weights, Utc::now())
            .await;
        assert!(matches!(result, Err(CoreError::Config(_))));
    }

    #[tokio::test]
    async fn warm_cache_reads_sink_window() {
        let mut sink = MockResultSink::new();
        sink.expect_probes_since().times(1).returning(|_| {
            Ok(vec![ProbeResult::from_attempt(
                crate::domain::TargetKey::new("alpha", "m1"),
                ProbeKind::Existence,
                &ProbeAttempt::new(ProbeOutcome::Success, Duration::from_millis(5)),
                1,
                Utc::now(),
            )])
        });
        let prober = Arc::new(FixedProber {
            outcome: ProbeOutcome::Success,
            calls: AtomicUsize::new(0),
        });
        let orchestrator = orchestrator(prober, sink);
        assert_eq!(orchestrator.warm_cache().await.unwrap(), 1);
        assert_eq!(orchestrator.cache().len().await, 1);
    }
}

#![doc = include_str!("../README.md")]
#![deny(unused_crate_dependencies)]

pub mod domain;
pub mod ports;
pub mod services;
pub mod settings;

#[cfg(test)]
use tokio_test as _;

// Re-export commonly used types for convenience
pub use domain::{
    AdvertisedFeatures, AuthStyle, CacheKey, CredentialRef, ModelMetadata, ModelTarget,
    ProbeAttempt, ProbeKind, ProbeOutcome, ProbeResult, ProviderTarget, RegistrySnapshot,
    ScoreComponents, ScoreOutcome, ScoreRecord, Target, TargetKey, WeightVector,
};
pub use ports::{
    CapabilityProber, Clock, CoreError, CredentialResolver, ManualClock, Registry,
    RepositoryError, ResultHistory, ResultSink, Secret, StaticRegistry, Stores, SystemClock,
};
pub use services::{
    BreakerConfig, BreakerTable, OrchestratorConfig, ResultCache, RetryPolicy, RunReport,
    RunStatus, TargetSet, VerificationOrchestrator, build_target_set, score_target,
};
pub use settings::{ConfigError, ConfigOverrides, VerifierConfig};

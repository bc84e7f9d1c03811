//! Domain types for the verification-and-scoring pipeline.
//!
//! These types are pure data. They carry no HTTP or SQL dependencies and are
//! shared by every adapter crate.

mod features;
mod probe;
mod score;
mod target;

pub use features::AdvertisedFeatures;
pub use probe::{
    CacheKey, ParseNameError, ProbeAttempt, ProbeKind, ProbeOutcome, ProbeResult, duration_to_ms,
};
pub use score::{ScoreComponents, ScoreOutcome, ScoreRecord, WEIGHT_SUM_TOLERANCE, WeightVector};
pub use target::{
    AuthStyle, CredentialRef, ModelMetadata, ModelTarget, ProviderTarget, RegistrySnapshot,
    Target, TargetKey,
};

//! Verification services.
//!
//! Everything here depends only on domain types and ports. Adapters are
//! injected by the composition root.

pub mod circuit_breaker;
pub mod orchestrator;
pub mod result_cache;
pub mod retry;
pub mod scoring;
pub mod target_set;

pub use circuit_breaker::{Admission, BreakerConfig, BreakerPhase, BreakerState, BreakerTable};
pub use orchestrator::{
    OrchestratorConfig, PartialReason, RunReport, RunStatus, VerificationOrchestrator,
};
pub use result_cache::{CacheLookup, ResultCache};
pub use retry::{OpenGate, RetryGate, RetryPolicy, RetryReport, RetryStop, run_with_retry};
pub use scoring::{rank, score_target, unscored};
pub use target_set::{SkipReason, SkippedTarget, TargetSet, build_target_set};

//! `llmv verify`: probe, score, persist and print one run.

use anyhow::Result;
use llmv_core::services::rank;
use llmv_core::{RegistrySnapshot, RunReport, ScoreRecord, build_target_set};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::bootstrap::CliContext;
use crate::commands::VerifyArgs;
use crate::config::load_verifier_config;
use crate::error::CliError;
use crate::handlers::import::read_snapshot;
use crate::presentation::{
    SCORE_TABLE_WIDTH, print_separator, run_summary_lines, score_header, score_row,
};

/// Everything a verify run produced, already persisted.
#[derive(Debug)]
pub struct VerifyOutcome {
    pub report: RunReport,
    /// Ranked best first.
    pub scores: Vec<ScoreRecord>,
}

pub async fn execute(ctx: &CliContext, args: &VerifyArgs) -> Result<()> {
    let cancel = CancellationToken::new();
    let watcher = spawn_interrupt_watcher(cancel.clone());
    let outcome = run(ctx, args, cancel).await;
    watcher.abort();

    match outcome? {
        Some(outcome) => print_outcome(&outcome),
        None => println!(
            "No models to verify. Import a registry with `llmv import <file>` or pass --registry."
        ),
    }
    Ok(())
}

/// Run the pipeline without printing. `None` means the registry was empty.
///
/// A cut-short run is still `Ok`; only configuration and storage problems
/// are errors.
pub async fn run(
    ctx: &CliContext,
    args: &VerifyArgs,
    cancel: CancellationToken,
) -> Result<Option<VerifyOutcome>> {
    let config = load_verifier_config(args)?;
    let snapshot = load_snapshot(ctx, args).await?;

    let target_set = build_target_set(&snapshot);
    if target_set.is_empty() && target_set.skipped().is_empty() {
        return Ok(None);
    }

    let orchestrator = ctx.build_orchestrator(&config)?;
    if !args.no_warm {
        let warmed = orchestrator.warm_cache().await.map_err(CliError::from)?;
        info!(warmed, "Warmed result cache from database");
    }

    let report = orchestrator.run(&target_set, cancel).await;
    let mut scores = orchestrator
        .score_run(&report, &target_set, &config.weights, ctx.clock().now())
        .await
        .map_err(CliError::from)?;
    rank(&mut scores);

    Ok(Some(VerifyOutcome { report, scores }))
}

async fn load_snapshot(ctx: &CliContext, args: &VerifyArgs) -> Result<RegistrySnapshot> {
    match &args.registry {
        Some(path) => Ok(read_snapshot(path)?),
        None => Ok(ctx
            .stores()
            .registry
            .snapshot()
            .await
            .map_err(CliError::from)?),
    }
}

/// Cancel the run on the first Ctrl-C.
fn spawn_interrupt_watcher(cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                warn!("Interrupted; finishing in-flight probes");
                cancel.cancel();
            }
            Err(e) => warn!(error = %e, "Cannot listen for Ctrl-C"),
        }
    })
}

fn print_outcome(outcome: &VerifyOutcome) {
    for line in run_summary_lines(&outcome.report) {
        println!("{line}");
    }
    println!();
    println!("{}", score_header());
    print_separator(SCORE_TABLE_WIDTH);
    for (index, record) in outcome.scores.iter().enumerate() {
        println!("{}", score_row(index + 1, record));
    }
}

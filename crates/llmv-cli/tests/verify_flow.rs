//! End-to-end command flow against a temporary database.
//!
//! Registries here never carry a resolvable credential, so no request
//! leaves the process.

use std::io::Write;
use std::path::Path;

use llmv_cli::commands::VerifyArgs;
use llmv_cli::handlers::{import, scores, verify};
use llmv_cli::{CliConfig, CliContext, bootstrap};
use llmv_core::{ProbeOutcome, TargetKey};
use tokio_util::sync::CancellationToken;

const REGISTRY: &str = r#"{
    "providers": [
        {"id": "keyless", "base_url": "https://keyless.test/v1"},
        {"id": "unset", "base_url": "https://unset.test/v1", "credential": "env:LLMV_TEST_KEY_THAT_IS_NEVER_SET"}
    ],
    "models": [
        {"provider_id": "keyless", "model_id": "k1"},
        {"provider_id": "unset", "model_id": "u1"},
        {"provider_id": "ghost", "model_id": "g1"}
    ]
}"#;

fn write_file(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path
}

async fn context(dir: &Path) -> CliContext {
    bootstrap(CliConfig::new(dir.join("llmv.db"))).await.unwrap()
}

#[tokio::test]
async fn verify_with_registry_file_scores_every_target() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path()).await;
    let args = VerifyArgs {
        registry: Some(write_file(dir.path(), "registry.json", REGISTRY)),
        ..VerifyArgs::default()
    };

    let outcome = verify::run(&ctx, &args, CancellationToken::new())
        .await
        .unwrap()
        .expect("registry is not empty");

    assert!(!outcome.report.status.is_partial());
    assert_eq!(outcome.report.skipped.len(), 2);
    // the unresolvable credential ends the target after Existence
    assert_eq!(outcome.report.results.len(), 1);
    assert_eq!(outcome.report.network_probes, 0);
    assert!(
        outcome
            .report
            .results
            .iter()
            .all(|r| r.outcome == ProbeOutcome::MissingCredential)
    );

    assert_eq!(outcome.scores.len(), 3);
    assert!(outcome.scores.iter().all(|s| !s.is_scored()));

    let stored = ctx.stores().history.latest_scores(10).await.unwrap();
    assert_eq!(stored.len(), 3);

    let history = ctx
        .stores()
        .history
        .probe_history(&TargetKey::new("unset", "u1"), 50)
        .await
        .unwrap();
    assert_eq!(history.len(), outcome.report.results.len());
}

#[tokio::test]
async fn verify_reads_imported_registry_from_database() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path()).await;

    import::execute(&ctx, &write_file(dir.path(), "registry.json", REGISTRY))
        .await
        .unwrap();
    let snapshot = ctx.stores().registry.snapshot().await.unwrap();
    assert_eq!(snapshot.providers.len(), 2);
    assert_eq!(snapshot.models.len(), 3);

    let outcome = verify::run(&ctx, &VerifyArgs::default(), CancellationToken::new())
        .await
        .unwrap()
        .expect("imported registry is not empty");
    assert_eq!(outcome.scores.len(), 3);

    scores::execute(&ctx, 10).await.unwrap();
}

#[tokio::test]
async fn empty_registry_is_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path()).await;

    let outcome = verify::run(&ctx, &VerifyArgs::default(), CancellationToken::new())
        .await
        .unwrap();
    assert!(outcome.is_none());
}

#[tokio::test]
async fn invalid_config_fails_before_any_probe() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path()).await;
    let args = VerifyArgs {
        registry: Some(write_file(dir.path(), "registry.json", REGISTRY)),
        config: Some(write_file(dir.path(), "config.json", r#"{"probe_kinds": []}"#)),
        ..VerifyArgs::default()
    };

    let err = verify::run(&ctx, &args, CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(llmv_cli::exit_code_for(&err), 78);
    assert!(ctx.stores().history.latest_scores(10).await.unwrap().is_empty());
}

#[tokio::test]
async fn malformed_registry_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path()).await;

    let err = import::execute(&ctx, &write_file(dir.path(), "bad.json", "{ not json"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("invalid registry file"));
}

#[tokio::test]
async fn cancelled_run_is_partial_but_ok() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path()).await;
    let args = VerifyArgs {
        registry: Some(write_file(dir.path(), "registry.json", REGISTRY)),
        ..VerifyArgs::default()
    };

    let cancel = CancellationToken::new();
    cancel.cancel();
    let outcome = verify::run(&ctx, &args, cancel).await.unwrap().unwrap();

    assert!(outcome.report.status.is_partial());
    assert_eq!(outcome.scores.len(), 3);
}

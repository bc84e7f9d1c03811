//! `llmv import`: load a registry snapshot file into the database.

use std::fs;
use std::path::Path;

use anyhow::Result;
use llmv_core::RegistrySnapshot;

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Read and parse a registry snapshot file.
pub fn read_snapshot(path: &Path) -> Result<RegistrySnapshot, CliError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| CliError::Io(format!("cannot read {}: {e}", path.display())))?;
    RegistrySnapshot::from_json_str(&raw)
        .map_err(|e| CliError::Config(format!("invalid registry file {}: {e}", path.display())))
}

pub async fn execute(ctx: &CliContext, file: &Path) -> Result<()> {
    let snapshot = read_snapshot(file)?;
    let summary = ctx
        .registry()
        .import_snapshot(&snapshot)
        .await
        .map_err(CliError::from)?;

    println!(
        "Imported {} provider(s) and {} model(s) into {}",
        summary.providers,
        summary.models,
        ctx.db_path().display()
    );
    Ok(())
}

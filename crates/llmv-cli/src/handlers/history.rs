//! `llmv history`: recent probe results for one target.

use anyhow::Result;
use llmv_core::TargetKey;

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::presentation::{HISTORY_TABLE_WIDTH, history_header, history_row, print_separator};

pub async fn execute(ctx: &CliContext, provider: &str, model: &str, limit: u32) -> Result<()> {
    let target = TargetKey::new(provider, model);
    let results = ctx
        .stores()
        .history
        .probe_history(&target, limit)
        .await
        .map_err(CliError::from)?;

    if results.is_empty() {
        println!("No probe results for {target}");
        return Ok(());
    }

    println!("Probe history for {target} (newest first, * = served from cache)");
    println!();
    println!("{}", history_header());
    print_separator(HISTORY_TABLE_WIDTH);
    for result in &results {
        println!("{}", history_row(result));
    }
    Ok(())
}

//! `llmv scores`: latest score per target, best first.

use anyhow::Result;

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::presentation::{SCORE_TABLE_WIDTH, print_separator, score_header, score_row};

pub async fn execute(ctx: &CliContext, limit: u32) -> Result<()> {
    let records = ctx
        .stores()
        .history
        .latest_scores(limit)
        .await
        .map_err(CliError::from)?;

    if records.is_empty() {
        println!("No scores recorded yet. Run `llmv verify` first.");
        return Ok(());
    }

    println!("{}", score_header());
    print_separator(SCORE_TABLE_WIDTH);
    for (index, record) in records.iter().enumerate() {
        println!("{}", score_row(index + 1, record));
    }
    Ok(())
}

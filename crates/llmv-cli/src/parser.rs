//! Main CLI parser and top-level argument handling.
//!
//! This module defines the root CLI structure with global options.

use std::path::PathBuf;

use clap::Parser;

use crate::commands::Commands;

/// Command-line interface for verifying and scoring LLM providers.
#[derive(Parser)]
#[command(name = "llmv")]
#[command(about = "Verify LLM provider capabilities and rank models")]
#[command(version)]
pub struct Cli {
    /// Path to the SQLite database
    #[arg(long = "db", env = "LLMV_DB", default_value = "llmv.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

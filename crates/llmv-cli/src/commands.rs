//! Subcommand definitions.

use std::path::PathBuf;

use clap::{Args, Subcommand};

#[derive(Subcommand)]
pub enum Commands {
    /// Probe every registered model, then score and rank them
    Verify(VerifyArgs),

    /// Load a registry snapshot file into the database
    Import {
        /// Registry snapshot (JSON)
        file: PathBuf,
    },

    /// Show the latest score per model, best first
    Scores {
        /// Maximum number of rows
        #[arg(short, long, default_value = "50")]
        limit: u32,
    },

    /// Show recent probe results for one model
    History {
        /// Provider id
        provider: String,
        /// Model id
        model: String,
        /// Maximum number of rows
        #[arg(short, long, default_value = "20")]
        limit: u32,
    },
}

/// Options for `llmv verify`.
#[derive(Args, Debug, Clone, Default)]
pub struct VerifyArgs {
    /// Registry snapshot to verify instead of the one stored in the database
    #[arg(long)]
    pub registry: Option<PathBuf>,

    /// Verifier configuration file (JSON)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Number of concurrent probe workers
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Per-attempt probe timeout in milliseconds
    #[arg(long = "probe-timeout-ms")]
    pub probe_timeout_ms: Option<u64>,

    /// Global run deadline in seconds (0 disables it)
    #[arg(long = "deadline-secs")]
    pub deadline_secs: Option<u64>,

    /// Do not seed the cache from stored results
    #[arg(long = "no-warm")]
    pub no_warm: bool,
}

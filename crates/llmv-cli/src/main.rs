//! CLI entry point - the composition root.
//!
//! Infrastructure is wired together only through [`bootstrap`]; handlers
//! receive the resulting `CliContext`.

use std::process::ExitCode;

use clap::Parser;

use llmv_cli::{Cli, CliConfig, Commands, bootstrap, exit_code_for, handlers, init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(exit_code_for(&e))
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let ctx = bootstrap(CliConfig::new(cli.db)).await?;

    match cli.command {
        Commands::Verify(args) => handlers::verify::execute(&ctx, &args).await,
        Commands::Import { file } => handlers::import::execute(&ctx, &file).await,
        Commands::Scores { limit } => handlers::scores::execute(&ctx, limit).await,
        Commands::History {
            provider,
            model,
            limit,
        } => handlers::history::execute(&ctx, &provider, &model, limit).await,
    }
}

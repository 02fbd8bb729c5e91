mod cli;
mod commands;

use anyhow::{bail, Result};
use clap::Parser;
use std::process::ExitCode;
use tracing::debug;

use crate::cli::Args;
use crate::commands::{Outcome, RunOptions, Target};

fn main() -> Result<ExitCode> {
    // Pick up GCP_API from a local .env before clap reads the environment
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(args.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    debug!(chunk_size = args.chunk_size, "arguments parsed");

    let config = args.to_config();
    let target = match (&args.url, &args.address) {
        (Some(url), _) => Target::Url(url.clone()),
        (None, Some(address)) => Target::Address(address.clone()),
        (None, None) => bail!("either a URL or --address is required"),
    };
    let options = RunOptions {
        output: args.output.clone(),
        expected_sha256: args.sha256.clone(),
        progress: !args.no_progress && !args.quiet,
        json: args.json,
    };

    let rt = tokio::runtime::Runtime::new()?;
    let outcome = rt.block_on(crate::commands::run_fetch(config, target, options))?;

    Ok(match outcome {
        Outcome::Completed => ExitCode::SUCCESS,
        Outcome::SizeMismatch => ExitCode::from(2),
    })
}

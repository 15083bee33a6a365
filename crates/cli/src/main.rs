mod cli;
mod commands;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use metricbench_core::config::load_dotenv;
use metricbench_core::Config;

use crate::cli::{CliArgs, Command};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    // .env must be loaded before parsing so clap's env fallbacks see it.
    load_dotenv();
    let args = CliArgs::parse();

    let config = match args.profile.as_deref() {
        Some(profile) => Config::for_profile(profile),
        None => Config::from_env(),
    };
    config.log_summary();

    let workers = args.workers.unwrap_or(config.evaluation.workers);
    let command = args.command;
    let run = move || match command {
        Command::Generate(a) => commands::generate(&config, a),
        Command::Evaluate(a) => commands::evaluate(&config, a),
        Command::Domains => commands::domains(),
    };

    if workers == 0 {
        return run();
    }
    info!(workers, "using dedicated worker pool");
    rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .context("failed to build worker pool")?
        .install(run)
}

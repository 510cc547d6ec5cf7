//! rostersync CLI Binary
//!
//! Runs the Directory or Editor, or one of the offline helpers.

use anyhow::Context;
use clap::Parser;
use rostersync::logging::init_logging;
use rostersync::tooling::cli::{Cli, CliContext};
use std::process;

async fn run(cli: Cli) -> anyhow::Result<String> {
    let context = CliContext::new(cli.config.clone(), cli.socket_dir.clone())
        .context("Error loading configuration")?;
    init_logging(Some(&context.config().logging), &cli.log_overrides())
        .context("Error initializing logging")?;
    let output = context.execute(&cli.command).await?;
    Ok(output)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

//! fuzzowl CLI main entry point

use anyhow::Result;
use clap::Parser;
use fuzzowl_cli::commands::{Cli, CommandExecutor};

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let executor = CommandExecutor::new();
    let result = executor.execute(cli.command)?;

    if !result.message.is_empty() {
        println!("{}", result.message);
    }

    // Exit with appropriate code
    if result.success {
        std::process::exit(0);
    } else {
        std::process::exit(1);
    }
}

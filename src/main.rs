use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use plan_cost_estimator::config::{self, Config};
use plan_cost_estimator::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    match args.get_command() {
        cli::Commands::Serve => {
            let cfg = setup(&args)?;
            commands::serve::execute(cfg).await?;
        }
        cli::Commands::Check => {
            let cfg = setup(&args)?;
            commands::check::execute(&cfg)?;
        }
        cli::Commands::Quote(quote_args) => {
            let cfg = setup(&args)?;
            commands::quote::execute(&cfg, &quote_args)?;
        }
        cli::Commands::Version => {
            println!("Plan Cost Estimator v{}", env!("CARGO_PKG_VERSION"));
            println!(
                "Artifact format version {}",
                plan_cost_estimator::artifacts::FORMAT_VERSION
            );
        }
    }

    Ok(())
}

/// Load configuration and start logging. Configuration errors are fatal.
fn setup(args: &cli::Cli) -> Result<Config> {
    let cfg = config::load_config(args.config.as_deref())?;
    init_tracing(&cfg.server);
    Ok(cfg)
}

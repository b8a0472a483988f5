//! DealScout CLI binary

use anyhow::Context;
use clap::Parser;
use dealscout::cli::{Cli, Commands, DealScoutApp};
use dealscout::{Listing, StrategyTier};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if cli.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    let app = DealScoutApp::from_config_file(cli.config.as_deref())
        .context("failed to load engine configuration")?;

    match cli.command {
        Commands::Score {
            asking,
            average,
            median,
            samples,
            resale,
            fees,
        } => {
            let listing = Listing::new("cli", "command line listing", asking)?;
            let analysis = app
                .score(&listing, average, median, samples, resale, fees.as_deref())
                .context("scoring failed")?;
            println!("{}", serde_json::to_string_pretty(&analysis)?);
        }

        Commands::Bounds {
            asking,
            average,
            tier,
            rating,
            age_days,
        } => {
            let bounds = app
                .bounds(asking, average, tier.as_deref(), rating.as_deref(), age_days)
                .context("bounds computation failed")?;
            println!("{}", serde_json::to_string_pretty(&bounds)?);
        }

        Commands::Simulate {
            asking,
            average,
            tier,
            budget,
            counters,
            reject,
        } => {
            let tier = tier
                .as_deref()
                .map(str::parse::<StrategyTier>)
                .transpose()?;
            let listing = Listing::new("cli", "command line listing", asking)?;

            let outcomes = app
                .simulate(&listing, average, budget, tier, &counters, reject)
                .context("simulation failed")?;
            for outcome in outcomes {
                println!("{}", serde_json::to_string(&outcome)?);
            }
        }
    }

    Ok(())
}

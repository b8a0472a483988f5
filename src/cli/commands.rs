//! CLI command definitions

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "dealscout")]
#[command(about = "DealScout - deal scoring and buyer-side price negotiation", long_about = None)]
pub struct Cli {
    /// Engine configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Score a listing against its market estimate
    Score {
        /// Listing asking price
        #[arg(short, long)]
        asking: u64,

        /// Average sold price of comparable items
        #[arg(short = 'm', long)]
        average: Option<Decimal>,

        /// Median sold price (display only)
        #[arg(long)]
        median: Option<Decimal>,

        /// Number of comparable sales behind the estimate
        #[arg(short, long, default_value = "1")]
        samples: u32,

        /// Expected resale price when reselling on another channel
        #[arg(short, long)]
        resale: Option<Decimal>,

        /// Fee schedule name (ebay, facebook, none, or one from the config file)
        #[arg(short, long)]
        fees: Option<String>,
    },

    /// Compute negotiation bounds
    Bounds {
        /// Listing asking price
        #[arg(short, long)]
        asking: u64,

        /// Market average price
        #[arg(short = 'm', long)]
        average: Option<u64>,

        /// Strategy tier (shrewd, moderate, lenient, accept); auto-selected when omitted
        #[arg(short, long)]
        tier: Option<String>,

        /// Deal rating (HOT, GOOD, FAIR, PASS) used for tier selection
        #[arg(short, long)]
        rating: Option<String>,

        /// Days since the listing was posted
        #[arg(long)]
        age_days: Option<u32>,
    },

    /// Run a scripted negotiation against fixed seller counters
    Simulate {
        /// Listing asking price
        #[arg(short, long)]
        asking: u64,

        /// Market average price
        #[arg(short = 'm', long)]
        average: Option<u64>,

        /// Strategy tier; auto-selected when omitted
        #[arg(short, long)]
        tier: Option<String>,

        /// Most the buyer will pay
        #[arg(short, long)]
        budget: Option<u64>,

        /// Seller counter-offers, in order
        #[arg(long, value_delimiter = ',')]
        counters: Vec<u64>,

        /// Seller rejects once the counters run out
        #[arg(long)]
        reject: bool,
    },
}

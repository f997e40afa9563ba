//! CLI interface for auction-watch
//!
//! Provides subcommands for:
//! - `watch`: Watch listings and log change/ended events
//! - `fetch`: Fetch one listing and print its snapshot
//! - `interval`: Show the poll interval for a remaining-time string
//! - `config`: Show configuration

mod fetch;
mod interval;
mod watch;

pub use fetch::FetchArgs;
pub use interval::IntervalArgs;
pub use watch::WatchArgs;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "auction-watch")]
#[command(about = "Adaptive polling engine for marketplace auction listings")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Watch listings until their auctions end
    Watch(WatchArgs),
    /// Fetch one listing and print it as JSON
    Fetch(FetchArgs),
    /// Show the poll interval for a remaining-time string
    Interval(IntervalArgs),
    /// Show configuration
    Config,
}

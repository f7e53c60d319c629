use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::commands;

#[derive(Parser)]
#[command(name = "rsiscan")]
#[command(about = "Multi-timeframe RSI scanner for China A-shares", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan the ticker universe for oversold/overbought signals
    Scan {
        /// Progress file to resume from and save to
        #[arg(short, long)]
        progress: Option<PathBuf>,

        /// Comma-separated sector keys for the eligibility filter
        #[arg(short, long)]
        sectors: Option<String>,

        /// Ignore the sector rule when filtering signals
        #[arg(long)]
        all_sectors: bool,

        /// Scan only the first N universe tickers
        #[arg(short, long)]
        limit: Option<usize>,

        /// Ignore any existing progress file and start from scratch
        #[arg(long)]
        fresh: bool,
    },
    /// Show the generated ticker universe
    Universe,
}

pub fn run() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            progress,
            sectors,
            all_sectors,
            limit,
            fresh,
        } => {
            commands::scan::run(progress, sectors, all_sectors, limit, fresh);
        }
        Commands::Universe => {
            commands::universe::run();
        }
    }
}

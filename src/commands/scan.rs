use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::mpsc::RecvTimeoutError;
use std::sync::Arc;
use std::time::Duration;

use crate::constants::EVENT_POLL_MS;
use crate::error::Error;
use crate::models::{sector, ScanConfig, ScanRecord};
use crate::services::{EastmoneyClient, Enricher, HistoryProvider, YahooClient};
use crate::utils::default_progress_path;
use crate::worker::{ScanEvent, Scanner};

pub fn run(
    progress: Option<PathBuf>,
    sectors: Option<String>,
    all_sectors: bool,
    limit: Option<usize>,
    fresh: bool,
) {
    println!("🔍 RSI Scanner: START");

    let progress_path = progress.unwrap_or_else(default_progress_path);

    let mut config = ScanConfig::default();
    config.universe_limit = limit;

    let scanner = match build_scanner(config) {
        Ok(scanner) => scanner,
        Err(e) => {
            eprintln!("❌ Failed to initialize scanner: {}", e);
            std::process::exit(1);
        }
    };

    if !fresh && progress_path.exists() {
        match scanner.load_progress(&progress_path) {
            Ok(()) => {
                let processed = scanner.snapshot().processed.len();
                println!(
                    "📂 Resuming from {} ({} tickers already processed)",
                    progress_path.display(),
                    processed
                );
            }
            Err(e) => {
                eprintln!("⚠️  Could not load progress file, starting fresh: {}", e);
            }
        }
    }

    if sectors.is_some() || all_sectors {
        let keys = parse_sector_keys(sectors.as_deref().unwrap_or(""));
        for key in &keys {
            if sector::display_name(key).is_none() {
                eprintln!("⚠️  Unknown sector key: {}", key);
            }
        }
        scanner.set_sector_filter(keys, all_sectors);
    }

    let rx = match scanner.start() {
        Ok(rx) => rx,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    {
        let scanner = scanner.clone();
        if let Err(e) = ctrlc::set_handler(move || {
            eprintln!("\n🛑 Cancellation requested, finishing current ticker...");
            scanner.cancel();
        }) {
            eprintln!("⚠️  Could not install Ctrl-C handler: {}", e);
        }
    }

    loop {
        match rx.recv_timeout(Duration::from_millis(EVENT_POLL_MS)) {
            Ok(ScanEvent::Log(line)) => println!("{}", line),
            Ok(ScanEvent::OversoldFound(record)) => {
                println!("📉 Oversold:   {}", describe_record(&record));
            }
            Ok(ScanEvent::OverboughtFound(record)) => {
                println!("📈 Overbought: {}", describe_record(&record));
            }
            Ok(ScanEvent::FilteredOversoldFound(record)) => {
                println!("⭐ Eligible oversold:   {}", describe_record(&record));
            }
            Ok(ScanEvent::FilteredOverboughtFound(record)) => {
                println!("⭐ Eligible overbought: {}", describe_record(&record));
            }
            Ok(ScanEvent::ScanComplete) => break,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    let state = scanner.snapshot();
    println!("\n--- Scan Complete ---");
    println!("   Processed:  {}", state.processed.len());
    println!(
        "   Oversold:   {} ({} eligible)",
        state.oversold.len(),
        state.filtered_oversold.len()
    );
    println!(
        "   Overbought: {} ({} eligible)",
        state.overbought.len(),
        state.filtered_overbought.len()
    );

    match scanner.save_progress(&progress_path) {
        Ok(()) => println!("💾 Progress saved to {}", progress_path.display()),
        Err(e) => eprintln!("❌ Could not save progress: {}", e),
    }
}

fn build_scanner(config: ScanConfig) -> Result<Scanner, Error> {
    let yahoo = YahooClient::new(true, 60)
        .map_err(|e| Error::Config(format!("primary source: {}", e)))?;
    let eastmoney =
        EastmoneyClient::new().map_err(|e| Error::Config(format!("secondary source: {}", e)))?;
    let metadata = YahooClient::new(true, 60)
        .map_err(|e| Error::Config(format!("metadata source: {}", e)))?;

    let provider = HistoryProvider::new(vec![Box::new(yahoo), Box::new(eastmoney)]);
    let enricher = Enricher::new(Box::new(metadata));

    Ok(Scanner::new(config, Arc::new(provider), Arc::new(enricher)))
}

fn parse_sector_keys(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(sector::normalize_sector)
        .filter(|key| !key.is_empty())
        .collect()
}

fn describe_record(record: &ScanRecord) -> String {
    let yn = |flag: bool| if flag { "Yes" } else { "No" };
    let cap = record
        .market_cap
        .map(|c| format!("{:.0}", c))
        .unwrap_or_else(|| "?".to_string());
    let sector = record.sector.as_deref().unwrap_or("unknown");

    format!(
        "{}  D/W/M: {}/{}/{}  cap: {}  sector: {}",
        record.ticker,
        yn(record.daily),
        yn(record.weekly),
        yn(record.monthly),
        cap,
        sector
    )
}

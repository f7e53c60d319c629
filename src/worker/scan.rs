//! Scan orchestrator
//!
//! Drives the per-ticker, per-timeframe RSI pipeline across the universe
//! on a dedicated worker thread with its own runtime, pushing immutable
//! events onto a FIFO channel. Std mpsc is used deliberately so consumers
//! on any runtime (or none) can poll the queue.
//!
//! State machine: Idle -> Running -> {Paused <-> Running} ->
//! Completed|Cancelled -> Idle. Pause suspends strictly between tickers;
//! cancellation is observed once per ticker, so an in-flight fetch is
//! never interrupted. Exactly one `ScanComplete` is emitted per scan,
//! after which the controls re-arm.

use parking_lot::Mutex;
use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, SendError, Sender};
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::constants::HUNDRED_MILLION;
use crate::error::{AppError, Result};
use crate::models::indicators::{is_overbought, is_oversold, latest_rsi};
use crate::models::sector::normalize_sector;
use crate::models::{ScanConfig, ScanRecord, ScanState, Timeframe};
use crate::services::enrichment::{is_eligible, Enricher, TickerProfile};
use crate::services::progress;
use crate::services::universe::default_universe;
use crate::services::HistoryProvider;

/// Events pushed from the scan thread to the presentation side
///
/// A closed set: consumers pattern-match exhaustively instead of probing
/// payloads for keys.
#[derive(Debug, Clone)]
pub enum ScanEvent {
    /// Human-readable progress or error line
    Log(String),
    /// Ticker classified oversold on the Daily timeframe
    OversoldFound(ScanRecord),
    /// Ticker classified overbought on the Daily timeframe
    OverboughtFound(ScanRecord),
    /// Oversold ticker that also passed the eligibility filter
    FilteredOversoldFound(ScanRecord),
    /// Overbought ticker that also passed the eligibility filter
    FilteredOverboughtFound(ScanRecord),
    /// Terminal event; emitted exactly once per scan
    ScanComplete,
}

/// Which threshold a record's per-timeframe flags are evaluated against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SignalKind {
    Oversold,
    Overbought,
}

/// Outcome of one ticker's pipeline pass
enum TickerOutcome {
    /// Daily RSI crossed at least one threshold
    Signalled,
    /// Daily RSI available but neutral
    NoSignal,
    /// Daily history missing or insufficient
    Unavailable,
}

/// Scan orchestrator and operator command surface
///
/// Cheap to clone; clones share flags and state. Only one scan may be
/// active at a time across all clones.
#[derive(Clone)]
pub struct Scanner {
    config: ScanConfig,
    provider: Arc<HistoryProvider>,
    enricher: Arc<Enricher>,
    state: Arc<Mutex<ScanState>>,
    scanning: Arc<AtomicBool>,
    paused: Arc<AtomicBool>,
    cancelled: Arc<AtomicBool>,
}

impl Scanner {
    pub fn new(config: ScanConfig, provider: Arc<HistoryProvider>, enricher: Arc<Enricher>) -> Self {
        Self {
            config,
            provider,
            enricher,
            state: Arc::new(Mutex::new(ScanState::new())),
            scanning: Arc::new(AtomicBool::new(false)),
            paused: Arc::new(AtomicBool::new(false)),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_scanning(&self) -> bool {
        self.scanning.load(Ordering::SeqCst)
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// Toggle pause; returns the new paused value
    ///
    /// The scan suspends between tickers, never mid-ticker.
    pub fn toggle_pause(&self) -> bool {
        let now_paused = !self.paused.load(Ordering::SeqCst);
        self.paused.store(now_paused, Ordering::SeqCst);
        info!(paused = now_paused, "pause toggled");
        now_paused
    }

    /// Request cooperative cancellation
    ///
    /// The loop observes the flag at the top of the next ticker iteration;
    /// records for prior tickers remain.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        info!("cancellation requested");
    }

    /// Replace the sector filter used by the eligibility check
    pub fn set_sector_filter(&self, sectors: HashSet<String>, show_all: bool) {
        info!(sectors = ?sectors, show_all, "sector filter updated");
        let mut state = self.state.lock();
        state.selected_sectors = sectors;
        state.show_all_sectors = show_all;
    }

    /// Immutable snapshot of the current scan state
    pub fn snapshot(&self) -> ScanState {
        self.state.lock().clone()
    }

    /// Serialize the current state to a progress file
    pub fn save_progress(&self, path: &Path) -> Result<()> {
        let snapshot = self.snapshot();
        progress::save(path, &snapshot)?;
        info!(path = %path.display(), processed = snapshot.processed.len(), "progress saved");
        Ok(())
    }

    /// Rehydrate state from a progress file
    ///
    /// Rejected while a scan is active; loading never starts a scan.
    pub fn load_progress(&self, path: &Path) -> Result<()> {
        if self.is_scanning() {
            return Err(AppError::ScanActive);
        }

        let mut loaded = progress::load(path)?;
        let mut state = self.state.lock();
        loaded.show_all_sectors = state.show_all_sectors;
        *state = loaded;
        info!(path = %path.display(), processed = state.processed.len(), "progress loaded");
        Ok(())
    }

    /// Start a scan over the default universe
    pub fn start(&self) -> Result<Receiver<ScanEvent>> {
        self.start_with_universe(default_universe())
    }

    /// Start a scan over an explicit universe
    ///
    /// The universe is de-duplicated (overlapping prefix ranges can repeat
    /// a code) and already-processed tickers are subtracted, giving resume
    /// semantics. Fails with [`AppError::ScanActive`] when a scan is
    /// already running; a second scan is rejected, not queued.
    pub fn start_with_universe(&self, universe: Vec<String>) -> Result<Receiver<ScanEvent>> {
        if self.scanning.swap(true, Ordering::SeqCst) {
            warn!("start requested while a scan is active");
            return Err(AppError::ScanActive);
        }
        self.paused.store(false, Ordering::SeqCst);
        self.cancelled.store(false, Ordering::SeqCst);

        let (tx, rx) = mpsc::channel();
        let scanner = self.clone();

        let spawned = std::thread::Builder::new()
            .name("scan-worker".to_string())
            .spawn(move || {
                let runtime = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(runtime) => runtime,
                    Err(e) => {
                        error!(error = %e, "failed to create scan runtime");
                        let _ = tx.send(ScanEvent::Log(format!("ERROR starting scan: {}", e)));
                        let _ = tx.send(ScanEvent::ScanComplete);
                        scanner.scanning.store(false, Ordering::SeqCst);
                        return;
                    }
                };

                runtime.block_on(scanner.run_scan(universe, tx));
            });

        if let Err(e) = spawned {
            self.scanning.store(false, Ordering::SeqCst);
            return Err(AppError::Io(format!("failed to spawn scan thread: {}", e)));
        }

        Ok(rx)
    }

    async fn run_scan(&self, universe: Vec<String>, tx: Sender<ScanEvent>) {
        let mut seen = HashSet::new();
        let mut pending: Vec<String> = universe
            .into_iter()
            .filter(|ticker| seen.insert(ticker.clone()))
            .collect();

        if let Some(limit) = self.config.universe_limit {
            pending.truncate(limit);
        }

        {
            let state = self.state.lock();
            pending.retain(|ticker| !state.processed.contains(ticker));
        }

        let total = pending.len();
        info!(total, "scan started");
        let _ = tx.send(ScanEvent::Log(format!(
            "Scanning {} tickers (Daily RSI <= {} or >= {})...",
            total, self.config.oversold_threshold, self.config.overbought_threshold
        )));

        let mut processed_count = 0usize;
        let mut found_count = 0usize;
        let mut error_count = 0usize;

        for ticker in pending {
            if self.cancelled.load(Ordering::SeqCst) {
                info!(processed = processed_count, "scan cancelled");
                let _ = tx.send(ScanEvent::Log("Scan cancelled.".to_string()));
                break;
            }

            // Cooperative suspension, strictly between tickers
            while self.paused.load(Ordering::SeqCst) && !self.cancelled.load(Ordering::SeqCst) {
                sleep(self.config.pause_poll).await;
            }
            if self.cancelled.load(Ordering::SeqCst) {
                info!(processed = processed_count, "scan cancelled while paused");
                let _ = tx.send(ScanEvent::Log("Scan cancelled.".to_string()));
                break;
            }

            processed_count += 1;

            match self.process_ticker(&ticker, &tx).await {
                Ok(TickerOutcome::Signalled) => found_count += 1,
                Ok(TickerOutcome::NoSignal) => {}
                Ok(TickerOutcome::Unavailable) => error_count += 1,
                Err(e) => {
                    // The consumer hung up; nobody is listening anymore
                    error!(ticker = %ticker, error = %e, "scan aborted");
                    break;
                }
            }

            if processed_count % self.config.progress_log_interval == 0 {
                let _ = tx.send(ScanEvent::Log(format!(
                    "Processed {}/{} tickers... Found {} signals. Errors: {}",
                    processed_count, total, found_count, error_count
                )));
            }
        }

        info!(
            processed = processed_count,
            found = found_count,
            errors = error_count,
            "scan finished"
        );
        let _ = tx.send(ScanEvent::ScanComplete);
        self.paused.store(false, Ordering::SeqCst);
        self.scanning.store(false, Ordering::SeqCst);
    }

    /// One ticker through the whole pipeline
    ///
    /// A failed Daily evaluation aborts the remaining timeframes for the
    /// ticker; Weekly/Monthly failures degrade to unavailable on their own
    /// timeframe only. The ticker lands in the processed set regardless of
    /// outcome so a resumed scan never revisits it.
    async fn process_ticker(
        &self,
        ticker: &str,
        tx: &Sender<ScanEvent>,
    ) -> std::result::Result<TickerOutcome, SendError<ScanEvent>> {
        let mut readings: Vec<(Timeframe, Option<f64>)> =
            Vec::with_capacity(self.config.timeframes.len());

        for timeframe in &self.config.timeframes {
            let bars = self
                .provider
                .fetch(ticker, timeframe.period(), timeframe.interval())
                .await;
            let closes: Vec<f64> = bars.iter().map(|bar| bar.close).collect();
            let rsi = latest_rsi(&closes, self.config.rsi_period);
            readings.push((*timeframe, rsi));

            if *timeframe == Timeframe::Daily && rsi.is_none() {
                break;
            }
        }

        self.state.lock().processed.insert(ticker.to_string());

        let daily_rsi = match readings
            .iter()
            .find(|(tf, _)| *tf == Timeframe::Daily)
            .and_then(|(_, rsi)| *rsi)
        {
            Some(value) => value,
            None => return Ok(TickerOutcome::Unavailable),
        };

        let oversold = is_oversold(daily_rsi, self.config.oversold_threshold);
        let overbought = is_overbought(daily_rsi, self.config.overbought_threshold);
        if !oversold && !overbought {
            return Ok(TickerOutcome::NoSignal);
        }

        // One metadata fetch per signalled ticker; failure degrades to an
        // unenriched, filter-ineligible record
        let profile = self.enricher.describe(ticker).await;
        let (selected_sectors, show_all) = {
            let state = self.state.lock();
            (state.selected_sectors.clone(), state.show_all_sectors)
        };
        let eligible = profile.as_ref().map_or(false, |p| {
            is_eligible(p, self.config.market_cap_range, &selected_sectors, show_all)
        });

        if oversold {
            tx.send(ScanEvent::Log(format!(
                "  -> Oversold signal: {} (Daily RSI {:.2})",
                ticker, daily_rsi
            )))?;
            let record = self.build_record(ticker, &readings, SignalKind::Oversold, profile.as_ref());
            if self.state.lock().oversold.insert(record.clone()) {
                tx.send(ScanEvent::OversoldFound(record.clone()))?;
            }
            if eligible && self.state.lock().filtered_oversold.insert(record.clone()) {
                tx.send(ScanEvent::FilteredOversoldFound(record))?;
            }
        }

        if overbought {
            tx.send(ScanEvent::Log(format!(
                "  -> Overbought signal: {} (Daily RSI {:.2})",
                ticker, daily_rsi
            )))?;
            let record =
                self.build_record(ticker, &readings, SignalKind::Overbought, profile.as_ref());
            if self.state.lock().overbought.insert(record.clone()) {
                tx.send(ScanEvent::OverboughtFound(record.clone()))?;
            }
            if eligible && self.state.lock().filtered_overbought.insert(record.clone()) {
                tx.send(ScanEvent::FilteredOverboughtFound(record))?;
            }
        }

        Ok(TickerOutcome::Signalled)
    }

    fn build_record(
        &self,
        ticker: &str,
        readings: &[(Timeframe, Option<f64>)],
        kind: SignalKind,
        profile: Option<&TickerProfile>,
    ) -> ScanRecord {
        let flag = |wanted: Timeframe| {
            readings
                .iter()
                .find(|(tf, _)| *tf == wanted)
                .and_then(|(_, rsi)| *rsi)
                .map_or(false, |value| match kind {
                    SignalKind::Oversold => is_oversold(value, self.config.oversold_threshold),
                    SignalKind::Overbought => is_overbought(value, self.config.overbought_threshold),
                })
        };

        ScanRecord {
            ticker: ticker.to_string(),
            daily: flag(Timeframe::Daily),
            weekly: flag(Timeframe::Weekly),
            monthly: flag(Timeframe::Monthly),
            market_cap: profile
                .and_then(|p| p.market_cap)
                .map(|cap| cap / HUNDRED_MILLION),
            earnings_growth: profile.and_then(|p| p.earnings_growth),
            sector: profile
                .and_then(|p| p.sector.as_deref())
                .map(normalize_sector),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Ohlcv;
    use crate::services::enrichment::MetadataSource;
    use crate::services::history::{HistorySource, SourceError};
    use async_trait::async_trait;
    use chrono::{Duration as ChronoDuration, TimeZone, Utc};
    use std::sync::mpsc::RecvTimeoutError;
    use std::time::Duration;

    fn series(start: f64, step: f64, len: usize) -> Vec<Ohlcv> {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        (0..len)
            .map(|i| {
                let close = start + step * i as f64;
                Ohlcv::new(base + ChronoDuration::days(i as i64), close, close, close, close, 1000)
            })
            .collect()
    }

    fn declining() -> Vec<Ohlcv> {
        series(100.0, -1.0, 30)
    }

    fn rising() -> Vec<Ohlcv> {
        series(100.0, 1.0, 30)
    }

    /// Alternating gains and losses of equal size: RSI stays near 50
    fn neutral() -> Vec<Ohlcv> {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        (0..30)
            .map(|i| {
                let close = if i % 2 == 0 { 100.0 } else { 101.0 };
                Ohlcv::new(base + ChronoDuration::days(i as i64), close, close, close, close, 1000)
            })
            .collect()
    }

    /// Scripted backend: per-ticker shape, optional per-interval override,
    /// optional per-fetch delay, and a shared log of every request served
    #[derive(Default)]
    struct ScriptedHistory {
        oversold: HashSet<String>,
        overbought: HashSet<String>,
        missing: HashSet<String>,
        missing_daily_only: HashSet<String>,
        delay: Option<Duration>,
        requests: Arc<Mutex<Vec<(String, String)>>>,
    }

    #[async_trait]
    impl HistorySource for ScriptedHistory {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn fetch_history(
            &self,
            ticker: &str,
            _period: &str,
            interval: &str,
        ) -> std::result::Result<Vec<Ohlcv>, SourceError> {
            self.requests.lock().push((ticker.to_string(), interval.to_string()));
            if let Some(delay) = self.delay {
                sleep(delay).await;
            }

            if self.missing.contains(ticker) {
                return Ok(Vec::new());
            }
            if self.missing_daily_only.contains(ticker) && interval == "1d" {
                return Ok(Vec::new());
            }
            if self.oversold.contains(ticker) {
                return Ok(declining());
            }
            if self.overbought.contains(ticker) {
                return Ok(rising());
            }
            Ok(neutral())
        }
    }

    struct FixedMetadata(TickerProfile);

    #[async_trait]
    impl MetadataSource for FixedMetadata {
        async fn profile(&self, _ticker: &str) -> std::result::Result<TickerProfile, SourceError> {
            Ok(self.0.clone())
        }
    }

    struct FailingMetadata;

    #[async_trait]
    impl MetadataSource for FailingMetadata {
        async fn profile(&self, _ticker: &str) -> std::result::Result<TickerProfile, SourceError> {
            Err(SourceError::Http("metadata backend down".to_string()))
        }
    }

    fn eligible_profile() -> TickerProfile {
        TickerProfile {
            market_cap: Some(150.0 * HUNDRED_MILLION),
            earnings_growth: Some(0.1),
            sector: Some("Healthcare".to_string()),
        }
    }

    fn scanner_with(history: ScriptedHistory, metadata: Box<dyn MetadataSource>) -> Scanner {
        let mut config = ScanConfig::default();
        config.pause_poll = Duration::from_millis(10);
        Scanner::new(
            config,
            Arc::new(HistoryProvider::new(vec![Box::new(history)])),
            Arc::new(Enricher::new(metadata)),
        )
    }

    fn drain(rx: &Receiver<ScanEvent>) -> Vec<ScanEvent> {
        let mut events = Vec::new();
        loop {
            match rx.recv_timeout(Duration::from_secs(10)) {
                Ok(ScanEvent::ScanComplete) => {
                    events.push(ScanEvent::ScanComplete);
                    return events;
                }
                Ok(event) => events.push(event),
                Err(RecvTimeoutError::Timeout) => panic!("scan did not complete in time"),
                Err(RecvTimeoutError::Disconnected) => return events,
            }
        }
    }

    fn tickers(items: &[&str]) -> Vec<String> {
        items.iter().map(|t| t.to_string()).collect()
    }

    fn set(items: &[&str]) -> HashSet<String> {
        items.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_full_scan_classifies_and_buckets() {
        let history = ScriptedHistory {
            oversold: set(&["600000.SS"]),
            overbought: set(&["000001.SZ"]),
            missing: set(&["688999.SS"]),
            ..Default::default()
        };
        let scanner = scanner_with(history, Box::new(FixedMetadata(eligible_profile())));

        let universe = tickers(&["600000.SS", "600001.SS", "688999.SS", "000001.SZ"]);
        let rx = scanner.start_with_universe(universe.clone()).unwrap();
        let events = drain(&rx);

        let state = scanner.snapshot();
        let expected: HashSet<String> = universe.iter().cloned().collect();
        assert_eq!(state.processed, expected);
        assert_eq!(state.oversold.len(), 1);
        assert!(state.oversold.contains("600000.SS"));
        assert_eq!(state.overbought.len(), 1);
        assert!(state.overbought.contains("000001.SZ"));
        // Eligible profile: both signals also land in the filtered buckets
        assert!(state.filtered_oversold.contains("600000.SS"));
        assert!(state.filtered_overbought.contains("000001.SZ"));

        let completes = events
            .iter()
            .filter(|e| matches!(e, ScanEvent::ScanComplete))
            .count();
        assert_eq!(completes, 1);
        assert!(events.iter().any(|e| matches!(e, ScanEvent::OversoldFound(r) if r.ticker == "600000.SS")));
        assert!(events.iter().any(|e| matches!(e, ScanEvent::OverboughtFound(r) if r.ticker == "000001.SZ")));
        assert!(!scanner.is_scanning());
    }

    #[test]
    fn test_record_enrichment_fields() {
        let history = ScriptedHistory {
            oversold: set(&["600000.SS"]),
            ..Default::default()
        };
        let scanner = scanner_with(history, Box::new(FixedMetadata(eligible_profile())));

        let rx = scanner.start_with_universe(tickers(&["600000.SS"])).unwrap();
        drain(&rx);

        let state = scanner.snapshot();
        let record = &state.oversold.records()[0];
        assert_eq!(record.market_cap, Some(150.0));
        assert_eq!(record.earnings_growth, Some(0.1));
        assert_eq!(record.sector.as_deref(), Some("healthcare"));
        // Same declining series on every timeframe
        assert!(record.daily && record.weekly && record.monthly);
    }

    #[test]
    fn test_resume_skips_processed_tickers() {
        let universe = tickers(&["600000.SS", "600001.SS", "000001.SZ"]);

        let history = ScriptedHistory {
            oversold: set(&["600000.SS"]),
            ..Default::default()
        };
        let scanner = scanner_with(history, Box::new(FixedMetadata(eligible_profile())));
        drain(&scanner.start_with_universe(universe.clone()).unwrap());

        let processed_after_first = scanner.snapshot().processed;
        assert_eq!(processed_after_first.len(), 3);

        // Second run over the same universe finds nothing left to scan
        let rx = scanner.start_with_universe(universe).unwrap();
        let events = drain(&rx);

        assert_eq!(scanner.snapshot().processed, processed_after_first);
        let found = events
            .iter()
            .filter(|e| matches!(e, ScanEvent::OversoldFound(_) | ScanEvent::OverboughtFound(_)))
            .count();
        assert_eq!(found, 0);
    }

    #[test]
    fn test_universe_deduplicated_before_scanning() {
        let history = ScriptedHistory::default();
        let scanner = scanner_with(history, Box::new(FixedMetadata(eligible_profile())));

        let rx = scanner
            .start_with_universe(tickers(&["600000.SS", "600000.SS", "600001.SS"]))
            .unwrap();
        let events = drain(&rx);

        assert_eq!(scanner.snapshot().processed.len(), 2);
        let log = events
            .iter()
            .find_map(|e| match e {
                ScanEvent::Log(line) if line.starts_with("Scanning") => Some(line.clone()),
                _ => None,
            })
            .unwrap();
        assert!(log.contains("Scanning 2 tickers"));
    }

    #[test]
    fn test_second_start_rejected_while_running() {
        let history = ScriptedHistory {
            delay: Some(Duration::from_millis(20)),
            ..Default::default()
        };
        let scanner = scanner_with(history, Box::new(FixedMetadata(eligible_profile())));

        let rx = scanner
            .start_with_universe(tickers(&["600000.SS", "600001.SS", "600002.SS"]))
            .unwrap();
        assert!(matches!(
            scanner.start_with_universe(tickers(&["000001.SZ"])),
            Err(AppError::ScanActive)
        ));

        drain(&rx);
        assert!(!scanner.is_scanning());
    }

    #[test]
    fn test_cancel_stops_early_and_still_completes() {
        let universe: Vec<String> = (0..200).map(|i| format!("{:06}.SS", 600000 + i)).collect();
        let history = ScriptedHistory {
            delay: Some(Duration::from_millis(5)),
            ..Default::default()
        };
        let scanner = scanner_with(history, Box::new(FixedMetadata(eligible_profile())));

        let rx = scanner.start_with_universe(universe.clone()).unwrap();
        std::thread::sleep(Duration::from_millis(100));
        scanner.cancel();
        let events = drain(&rx);

        let state = scanner.snapshot();
        assert!(!state.processed.is_empty());
        assert!(state.processed.len() < universe.len());
        assert!(events
            .iter()
            .any(|e| matches!(e, ScanEvent::Log(line) if line == "Scan cancelled.")));
        assert!(matches!(events.last(), Some(ScanEvent::ScanComplete)));
        assert!(!scanner.is_scanning());
    }

    #[test]
    fn test_pause_halts_progress_until_resumed() {
        let universe: Vec<String> = (0..200).map(|i| format!("{:06}.SS", 600000 + i)).collect();
        let history = ScriptedHistory {
            delay: Some(Duration::from_millis(5)),
            ..Default::default()
        };
        let scanner = scanner_with(history, Box::new(FixedMetadata(eligible_profile())));

        let rx = scanner.start_with_universe(universe.clone()).unwrap();
        std::thread::sleep(Duration::from_millis(60));

        assert!(scanner.toggle_pause());
        // Let the in-flight ticker finish; pause lands between tickers
        std::thread::sleep(Duration::from_millis(100));
        let halted_at = scanner.snapshot().processed.len();
        assert!(halted_at > 0);

        std::thread::sleep(Duration::from_millis(200));
        assert_eq!(scanner.snapshot().processed.len(), halted_at);
        assert!(scanner.is_scanning());

        assert!(!scanner.toggle_pause());
        drain(&rx);

        // Every ticker scanned exactly once, none lost across the pause
        assert_eq!(scanner.snapshot().processed.len(), universe.len());
    }

    #[test]
    fn test_daily_failure_short_circuits_remaining_timeframes() {
        let history = ScriptedHistory {
            missing_daily_only: set(&["600000.SS"]),
            ..Default::default()
        };
        let requests = Arc::clone(&history.requests);
        let scanner = scanner_with(history, Box::new(FixedMetadata(eligible_profile())));

        let rx = scanner.start_with_universe(tickers(&["600000.SS"])).unwrap();
        drain(&rx);

        let state = scanner.snapshot();
        // Processed regardless of outcome, but no record emitted
        assert!(state.processed.contains("600000.SS"));
        assert_eq!(state.signal_count(), 0);

        // Only the Daily fetch was attempted
        let served = requests.lock().clone();
        assert_eq!(served, vec![("600000.SS".to_string(), "1d".to_string())]);
    }

    #[test]
    fn test_weekly_failure_degrades_to_unavailable_flag() {
        // Daily declines, weekly has no data, monthly declines
        struct SplitHistory;

        #[async_trait]
        impl HistorySource for SplitHistory {
            fn name(&self) -> &'static str {
                "split"
            }

            async fn fetch_history(
                &self,
                _ticker: &str,
                _period: &str,
                interval: &str,
            ) -> std::result::Result<Vec<Ohlcv>, SourceError> {
                match interval {
                    "1wk" => Ok(Vec::new()),
                    _ => Ok(declining()),
                }
            }
        }

        let mut config = ScanConfig::default();
        config.pause_poll = Duration::from_millis(10);
        let scanner = Scanner::new(
            config,
            Arc::new(HistoryProvider::new(vec![Box::new(SplitHistory)])),
            Arc::new(Enricher::new(Box::new(FixedMetadata(eligible_profile())))),
        );

        let rx = scanner.start_with_universe(tickers(&["600000.SS"])).unwrap();
        drain(&rx);

        let record = scanner.snapshot().oversold.records()[0].clone();
        assert!(record.daily);
        assert!(!record.weekly);
        assert!(record.monthly);
    }

    #[test]
    fn test_enrichment_failure_keeps_unfiltered_record() {
        let history = ScriptedHistory {
            oversold: set(&["600000.SS"]),
            ..Default::default()
        };
        let scanner = scanner_with(history, Box::new(FailingMetadata));

        let rx = scanner.start_with_universe(tickers(&["600000.SS"])).unwrap();
        drain(&rx);

        let state = scanner.snapshot();
        assert!(state.oversold.contains("600000.SS"));
        assert!(state.filtered_oversold.is_empty());

        let record = &state.oversold.records()[0];
        assert_eq!(record.market_cap, None);
        assert_eq!(record.sector, None);
    }

    #[test]
    fn test_sector_filter_gates_filtered_bucket() {
        let history = ScriptedHistory {
            oversold: set(&["600000.SS"]),
            ..Default::default()
        };
        let scanner = scanner_with(history, Box::new(FixedMetadata(eligible_profile())));
        scanner.set_sector_filter(set(&["technology"]), false);

        let rx = scanner.start_with_universe(tickers(&["600000.SS"])).unwrap();
        drain(&rx);

        let state = scanner.snapshot();
        assert!(state.oversold.contains("600000.SS"));
        assert!(state.filtered_oversold.is_empty());
    }

    #[test]
    fn test_show_all_sectors_bypasses_selection() {
        let history = ScriptedHistory {
            oversold: set(&["600000.SS"]),
            ..Default::default()
        };
        let scanner = scanner_with(history, Box::new(FixedMetadata(eligible_profile())));
        scanner.set_sector_filter(set(&["technology"]), true);

        let rx = scanner.start_with_universe(tickers(&["600000.SS"])).unwrap();
        drain(&rx);

        assert!(scanner.snapshot().filtered_oversold.contains("600000.SS"));
    }

    #[test]
    fn test_progress_save_and_load_through_scanner() {
        let history = ScriptedHistory {
            oversold: set(&["600000.SS"]),
            ..Default::default()
        };
        let scanner = scanner_with(history, Box::new(FixedMetadata(eligible_profile())));
        drain(&scanner.start_with_universe(tickers(&["600000.SS", "600001.SS"])).unwrap());

        let mut path = std::env::temp_dir();
        path.push(format!("rsiscan-scanner-progress-{}.json", std::process::id()));
        scanner.save_progress(&path).unwrap();

        let restored = scanner_with(ScriptedHistory::default(), Box::new(FailingMetadata));
        restored.load_progress(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let state = restored.snapshot();
        assert_eq!(state.processed.len(), 2);
        assert!(state.oversold.contains("600000.SS"));
    }

    #[test]
    fn test_load_progress_rejected_while_scanning() {
        let history = ScriptedHistory {
            delay: Some(Duration::from_millis(20)),
            ..Default::default()
        };
        let scanner = scanner_with(history, Box::new(FixedMetadata(eligible_profile())));

        let rx = scanner
            .start_with_universe(tickers(&["600000.SS", "600001.SS"]))
            .unwrap();
        assert!(matches!(
            scanner.load_progress(Path::new("does-not-matter.json")),
            Err(AppError::ScanActive)
        ));
        drain(&rx);
    }
}

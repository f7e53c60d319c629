use std::time::Duration;

use crate::constants::{
    MARKET_CAP_MAX, MARKET_CAP_MIN, OVERBOUGHT_THRESHOLD, OVERSOLD_THRESHOLD, PAUSE_POLL_MS,
    PROGRESS_LOG_INTERVAL, RSI_PERIOD,
};
use crate::models::Timeframe;

/// Configuration for a scan run
///
/// Passed into the orchestrator at construction. Defaults come from
/// [`crate::constants`].
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Wilder RSI lookback window
    pub rsi_period: usize,

    /// Oversold classification threshold (inclusive)
    pub oversold_threshold: f64,

    /// Overbought classification threshold (inclusive)
    pub overbought_threshold: f64,

    /// Timeframes evaluated per ticker, Daily first
    pub timeframes: Vec<Timeframe>,

    /// Market cap eligibility range in hundred-million units, inclusive
    pub market_cap_range: (f64, f64),

    /// Emit a progress log event every this many tickers
    pub progress_log_interval: usize,

    /// Sleep between pause-flag polls
    pub pause_poll: Duration,

    /// Scan only the first N universe tickers (trial runs); None = all
    pub universe_limit: Option<usize>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            rsi_period: RSI_PERIOD,
            oversold_threshold: OVERSOLD_THRESHOLD,
            overbought_threshold: OVERBOUGHT_THRESHOLD,
            timeframes: Timeframe::all().to_vec(),
            market_cap_range: (MARKET_CAP_MIN, MARKET_CAP_MAX),
            progress_log_interval: PROGRESS_LOG_INTERVAL,
            pause_poll: Duration::from_millis(PAUSE_POLL_MS),
            universe_limit: None,
        }
    }
}

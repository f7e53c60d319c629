//! Scan Configuration Constants
//!
//! Defaults for the RSI scan pipeline. Components receive these through
//! [`crate::models::ScanConfig`] rather than reading them as ambient
//! globals, so tests and callers can override any of them.

/// Wilder RSI lookback window
pub const RSI_PERIOD: usize = 14;

/// Latest RSI at or below this value classifies a timeframe as oversold
pub const OVERSOLD_THRESHOLD: f64 = 30.0;

/// Latest RSI at or above this value classifies a timeframe as overbought
pub const OVERBOUGHT_THRESHOLD: f64 = 70.0;

/// Shanghai Stock Exchange listing prefixes (main board + STAR market)
pub const SHANGHAI_PREFIXES: &[u32] = &[600, 601, 603, 688];

/// Shanghai ticker suffix
pub const SHANGHAI_SUFFIX: &str = ".SS";

/// Shenzhen Stock Exchange listing prefixes (main board + ChiNext)
pub const SHENZHEN_PREFIXES: &[u32] = &[0, 1, 2, 3, 300];

/// Shenzhen ticker suffix
pub const SHENZHEN_SUFFIX: &str = ".SZ";

/// Number of consecutive codes generated per listing prefix
pub const UNIVERSE_RANGE_LEN: u32 = 1000;

/// Emit a progress log event every this many processed tickers
pub const PROGRESS_LOG_INTERVAL: usize = 50;

/// Market capitalization eligibility range, in hundred-million currency
/// units. A signal passes the cap filter only when its market cap falls
/// inside [min, max] inclusive.
pub const MARKET_CAP_MIN: f64 = 100.0;
pub const MARKET_CAP_MAX: f64 = 300.0;

/// One hundred million, the unit market caps are reported in
pub const HUNDRED_MILLION: f64 = 100_000_000.0;

/// Sleep between pause-flag polls while the scan is suspended
pub const PAUSE_POLL_MS: u64 = 200;

/// Receive timeout for consumers polling the scan event queue
pub const EVENT_POLL_MS: u64 = 100;

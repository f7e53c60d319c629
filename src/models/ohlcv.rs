use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Basic OHLCV (Open, High, Low, Close, Volume) price bar
///
/// A history series is an ascending-by-time sequence of bars with unique
/// timestamps. Sources may report a missing close as `f64::NAN`; such rows
/// are dropped by the RSI engine, not at the parsing layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ohlcv {
    /// Timestamp of the bar
    #[serde(with = "chrono::serde::ts_seconds")]
    pub time: DateTime<Utc>,

    /// Opening price
    pub open: f64,

    /// Highest price
    pub high: f64,

    /// Lowest price
    pub low: f64,

    /// Closing price
    pub close: f64,

    /// Trading volume
    pub volume: u64,
}

impl Ohlcv {
    /// Create a new OHLCV bar
    pub fn new(time: DateTime<Utc>, open: f64, high: f64, low: f64, close: f64, volume: u64) -> Self {
        Self {
            time,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sampling timeframe for a history request
///
/// Each timeframe fixes both the bar interval and the lookback period the
/// scan requests from the history provider. The table is process-wide and
/// has exactly these three entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    /// Daily candles over the last year
    Daily,
    /// Weekly candles over the last five years
    Weekly,
    /// Monthly candles over the full listing history
    Monthly,
}

impl Timeframe {
    /// Bar interval in the primary source's vocabulary
    pub fn interval(&self) -> &'static str {
        match self {
            Timeframe::Daily => "1d",
            Timeframe::Weekly => "1wk",
            Timeframe::Monthly => "1mo",
        }
    }

    /// Lookback period in the primary source's vocabulary
    pub fn period(&self) -> &'static str {
        match self {
            Timeframe::Daily => "1y",
            Timeframe::Weekly => "5y",
            Timeframe::Monthly => "max",
        }
    }

    /// Human-readable name
    pub fn label(&self) -> &'static str {
        match self {
            Timeframe::Daily => "Daily",
            Timeframe::Weekly => "Weekly",
            Timeframe::Monthly => "Monthly",
        }
    }

    /// All timeframes, Daily first (the scan loop relies on this order)
    pub fn all() -> [Timeframe; 3] {
        [Timeframe::Daily, Timeframe::Weekly, Timeframe::Monthly]
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl Default for Timeframe {
    fn default() -> Self {
        Timeframe::Daily
    }
}

//! History provider with ranked source fallback
//!
//! The scan consumes one `fetch` capability. Behind it sit ranked backends
//! tried in order; an error or empty series from one backend simply moves
//! the chain to the next. Once every backend is exhausted the result is an
//! empty series, which is a normal outcome (delisted or never-listed
//! ticker), never an error.

use async_trait::async_trait;
use thiserror::Error as ThisError;
use tracing::{debug, warn};

use crate::models::Ohlcv;

/// Failure inside a single history backend
///
/// These never escape [`HistoryProvider::fetch`]; the provider maps every
/// variant to "no data from that source".
#[derive(ThisError, Debug)]
pub enum SourceError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Unsupported symbol: {0}")]
    UnsupportedSymbol(String),

    #[error("Unsupported interval: {0}")]
    UnsupportedInterval(String),
}

/// A single upstream history backend
#[async_trait]
pub trait HistorySource: Send + Sync {
    /// Short name for log lines
    fn name(&self) -> &'static str;

    /// Fetch an OHLCV series. Period and interval arrive in the primary
    /// vocabulary ("1y"/"5y"/"max", "1d"/"1wk"/"1mo"); backends translate
    /// internally. An empty series means no data, not failure.
    async fn fetch_history(
        &self,
        ticker: &str,
        period: &str,
        interval: &str,
    ) -> Result<Vec<Ohlcv>, SourceError>;
}

/// Ranked fallback chain over history backends
pub struct HistoryProvider {
    sources: Vec<Box<dyn HistorySource>>,
}

impl HistoryProvider {
    pub fn new(sources: Vec<Box<dyn HistorySource>>) -> Self {
        Self { sources }
    }

    /// Fetch a normalized series, trying each source in rank order
    ///
    /// Never fails past this boundary: backend errors are logged and
    /// treated as empty. The returned series is ascending by timestamp
    /// with duplicates collapsed.
    pub async fn fetch(&self, ticker: &str, period: &str, interval: &str) -> Vec<Ohlcv> {
        for source in &self.sources {
            match source.fetch_history(ticker, period, interval).await {
                Ok(bars) if !bars.is_empty() => {
                    debug!(
                        source = source.name(),
                        ticker,
                        interval,
                        bars = bars.len(),
                        "history fetch succeeded"
                    );
                    return normalize_series(bars);
                }
                Ok(_) => {
                    debug!(source = source.name(), ticker, interval, "source returned no data");
                }
                Err(e) => {
                    warn!(source = source.name(), ticker, interval, error = %e, "source failed");
                }
            }
        }

        Vec::new()
    }
}

/// Sort ascending by timestamp and drop duplicate timestamps
fn normalize_series(mut bars: Vec<Ohlcv>) -> Vec<Ohlcv> {
    bars.sort_by_key(|bar| bar.time);
    bars.dedup_by_key(|bar| bar.time);
    bars
}

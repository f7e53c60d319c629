mod ohlcv;
mod scan_config;
mod scan_state;
mod signal;
mod timeframe;
pub mod indicators;
pub mod sector;

pub use ohlcv::Ohlcv;
pub use scan_config::ScanConfig;
pub use scan_state::ScanState;
pub use signal::{ScanRecord, SignalBucket};
pub use timeframe::Timeframe;

/// Time series data for a single ticker
pub type TimeSeries = Vec<Ohlcv>;

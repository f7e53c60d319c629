pub mod eastmoney;
pub mod enrichment;
pub mod history;
pub mod progress;
pub mod universe;
pub mod yahoo;

pub use eastmoney::EastmoneyClient;
pub use enrichment::{is_eligible, Enricher, MetadataSource, TickerProfile};
pub use history::{HistoryProvider, HistorySource, SourceError};
pub use universe::{default_universe, generate_prefix_tickers};
pub use yahoo::YahooClient;

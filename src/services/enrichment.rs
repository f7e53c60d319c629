//! Signal enrichment and eligibility filtering
//!
//! Classified tickers are enriched with descriptive metadata and run
//! through a composite business filter: market cap band, positive earnings
//! growth, and an optional sector allow-list. Metadata failures degrade to
//! "not eligible" and never interrupt the scan.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::warn;

use crate::constants::HUNDRED_MILLION;
use crate::models::sector::normalize_sector;
use crate::services::history::SourceError;

/// Descriptive metadata for a ticker
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TickerProfile {
    /// Market capitalization in raw currency units
    pub market_cap: Option<f64>,

    /// Earnings growth as a fraction
    pub earnings_growth: Option<f64>,

    /// Provider's sector label, not yet normalized
    pub sector: Option<String>,
}

/// External metadata capability
#[async_trait]
pub trait MetadataSource: Send + Sync {
    async fn profile(&self, ticker: &str) -> Result<TickerProfile, SourceError>;
}

/// Catches metadata failures at the enrichment boundary
pub struct Enricher {
    source: Box<dyn MetadataSource>,
}

impl Enricher {
    pub fn new(source: Box<dyn MetadataSource>) -> Self {
        Self { source }
    }

    /// Fetch a ticker's profile, or `None` when the capability fails
    pub async fn describe(&self, ticker: &str) -> Option<TickerProfile> {
        match self.source.profile(ticker).await {
            Ok(profile) => Some(profile),
            Err(e) => {
                warn!(ticker, error = %e, "metadata fetch failed");
                None
            }
        }
    }
}

/// Composite eligibility filter
///
/// Eligible iff market cap (converted to hundred-million units) is inside
/// `cap_range` inclusive, earnings growth is strictly positive, and the
/// sector rule passes (show-all, empty selection, or normalized sector key
/// selected). Missing fields fail the corresponding clause.
pub fn is_eligible(
    profile: &TickerProfile,
    cap_range: (f64, f64),
    selected_sectors: &HashSet<String>,
    show_all_sectors: bool,
) -> bool {
    let cap = match profile.market_cap {
        Some(cap) => cap / HUNDRED_MILLION,
        None => return false,
    };
    if cap < cap_range.0 || cap > cap_range.1 {
        return false;
    }

    match profile.earnings_growth {
        Some(growth) if growth > 0.0 => {}
        _ => return false,
    }

    if show_all_sectors || selected_sectors.is_empty() {
        return true;
    }

    match &profile.sector {
        Some(sector) => selected_sectors.contains(&normalize_sector(sector)),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(cap_hundred_million: f64, growth: f64, sector: &str) -> TickerProfile {
        TickerProfile {
            market_cap: Some(cap_hundred_million * HUNDRED_MILLION),
            earnings_growth: Some(growth),
            sector: Some(sector.to_string()),
        }
    }

    fn healthcare_only() -> HashSet<String> {
        let mut sectors = HashSet::new();
        sectors.insert("healthcare".to_string());
        sectors
    }

    #[test]
    fn test_eligible_profile_passes() {
        let p = profile(150.0, 0.1, "Healthcare");
        assert!(is_eligible(&p, (100.0, 300.0), &healthcare_only(), false));
    }

    #[test]
    fn test_cap_below_range_fails() {
        let p = profile(50.0, 0.1, "Healthcare");
        assert!(!is_eligible(&p, (100.0, 300.0), &healthcare_only(), false));
    }

    #[test]
    fn test_cap_range_is_inclusive() {
        let sectors = HashSet::new();
        assert!(is_eligible(&profile(100.0, 0.1, "Healthcare"), (100.0, 300.0), &sectors, false));
        assert!(is_eligible(&profile(300.0, 0.1, "Healthcare"), (100.0, 300.0), &sectors, false));
        assert!(!is_eligible(&profile(300.1, 0.1, "Healthcare"), (100.0, 300.0), &sectors, false));
    }

    #[test]
    fn test_zero_growth_fails() {
        let p = profile(150.0, 0.0, "Healthcare");
        assert!(!is_eligible(&p, (100.0, 300.0), &healthcare_only(), false));
    }

    #[test]
    fn test_sector_not_selected_fails() {
        let p = profile(150.0, 0.1, "Technology");
        assert!(!is_eligible(&p, (100.0, 300.0), &healthcare_only(), false));
    }

    #[test]
    fn test_show_all_bypasses_sector_rule() {
        let p = profile(150.0, 0.1, "Technology");
        assert!(is_eligible(&p, (100.0, 300.0), &healthcare_only(), true));
    }

    #[test]
    fn test_empty_selection_means_no_sector_filter() {
        let p = profile(150.0, 0.1, "Technology");
        assert!(is_eligible(&p, (100.0, 300.0), &HashSet::new(), false));
    }

    #[test]
    fn test_sector_label_is_normalized_before_matching() {
        let mut sectors = HashSet::new();
        sectors.insert("consumer-cyclical".to_string());

        let p = profile(150.0, 0.1, "Consumer Cyclical");
        assert!(is_eligible(&p, (100.0, 300.0), &sectors, false));
    }

    #[test]
    fn test_missing_fields_fail() {
        let mut p = profile(150.0, 0.1, "Healthcare");
        p.market_cap = None;
        assert!(!is_eligible(&p, (100.0, 300.0), &HashSet::new(), false));

        let mut p = profile(150.0, 0.1, "Healthcare");
        p.earnings_growth = None;
        assert!(!is_eligible(&p, (100.0, 300.0), &HashSet::new(), false));

        let mut p = profile(150.0, 0.1, "Healthcare");
        p.sector = None;
        assert!(!is_eligible(&p, (100.0, 300.0), &healthcare_only(), false));
    }
}

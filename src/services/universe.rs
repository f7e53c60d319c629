//! Ticker universe generation
//!
//! Chinese A-share codes are six digits with the listing board encoded in
//! the leading digits. Enumerating every code under the known prefixes
//! yields a candidate universe; codes that were never listed simply return
//! no data downstream.

use crate::constants::{
    SHANGHAI_PREFIXES, SHANGHAI_SUFFIX, SHENZHEN_PREFIXES, SHENZHEN_SUFFIX, UNIVERSE_RANGE_LEN,
};

/// Generate candidate tickers for a set of listing prefixes
///
/// Each prefix is scaled to occupy the high-order digits of a six-digit
/// code and expanded into `range_len` consecutive codes. Prefix 0 starts at
/// 000001 (000000 is not a valid code) and therefore yields `range_len - 1`
/// codes. Output order is prefix order, then ascending within a prefix.
/// Overlapping prefix ranges are not de-duplicated here.
pub fn generate_prefix_tickers(prefixes: &[u32], suffix: &str, range_len: u32) -> Vec<String> {
    let mut tickers = Vec::new();

    for &prefix in prefixes {
        let (start, end) = if prefix == 0 {
            (1, range_len - 1)
        } else {
            let digits = prefix.to_string().len() as u32;
            let start = prefix * 10u32.pow(6 - digits);
            (start, start + range_len - 1)
        };

        for code in start..=end {
            tickers.push(format!("{:06}{}", code, suffix));
        }
    }

    tickers
}

/// The full scan universe: Shanghai then Shenzhen listings
pub fn default_universe() -> Vec<String> {
    let mut tickers = generate_prefix_tickers(SHANGHAI_PREFIXES, SHANGHAI_SUFFIX, UNIVERSE_RANGE_LEN);
    tickers.extend(generate_prefix_tickers(
        SHENZHEN_PREFIXES,
        SHENZHEN_SUFFIX,
        UNIVERSE_RANGE_LEN,
    ));
    tickers
}

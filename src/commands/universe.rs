use crate::constants::{
    SHANGHAI_PREFIXES, SHANGHAI_SUFFIX, SHENZHEN_PREFIXES, SHENZHEN_SUFFIX, UNIVERSE_RANGE_LEN,
};
use crate::services::universe::generate_prefix_tickers;

pub fn run() {
    println!("📊 Ticker Universe\n");

    let exchanges = [
        ("Shanghai", SHANGHAI_PREFIXES, SHANGHAI_SUFFIX),
        ("Shenzhen", SHENZHEN_PREFIXES, SHENZHEN_SUFFIX),
    ];

    let mut total = 0usize;
    for (name, prefixes, suffix) in exchanges {
        println!("🔹 {} ({})", name, suffix);

        for &prefix in prefixes {
            let tickers = generate_prefix_tickers(&[prefix], suffix, UNIVERSE_RANGE_LEN);
            if let (Some(first), Some(last)) = (tickers.first(), tickers.last()) {
                println!(
                    "   prefix {:>3}: {:>4} codes  ({} → {})",
                    prefix,
                    tickers.len(),
                    first,
                    last
                );
            }
            total += tickers.len();
        }
        println!();
    }

    println!("   Total: {} candidate tickers", total);
}

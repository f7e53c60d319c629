//! Sector keys and display names
//!
//! Providers report free-form sector labels ("Consumer Cyclical",
//! "Financial Services"). Filtering happens on normalized machine keys so
//! the operator's selection survives label variations.

/// Static sector-key to display-name table, process lifetime
pub const SECTOR_TABLE: &[(&str, &str)] = &[
    ("basic-materials", "Basic Materials"),
    ("communication-services", "Communication Services"),
    ("consumer-cyclical", "Consumer Cyclical"),
    ("consumer-defensive", "Consumer Defensive"),
    ("energy", "Energy"),
    ("financial-services", "Financial Services"),
    ("healthcare", "Healthcare"),
    ("industrials", "Industrials"),
    ("real-estate", "Real Estate"),
    ("technology", "Technology"),
    ("utilities", "Utilities"),
];

/// Label variants providers use for the same sector
const SYNONYMS: &[(&str, &str)] = &[
    ("basic materials", "basic-materials"),
    ("communication services", "communication-services"),
    ("consumer cyclical", "consumer-cyclical"),
    ("consumer defensive", "consumer-defensive"),
    ("financial", "financial-services"),
    ("financial services", "financial-services"),
    ("real estate", "real-estate"),
];

/// Display name for a sector key, if known
pub fn display_name(key: &str) -> Option<&'static str> {
    SECTOR_TABLE
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, name)| *name)
}

/// Normalize a provider sector label into a machine key
///
/// Lower-cases the label, maps known synonyms, otherwise replaces spaces
/// with hyphens.
pub fn normalize_sector(label: &str) -> String {
    let lowered = label.trim().to_lowercase();

    for (from, to) in SYNONYMS {
        if lowered == *from {
            return (*to).to_string();
        }
    }

    lowered.replace(' ', "-")
}

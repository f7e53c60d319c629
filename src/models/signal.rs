use serde::{Deserialize, Serialize};

/// Classified scan result for a single ticker
///
/// Created when the Daily RSI crosses a threshold; immutable afterwards.
/// The per-timeframe flags are evaluated against the threshold relevant to
/// the bucket the record lands in (oversold records against the oversold
/// threshold, overbought records against the overbought threshold).
///
/// Market cap is stored in hundred-million currency units, earnings growth
/// as a fraction. The boolean flags serialize as "Yes"/"No" strings at the
/// persistence boundary only; in memory they stay booleans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanRecord {
    /// Ticker symbol including exchange suffix
    pub ticker: String,

    /// Daily timeframe crossed the bucket's threshold
    #[serde(with = "yes_no")]
    pub daily: bool,

    /// Weekly timeframe crossed the bucket's threshold
    #[serde(with = "yes_no")]
    pub weekly: bool,

    /// Monthly timeframe crossed the bucket's threshold
    #[serde(with = "yes_no")]
    pub monthly: bool,

    /// Market capitalization in hundred-million currency units
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub market_cap: Option<f64>,

    /// Earnings growth as a fraction (0.1 = 10%)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub earnings_growth: Option<f64>,

    /// Normalized sector key (see [`crate::models::sector`])
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub sector: Option<String>,
}

/// Serialize booleans as the two-valued "Yes"/"No" strings
///
/// The progress file is the only place this rendering applies.
mod yes_no {
    use serde::de::{self, Deserializer, Unexpected};
    use serde::{Deserialize, Serializer};

    pub fn serialize<S>(value: &bool, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(if *value { "Yes" } else { "No" })
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        match raw.as_str() {
            "Yes" => Ok(true),
            "No" => Ok(false),
            other => Err(de::Error::invalid_value(
                Unexpected::Str(other),
                &"\"Yes\" or \"No\"",
            )),
        }
    }
}

/// Insertion-ordered, ticker-unique collection of scan records
///
/// Insertion order is discovery order; a second record for the same ticker
/// is rejected rather than overwriting the first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignalBucket {
    records: Vec<ScanRecord>,
}

impl SignalBucket {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, rejecting duplicate tickers. Returns whether the
    /// record was actually added.
    pub fn insert(&mut self, record: ScanRecord) -> bool {
        if self.contains(&record.ticker) {
            return false;
        }
        self.records.push(record);
        true
    }

    pub fn contains(&self, ticker: &str) -> bool {
        self.records.iter().any(|r| r.ticker == ticker)
    }

    pub fn records(&self) -> &[ScanRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl From<Vec<ScanRecord>> for SignalBucket {
    fn from(records: Vec<ScanRecord>) -> Self {
        let mut bucket = SignalBucket::new();
        for record in records {
            bucket.insert(record);
        }
        bucket
    }
}

//! Eastmoney kline client (secondary history source)
//!
//! Speaks a different dialect than the primary source on every axis:
//! symbols carry an exchange prefix instead of a suffix, lookback periods
//! become explicit begin dates, intervals become kline type codes, and the
//! response rows are positional comma-joined strings. Everything is
//! translated here so the provider chain only ever sees canonical OHLCV.

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use serde_json::Value;
use std::time::Duration as StdDuration;
use tokio::time::sleep;
use tracing::debug;

use crate::models::Ohlcv;
use crate::services::history::{HistorySource, SourceError};

const BASE_URL: &str = "https://push2his.eastmoney.com";
const MAX_RETRIES: u32 = 3;

/// Begin date used for "max" lookback requests
const EARLIEST_BEGIN: &str = "19900101";

/// Kline row field order requested via fields2
const KLINE_FIELDS: &str = "f51,f52,f53,f54,f55,f56";

/// A ticker translated into the secondary source's convention
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeSymbol {
    /// "sh" or "sz"
    pub exchange: &'static str,
    /// Six-digit listing code
    pub code: String,
}

impl ExchangeSymbol {
    /// Security id in the kline API's market.code form
    fn secid(&self) -> String {
        let market = if self.exchange == "sh" { "1" } else { "0" };
        format!("{}.{}", market, self.code)
    }
}

/// Translate a suffixed ticker (600000.SS) into prefix-code form (sh600000)
///
/// Fails fast on tickers without a recognized two-part suffix or with an
/// exchange other than the two supported ones.
pub fn translate_symbol(ticker: &str) -> Result<ExchangeSymbol, SourceError> {
    let (code, suffix) = ticker
        .rsplit_once('.')
        .ok_or_else(|| SourceError::UnsupportedSymbol(ticker.to_string()))?;

    if code.is_empty() {
        return Err(SourceError::UnsupportedSymbol(ticker.to_string()));
    }

    let exchange = match suffix.to_lowercase().as_str() {
        "ss" => "sh",
        "sz" => "sz",
        _ => return Err(SourceError::UnsupportedSymbol(ticker.to_string())),
    };

    Ok(ExchangeSymbol {
        exchange,
        code: code.to_string(),
    })
}

/// Translate a lookback period into an explicit begin date (YYYYMMDD)
pub fn begin_date(period: &str, today: NaiveDate) -> String {
    let days_back = match period {
        "1y" => 365,
        "5y" => 1825,
        "max" => return EARLIEST_BEGIN.to_string(),
        _ => 30,
    };
    (today - ChronoDuration::days(days_back))
        .format("%Y%m%d")
        .to_string()
}

/// Translate a bar interval into the kline type vocabulary
pub fn klt_code(interval: &str) -> Result<&'static str, SourceError> {
    match interval {
        "1d" => Ok("101"),
        "1wk" => Ok("102"),
        "1mo" => Ok("103"),
        other => Err(SourceError::UnsupportedInterval(other.to_string())),
    }
}

/// Parse one positional kline row: date,open,close,high,low,volume
fn parse_kline_row(row: &str) -> Option<Ohlcv> {
    let parts: Vec<&str> = row.split(',').collect();
    if parts.len() < 6 {
        return None;
    }

    let date = NaiveDate::parse_from_str(parts[0], "%Y-%m-%d").ok()?;
    let time = date.and_hms_opt(0, 0, 0)?.and_utc();

    let field = |i: usize| parts[i].parse::<f64>().unwrap_or(f64::NAN);
    let volume = parts[5].parse::<f64>().unwrap_or(0.0).max(0.0) as u64;

    Some(Ohlcv::new(
        time,
        field(1),
        field(3),
        field(4),
        field(2),
        volume,
    ))
}

pub struct EastmoneyClient {
    client: reqwest::Client,
    base_url: String,
}

impl EastmoneyClient {
    pub fn new() -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(StdDuration::from_secs(30))
            .build()
            .map_err(|e| SourceError::Http(format!("client build failed: {}", e)))?;

        Ok(Self {
            client,
            base_url: BASE_URL.to_string(),
        })
    }

    fn kline_url(&self, secid: &str, klt: &str, beg: &str) -> String {
        format!(
            "{}/api/qt/stock/kline/get?secid={}&klt={}&fqt=1&beg={}&end=20500101&fields1=f1,f2,f3,f4,f5,f6&fields2={}",
            self.base_url, secid, klt, beg, KLINE_FIELDS
        )
    }

    async fn get_json(&self, url: &str) -> Result<Value, SourceError> {
        let mut last_error = String::new();

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let delay = StdDuration::from_secs_f64(2.0_f64.powi(attempt as i32 - 1));
                debug!(url, attempt, reason = %last_error, "retrying after backoff");
                sleep(delay).await;
            }

            match self.client.get(url).send().await {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        match resp.json::<Value>().await {
                            Ok(data) => return Ok(data),
                            Err(e) => {
                                last_error = format!("JSON parse error: {}", e);
                            }
                        }
                    } else if status.is_client_error() {
                        return Err(SourceError::InvalidResponse(format!(
                            "HTTP {}",
                            status.as_u16()
                        )));
                    } else {
                        last_error = format!("HTTP {}", status.as_u16());
                    }
                }
                Err(e) => {
                    last_error = format!("network error: {}", e);
                }
            }
        }

        Err(SourceError::Http(last_error))
    }
}

#[async_trait]
impl HistorySource for EastmoneyClient {
    fn name(&self) -> &'static str {
        "eastmoney"
    }

    async fn fetch_history(
        &self,
        ticker: &str,
        period: &str,
        interval: &str,
    ) -> Result<Vec<Ohlcv>, SourceError> {
        let symbol = translate_symbol(ticker)?;
        let klt = klt_code(interval)?;
        let beg = begin_date(period, Utc::now().date_naive());

        let root = self.get_json(&self.kline_url(&symbol.secid(), klt, &beg)).await?;

        let data = &root["data"];
        if data.is_null() {
            return Ok(Vec::new());
        }

        let klines = match data["klines"].as_array() {
            Some(rows) => rows,
            None => return Ok(Vec::new()),
        };

        let bars = klines
            .iter()
            .filter_map(Value::as_str)
            .filter_map(parse_kline_row)
            .collect();

        Ok(bars)
    }
}

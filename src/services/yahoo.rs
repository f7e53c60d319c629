//! Yahoo Finance client (primary history + metadata source)
//!
//! Speaks the public chart and quote-summary endpoints. The chart endpoint
//! answers period/interval requests verbatim in our vocabulary, so no
//! translation happens here. Unknown or delisted symbols come back as an
//! in-band error document, which this client maps to an empty series.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use isahc::{config::Configurable, prelude::*, HttpClient};
use serde_json::Value;
use std::time::{Duration as StdDuration, SystemTime};
use tokio::sync::Mutex as TokioMutex;
use tokio::time::sleep;
use tracing::debug;

use crate::models::Ohlcv;
use crate::services::enrichment::{MetadataSource, TickerProfile};
use crate::services::history::{HistorySource, SourceError};

const BASE_URL: &str = "https://query1.finance.yahoo.com";
const MAX_RETRIES: u32 = 3;

/// Sliding-window rate limiter, one window per client instance
struct RateLimiter {
    request_timestamps: TokioMutex<Vec<SystemTime>>,
    rate_limit_per_minute: u32,
}

impl RateLimiter {
    fn new(rate_limit_per_minute: u32) -> Self {
        Self {
            request_timestamps: TokioMutex::new(Vec::new()),
            rate_limit_per_minute,
        }
    }

    async fn enforce(&self) {
        let current_time = SystemTime::now();
        let mut timestamps = self.request_timestamps.lock().await;

        timestamps.retain(|&timestamp| {
            current_time
                .duration_since(timestamp)
                .unwrap_or(StdDuration::from_secs(0))
                < StdDuration::from_secs(60)
        });

        if timestamps.len() >= self.rate_limit_per_minute as usize {
            if let Some(&oldest_request) = timestamps.first() {
                let wait_time = StdDuration::from_secs(60)
                    - current_time
                        .duration_since(oldest_request)
                        .unwrap_or(StdDuration::from_secs(0));

                if !wait_time.is_zero() {
                    // Drop the lock before sleeping so other tasks can check
                    drop(timestamps);
                    sleep(wait_time + StdDuration::from_millis(100)).await;
                    let mut timestamps = self.request_timestamps.lock().await;
                    timestamps.push(current_time);
                    return;
                }
            }
        }

        timestamps.push(current_time);
    }
}

pub struct YahooClient {
    client: HttpClient,
    base_url: String,
    user_agents: Vec<String>,
    random_agent: bool,
    rate_limiter: RateLimiter,
}

impl YahooClient {
    pub fn new(random_agent: bool, rate_limit_per_minute: u32) -> Result<Self, SourceError> {
        let client = HttpClient::builder()
            .timeout(StdDuration::from_secs(30))
            .build()
            .map_err(|e| SourceError::Http(format!("client build failed: {}", e)))?;

        let user_agents = vec![
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:120.0) Gecko/20100101 Firefox/120.0".to_string(),
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.3 Safari/605.1.15".to_string(),
        ];

        Ok(Self {
            client,
            base_url: BASE_URL.to_string(),
            user_agents,
            random_agent,
            rate_limiter: RateLimiter::new(rate_limit_per_minute),
        })
    }

    fn get_user_agent(&self) -> String {
        if self.random_agent {
            use rand::seq::SliceRandom;
            self.user_agents
                .choose(&mut rand::thread_rng())
                .unwrap_or(&self.user_agents[0])
                .clone()
        } else {
            self.user_agents[0].clone()
        }
    }

    /// GET a JSON document with rate limiting and bounded backoff
    ///
    /// Client-error statuses are returned as parsed bodies when they carry
    /// JSON (the chart endpoint reports unknown symbols that way); only
    /// transient statuses are retried.
    async fn get_json(&self, url: &str) -> Result<Value, SourceError> {
        let mut last_error = String::new();

        for attempt in 0..MAX_RETRIES {
            self.rate_limiter.enforce().await;

            if attempt > 0 {
                let delay =
                    StdDuration::from_secs_f64(2.0_f64.powi(attempt as i32 - 1) + rand::random::<f64>());
                debug!(url, attempt, reason = %last_error, "retrying after backoff");
                sleep(delay).await;
            }

            let request = isahc::Request::builder()
                .uri(url)
                .method("GET")
                .header("Accept", "application/json, text/plain, */*")
                .header("User-Agent", self.get_user_agent())
                .body(())
                .map_err(|e| SourceError::InvalidResponse(format!("request build error: {}", e)))?;

            let response = self.client.send_async(request).await;

            match response {
                Ok(mut resp) => {
                    let status = resp.status();
                    let text = match resp.text().await {
                        Ok(text) => text,
                        Err(e) => {
                            last_error = format!("response body error: {}", e);
                            continue;
                        }
                    };

                    if status.is_success() || status.is_client_error() {
                        match serde_json::from_str::<Value>(&text) {
                            Ok(data) => return Ok(data),
                            Err(e) if status.is_success() => {
                                last_error = format!("JSON parse error: {}", e);
                                continue;
                            }
                            Err(_) => {
                                return Err(SourceError::InvalidResponse(format!(
                                    "HTTP {} without JSON body",
                                    status.as_u16()
                                )));
                            }
                        }
                    }

                    last_error = format!("HTTP {}", status.as_u16());
                }
                Err(e) => {
                    last_error = format!("network error: {}", e);
                }
            }
        }

        Err(SourceError::Http(last_error))
    }

    fn chart_url(&self, ticker: &str, period: &str, interval: &str) -> String {
        format!(
            "{}/v8/finance/chart/{}?range={}&interval={}&events=div%2Csplit",
            self.base_url, ticker, period, interval
        )
    }

    fn quote_summary_url(&self, ticker: &str) -> String {
        format!(
            "{}/v10/finance/quoteSummary/{}?modules=assetProfile%2CfinancialData%2Cprice",
            self.base_url, ticker
        )
    }
}

/// Pull a float out of the chart quote arrays, NaN when the slot is null
fn quote_value(arr: Option<&Vec<Value>>, index: usize) -> f64 {
    arr.and_then(|a| a.get(index))
        .and_then(Value::as_f64)
        .unwrap_or(f64::NAN)
}

fn parse_chart_document(root: &Value) -> Vec<Ohlcv> {
    let chart = &root["chart"];
    if !chart["error"].is_null() {
        return Vec::new();
    }

    let result = &chart["result"][0];
    let timestamps = match result["timestamp"].as_array() {
        Some(ts) => ts,
        None => return Vec::new(),
    };

    let quote = &result["indicators"]["quote"][0];
    let opens = quote["open"].as_array();
    let highs = quote["high"].as_array();
    let lows = quote["low"].as_array();
    let closes = quote["close"].as_array();
    let volumes = quote["volume"].as_array();

    let mut bars = Vec::with_capacity(timestamps.len());
    for (i, ts) in timestamps.iter().enumerate() {
        let seconds = match ts.as_i64() {
            Some(s) => s,
            None => continue,
        };
        let time = match Utc.timestamp_opt(seconds, 0).single() {
            Some(t) => t,
            None => continue,
        };

        let open = quote_value(opens, i);
        let high = quote_value(highs, i);
        let low = quote_value(lows, i);
        let close = quote_value(closes, i);

        // A fully null row carries no information at all
        if open.is_nan() && high.is_nan() && low.is_nan() && close.is_nan() {
            continue;
        }

        let volume = volumes
            .and_then(|a| a.get(i))
            .and_then(Value::as_u64)
            .unwrap_or(0);

        bars.push(Ohlcv::new(time, open, high, low, close, volume));
    }

    bars
}

#[async_trait]
impl HistorySource for YahooClient {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    async fn fetch_history(
        &self,
        ticker: &str,
        period: &str,
        interval: &str,
    ) -> Result<Vec<Ohlcv>, SourceError> {
        let url = self.chart_url(ticker, period, interval);
        let root = self.get_json(&url).await?;
        Ok(parse_chart_document(&root))
    }
}

#[async_trait]
impl MetadataSource for YahooClient {
    async fn profile(&self, ticker: &str) -> Result<TickerProfile, SourceError> {
        let url = self.quote_summary_url(ticker);
        let root = self.get_json(&url).await?;

        let summary = &root["quoteSummary"];
        if !summary["error"].is_null() {
            return Err(SourceError::InvalidResponse(format!(
                "quote summary error for {}",
                ticker
            )));
        }

        let result = &summary["result"][0];
        Ok(TickerProfile {
            market_cap: result["price"]["marketCap"]["raw"].as_f64(),
            earnings_growth: result["financialData"]["earningsGrowth"]["raw"].as_f64(),
            sector: result["assetProfile"]["sector"]
                .as_str()
                .map(|s| s.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_chart_document() {
        let root = json!({
            "chart": {
                "error": null,
                "result": [{
                    "timestamp": [1704153600, 1704240000, 1704326400],
                    "indicators": {
                        "quote": [{
                            "open":   [10.0, 10.5, null],
                            "high":   [10.8, 10.9, null],
                            "low":    [9.9, 10.2, null],
                            "close":  [10.5, 10.7, null],
                            "volume": [120000, 98000, null]
                        }]
                    }
                }]
            }
        });

        let bars = parse_chart_document(&root);
        // The fully null third row is dropped
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].close, 10.5);
        assert_eq!(bars[1].volume, 98000);
    }

    #[test]
    fn test_parse_chart_keeps_partial_rows_as_nan() {
        let root = json!({
            "chart": {
                "error": null,
                "result": [{
                    "timestamp": [1704153600, 1704240000],
                    "indicators": {
                        "quote": [{
                            "open":   [10.0, 10.5],
                            "high":   [10.8, 10.9],
                            "low":    [9.9, 10.2],
                            "close":  [10.5, null],
                            "volume": [120000, 98000]
                        }]
                    }
                }]
            }
        });

        let bars = parse_chart_document(&root);
        assert_eq!(bars.len(), 2);
        assert!(bars[1].close.is_nan());
    }

    #[test]
    fn test_parse_chart_error_document_is_empty() {
        let root = json!({
            "chart": {
                "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"},
                "result": null
            }
        });

        assert!(parse_chart_document(&root).is_empty());
    }
}

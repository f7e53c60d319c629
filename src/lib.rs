//! Multi-timeframe RSI scanner for China A-shares
//!
//! Enumerates candidate Shanghai/Shenzhen tickers, fetches Daily/Weekly/
//! Monthly history through a two-source fallback provider, classifies each
//! ticker's latest Wilder RSI as oversold/overbought, enriches signals with
//! market metadata, and streams events to the consuming surface. Scan
//! progress persists to a JSON file so long runs resume across restarts.

pub mod cli;
pub mod commands;
pub mod constants;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;
pub mod worker;

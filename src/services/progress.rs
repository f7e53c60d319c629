//! Scan progress persistence
//!
//! Serializes the orchestrator's state to a JSON document so a scan can
//! resume across restarts. Loading only rehydrates state; it never starts
//! a scan by itself. I/O failures leave the in-memory state untouched.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::error::{AppError, Result};
use crate::models::{ScanRecord, ScanState, SignalBucket};

/// On-disk progress document
///
/// The processed set is persisted as a sorted list for stable diffs; order
/// carries no meaning. Bucket lists keep discovery order. Booleans inside
/// records render as "Yes"/"No" (see [`crate::models::ScanRecord`]).
#[derive(Debug, Serialize, Deserialize)]
pub struct ProgressDocument {
    pub processed_tickers: Vec<String>,
    pub oversold_signals: Vec<ScanRecord>,
    pub filtered_oversold_signals: Vec<ScanRecord>,
    pub overbought_signals: Vec<ScanRecord>,
    pub filtered_overbought_signals: Vec<ScanRecord>,
    pub selected_sectors: Vec<String>,
}

impl From<&ScanState> for ProgressDocument {
    fn from(state: &ScanState) -> Self {
        let mut processed: Vec<String> = state.processed.iter().cloned().collect();
        processed.sort();

        let mut sectors: Vec<String> = state.selected_sectors.iter().cloned().collect();
        sectors.sort();

        Self {
            processed_tickers: processed,
            oversold_signals: state.oversold.records().to_vec(),
            filtered_oversold_signals: state.filtered_oversold.records().to_vec(),
            overbought_signals: state.overbought.records().to_vec(),
            filtered_overbought_signals: state.filtered_overbought.records().to_vec(),
            selected_sectors: sectors,
        }
    }
}

impl ProgressDocument {
    /// Rebuild orchestrator state from the document
    pub fn into_state(self) -> ScanState {
        ScanState {
            processed: self.processed_tickers.into_iter().collect(),
            oversold: SignalBucket::from(self.oversold_signals),
            filtered_oversold: SignalBucket::from(self.filtered_oversold_signals),
            overbought: SignalBucket::from(self.overbought_signals),
            filtered_overbought: SignalBucket::from(self.filtered_overbought_signals),
            selected_sectors: self.selected_sectors.into_iter().collect::<HashSet<_>>(),
            show_all_sectors: false,
        }
    }
}

/// Save a state snapshot to a progress file
pub fn save(path: &Path, state: &ScanState) -> Result<()> {
    let document = ProgressDocument::from(state);
    let json = serde_json::to_string_pretty(&document)?;
    fs::write(path, json).map_err(|e| AppError::Io(format!("write {}: {}", path.display(), e)))?;
    Ok(())
}

/// Load a state snapshot from a progress file
pub fn load(path: &Path) -> Result<ScanState> {
    let json = fs::read_to_string(path)
        .map_err(|e| AppError::Io(format!("read {}: {}", path.display(), e)))?;
    let document: ProgressDocument = serde_json::from_str(&json)?;
    Ok(document.into_state())
}

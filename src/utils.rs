use std::path::PathBuf;

/// Get the progress file path from environment variable or use default
pub fn default_progress_path() -> PathBuf {
    std::env::var("SCAN_PROGRESS_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("scan_progress.json"))
}

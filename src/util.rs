//! Small formatting helpers shared by the CLI output and the logger.

use chrono::{DateTime, Utc};

/// What: Render an epoch timestamp in seconds as `YYYY-MM-DD HH:MM:SS` (UTC).
///
/// Inputs:
/// - `ts`: Seconds since the Unix epoch, or `None`
///
/// Output:
/// - Formatted date string; empty when `ts` is `None` or out of range
pub fn ts_to_date(ts: Option<i64>) -> String {
    let Some(secs) = ts else {
        return String::new();
    };
    DateTime::<Utc>::from_timestamp(secs, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| secs.to_string())
}

/// What: Render an epoch timestamp in milliseconds as a short date for lists.
///
/// Inputs:
/// - `ms`: Milliseconds since the Unix epoch
///
/// Output:
/// - `YYYY-MM-DD HH:MM` string; `-` when the value is zero or out of range
pub fn ms_to_date(ms: i64) -> String {
    if ms == 0 {
        return "-".to_string();
    }
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// What: Format a byte count for human consumption (B/KB/MB/GB, one decimal).
///
/// Inputs:
/// - `bytes`: Size in bytes
///
/// Output:
/// - Compact size string, e.g. `14.2 MB`
pub fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = 1024.0 * 1024.0;
    const GB: f64 = 1024.0 * 1024.0 * 1024.0;
    let b = bytes as f64;
    if b < KB {
        format!("{bytes} B")
    } else if b < MB {
        format!("{:.1} KB", b / KB)
    } else if b < GB {
        format!("{:.1} MB", b / MB)
    } else {
        format!("{:.1} GB", b / GB)
    }
}

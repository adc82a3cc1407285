//! Share-cache scratch directory and its startup reaper.

use std::path::Path;
use std::time::{Duration, SystemTime};

/// Staged share copies older than this are reaped at startup (24 hours).
pub const DEFAULT_MAX_AGE_MS: u64 = 24 * 60 * 60 * 1000;

/// Ensure the scratch directory exists before staging a copy into it.
pub fn ensure_share_dir(dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)
}

/// What: Delete stale staged copies from the share cache.
///
/// Inputs:
/// - `dir`: Scratch directory (direct children only, no recursion)
/// - `max_age_ms`: Age threshold; files modified before `now - max_age_ms`
///   are removed
///
/// Output:
/// - Number of files removed
///
/// Details:
/// - A missing directory is a no-op, not an error.
/// - Only plain files are considered; per-file stat/delete failures are
///   silently skipped (best-effort housekeeping).
pub fn reap_stale_exports(dir: &Path, max_age_ms: u64) -> usize {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return 0;
    };
    let Some(cutoff) = SystemTime::now().checked_sub(Duration::from_millis(max_age_ms)) else {
        return 0;
    };
    let mut removed = 0usize;
    for entry in entries.flatten() {
        let Ok(meta) = entry.metadata() else {
            continue;
        };
        if !meta.is_file() {
            continue;
        }
        let Ok(modified) = meta.modified() else {
            continue;
        };
        if modified < cutoff && std::fs::remove_file(entry.path()).is_ok() {
            removed += 1;
        }
    }
    if removed > 0 {
        tracing::info!(removed, dir = %dir.display(), "reaped stale share-cache exports");
    }
    removed
}

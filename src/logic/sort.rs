//! Stable ordering of inventory rows.

use crate::state::{AppRecord, SortKey};

/// What: Sort filtered rows by the active key, keeping ties stable.
///
/// Inputs:
/// - `rows`: Filtered records in snapshot order
/// - `key`: Active sort key
///
/// Output:
/// - The same vector, reordered; records with equal keys keep their original
///   relative order
///
/// Details:
/// - `NameAscending` compares lowercased display names; `RecentlyUpdated`
///   compares update timestamps descending. `Vec::sort_by` is stable, which
///   the tie-break contract relies on.
pub fn sort_records(mut rows: Vec<AppRecord>, key: SortKey) -> Vec<AppRecord> {
    match key {
        SortKey::NameAscending => {
            rows.sort_by(|a, b| {
                a.display_name
                    .to_lowercase()
                    .cmp(&b.display_name.to_lowercase())
            });
        }
        SortKey::RecentlyUpdatedDescending => {
            rows.sort_by(|a, b| b.last_update_ms.cmp(&a.last_update_ms));
        }
    }
    rows
}

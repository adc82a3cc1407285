//! Visibility and search predicates for the inventory projection.

use crate::state::{AppRecord, ViewFilter};

/// What: Decide whether a single record survives the filter.
///
/// Inputs:
/// - `record`: Candidate inventory record
/// - `filter`: Active view filter
///
/// Output:
/// - `true` when the record passes both the visibility and search predicates
///
/// Details:
/// - System apps are kept only when `include_system_apps` is set.
/// - A blank search term matches everything; otherwise the term must appear
///   case-insensitively in the display name or the identifier.
pub fn matches_filter(record: &AppRecord, filter: &ViewFilter) -> bool {
    if !filter.include_system_apps && record.is_system_app {
        return false;
    }
    let term = filter.search_text.trim();
    if term.is_empty() {
        return true;
    }
    let needle = term.to_lowercase();
    record.display_name.to_lowercase().contains(&needle)
        || record.identifier.to_lowercase().contains(&needle)
}

/// What: Apply the filter to a whole snapshot.
///
/// Inputs:
/// - `snapshot`: Immutable inventory snapshot
/// - `filter`: Active view filter
///
/// Output:
/// - Fresh vector of surviving records in snapshot order
pub fn apply_filter(snapshot: &[AppRecord], filter: &ViewFilter) -> Vec<AppRecord> {
    snapshot
        .iter()
        .filter(|r| matches_filter(r, filter))
        .cloned()
        .collect()
}

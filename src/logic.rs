//! Pure projection logic for the inventory view.
//!
//! Filtering and sorting never mutate the snapshot; every projection produces
//! a fresh sequence. [`project`] composes the visibility/search predicate with
//! the stable sort for the active key and is the single entry point used by
//! [`crate::state::InventoryView`].

pub mod filter;
pub mod sort;

pub use filter::{apply_filter, matches_filter};
pub use sort::sort_records;

use crate::state::{AppRecord, ViewFilter};

/// What: Project a snapshot through a filter into an ordered row list.
///
/// Inputs:
/// - `snapshot`: Immutable inventory snapshot
/// - `filter`: Search text, system-app visibility, and sort key
///
/// Output:
/// - Fresh vector of matching records in the requested order
///
/// Details:
/// - Pure and deterministic; ties keep their original snapshot order.
pub fn project(snapshot: &[AppRecord], filter: &ViewFilter) -> Vec<AppRecord> {
    sort_records(apply_filter(snapshot, filter), filter.sort_key)
}

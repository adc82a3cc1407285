//! Core data types for the apkex inventory and export pipeline.
//!
//! This module defines the normalized application record produced by the
//! inventory builder, the filter/sort inputs owned by the presentation layer,
//! the live [`InventoryView`] projection, and the export state machine
//! observed by the UI while a copy is running.

use serde::{Deserialize, Serialize};

/// Opaque handle naming an icon resource for one application.
///
/// The core never opens or parses the handle; it is carried through for the
/// presentation layer and dropped from persisted snapshots.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IconHandle(String);

impl IconHandle {
    /// Wrap a raw token produced by the package registry.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Borrow the raw token for hand-off to the presentation layer.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Immutable snapshot of one installed application at query time.
///
/// Constructed fresh on every inventory query, never mutated, and superseded
/// wholesale by the next query.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppRecord {
    /// Human-readable label; falls back to the identifier when the registry
    /// cannot resolve one.
    pub display_name: String,
    /// Unique reverse-DNS package id within one snapshot.
    pub identifier: String,
    /// Version string as reported by the registry (may be empty).
    pub version_name: String,
    /// Monotonic version code; 0 when the registry cannot supply one.
    pub version_code: i64,
    /// Last update time in milliseconds since the Unix epoch.
    pub last_update_ms: i64,
    /// Size of the installed package file in bytes (0 when unreadable).
    pub size_bytes: u64,
    /// Opaque location of the installed package binary.
    pub source_path: String,
    /// Whether the application is factory-installed or an updated factory app.
    pub is_system_app: bool,
    /// Icon handle when resolution succeeded; never an error.
    #[serde(skip)]
    pub icon: Option<IconHandle>,
}

/// Ordered result of one inventory query; replaced wholesale on refresh.
pub type InventorySnapshot = Vec<AppRecord>;

/// Sort key for the inventory view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    /// Case-insensitive lexicographic order by display name.
    #[default]
    NameAscending,
    /// Most recently updated first.
    RecentlyUpdatedDescending,
}

impl SortKey {
    /// Stable key used when persisting the sort order to `settings.conf`.
    pub fn as_config_key(&self) -> &'static str {
        match self {
            SortKey::NameAscending => "name",
            SortKey::RecentlyUpdatedDescending => "recently_updated",
        }
    }

    /// Parse a persisted config key; unknown or corrupt values yield `None`
    /// so callers can fall back to the default silently.
    pub fn from_config_key(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "name" | "name_ascending" | "alphabetical" => Some(SortKey::NameAscending),
            "recently_updated" | "last_updated" | "updated" => {
                Some(SortKey::RecentlyUpdatedDescending)
            }
            _ => None,
        }
    }
}

/// Filter and ordering inputs for the inventory projection.
///
/// Transient and owned by the presentation layer; projecting a snapshot
/// through a filter is a pure function.
#[derive(Debug, Clone, Default)]
pub struct ViewFilter {
    /// Substring matched case-insensitively against name and identifier.
    pub search_text: String,
    /// When `false`, system applications are hidden.
    pub include_system_apps: bool,
    /// Active sort key.
    pub sort_key: SortKey,
}

/// Live filtered/sorted projection of the inventory.
///
/// Holds the last snapshot and filter and recomputes `rows` whenever either
/// changes; the computation itself is pure and side-effect free.
#[derive(Debug, Default)]
pub struct InventoryView {
    snapshot: InventorySnapshot,
    filter: ViewFilter,
    rows: Vec<AppRecord>,
}

impl InventoryView {
    /// Build a view over `snapshot` with `filter` applied immediately.
    pub fn new(snapshot: InventorySnapshot, filter: ViewFilter) -> Self {
        let mut view = Self {
            snapshot,
            filter,
            rows: Vec::new(),
        };
        view.recompute();
        view
    }

    /// Current projection, most relevant ordering applied.
    pub fn rows(&self) -> &[AppRecord] {
        &self.rows
    }

    /// Filter currently applied to the snapshot.
    pub fn filter(&self) -> &ViewFilter {
        &self.filter
    }

    /// Replace the snapshot wholesale (inventory refresh) and recompute.
    pub fn set_snapshot(&mut self, snapshot: InventorySnapshot) {
        self.snapshot = snapshot;
        self.recompute();
    }

    /// Update the search term and recompute.
    pub fn set_search(&mut self, text: impl Into<String>) {
        self.filter.search_text = text.into();
        self.recompute();
    }

    /// Toggle system-app visibility and recompute.
    pub fn set_show_system(&mut self, show: bool) {
        self.filter.include_system_apps = show;
        self.recompute();
    }

    /// Switch the sort key and recompute.
    pub fn set_sort(&mut self, key: SortKey) {
        self.filter.sort_key = key;
        self.recompute();
    }

    fn recompute(&mut self) {
        self.rows = crate::logic::project(&self.snapshot, &self.filter);
    }
}

/// Location of a written copy, reported inside successful outcomes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportedLocation {
    /// Opaque handle of the written file.
    pub file: String,
    /// Containing folder when the folder-save variant produced the copy.
    pub folder: Option<String>,
}

/// Export state machine observed by the presentation layer.
///
/// `Idle` is the initial state and the only state from which a new export may
/// start; terminal states must be acknowledged (reset) before another export
/// begins.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum ExportStatus {
    /// No export running; ready to accept a request.
    #[default]
    Idle,
    /// A plain export (arbitrary file or share staging) is streaming.
    Exporting,
    /// Arbitrary-file export finished successfully.
    ExportSuccess,
    /// Share staging finished; the staged location is ready for hand-off.
    ShareReady(ExportedLocation),
    /// A folder-save copy is streaming.
    SavingToPhone,
    /// Folder save finished successfully.
    SaveSuccess(ExportedLocation),
    /// No default folder configured; the caller should start selection.
    NoFolderSelected,
    /// The operation failed with a human-readable cause.
    Error(String),
}

impl ExportStatus {
    /// Whether a new export may be started from this state.
    pub fn is_idle(&self) -> bool {
        matches!(self, ExportStatus::Idle)
    }

    /// Whether the state is terminal and awaiting acknowledgement.
    pub fn is_terminal(&self) -> bool {
        !matches!(
            self,
            ExportStatus::Idle | ExportStatus::Exporting | ExportStatus::SavingToPhone
        )
    }
}

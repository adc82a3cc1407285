//! Inventory builder: raw registry records to normalized [`AppRecord`]s.
//!
//! The builder isolates registry quirks behind documented fallbacks: labels
//! fall back to the identifier, unreadable package files size to zero, icon
//! resolution failures stay `None`, and malformed records are skipped. One
//! bad package never blocks the inventory. A JSON snapshot cache under the
//! cache directory keeps the last query available when the registry is
//! unreachable.

use std::collections::HashSet;
use std::path::Path;

use crate::registry::{FLAG_SYSTEM, FLAG_UPDATED_SYSTEM, RawPackageRecord};
use crate::state::{AppRecord, InventorySnapshot};

/// What: Normalize raw registry records into an inventory snapshot.
///
/// Inputs:
/// - `raw`: Records as returned by the package registry
///
/// Output:
/// - Ordered snapshot of [`AppRecord`]s; infallible
///
/// Details:
/// - Records missing an identifier or source path are skipped.
/// - Duplicate identifiers keep the first occurrence, upholding the
///   snapshot uniqueness invariant.
/// - `size_bytes` is stat-ed here; any I/O failure yields 0.
/// - `is_system_app` is the OR of the factory and updated-factory flag bits.
pub fn build(raw: Vec<RawPackageRecord>) -> InventorySnapshot {
    let mut seen: HashSet<String> = HashSet::new();
    let mut snapshot = Vec::with_capacity(raw.len());
    for rec in raw {
        if rec.identifier.is_empty() || rec.source_path.is_empty() {
            tracing::debug!(identifier = %rec.identifier, "skipping malformed registry record");
            continue;
        }
        if !seen.insert(rec.identifier.clone()) {
            continue;
        }
        let display_name = match rec.label {
            Some(label) if !label.trim().is_empty() => label,
            _ => rec.identifier.clone(),
        };
        snapshot.push(AppRecord {
            display_name,
            identifier: rec.identifier,
            version_name: rec.version_name.unwrap_or_default(),
            version_code: rec.version_code,
            last_update_ms: rec.last_update_ms,
            size_bytes: stat_size(&rec.source_path),
            source_path: rec.source_path,
            is_system_app: rec.flags & (FLAG_SYSTEM | FLAG_UPDATED_SYSTEM) != 0,
            icon: rec.icon,
        });
    }
    snapshot
}

/// Size of the package file in bytes; 0 on any I/O failure so one unreadable
/// package cannot block the build.
fn stat_size(path: &str) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

/// What: Persist a snapshot as JSON under the cache directory.
///
/// Inputs:
/// - `path`: Cache file location
/// - `snapshot`: Snapshot to persist
///
/// Output:
/// - `Ok(())` on success; otherwise the underlying I/O or encoding error
pub fn save_snapshot(path: &Path, snapshot: &InventorySnapshot) -> std::io::Result<()> {
    let body = serde_json::to_string(snapshot).map_err(std::io::Error::other)?;
    std::fs::write(path, body)
}

/// What: Load the cached snapshot, tolerating absence and corruption.
///
/// Inputs:
/// - `path`: Cache file location
///
/// Output:
/// - Cached snapshot, or an empty one when the file is missing or unparsable
pub fn load_snapshot(path: &Path) -> InventorySnapshot {
    let Ok(body) = std::fs::read_to_string(path) else {
        return Vec::new();
    };
    match serde_json::from_str(&body) {
        Ok(snapshot) => snapshot,
        Err(err) => {
            tracing::warn!(error = %err, path = %path.display(), "ignoring corrupt snapshot cache");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn raw(id: &str, path: &str) -> RawPackageRecord {
        RawPackageRecord {
            identifier: id.to_string(),
            source_path: path.to_string(),
            ..Default::default()
        }
    }

    /// What: Labels fall back to the identifier when missing or blank
    ///
    /// - Input: Records with no label, a blank label, and a real label
    /// - Output: Identifier used for the first two, label kept for the third
    #[test]
    fn label_falls_back_to_identifier() {
        let mut with_label = raw("com.c", "/tmp/nope.apk");
        with_label.label = Some("Real Name".to_string());
        let mut blank = raw("com.b", "/tmp/nope.apk");
        blank.label = Some("   ".to_string());
        let snapshot = build(vec![raw("com.a", "/tmp/nope.apk"), blank, with_label]);
        let names: Vec<&str> = snapshot.iter().map(|r| r.display_name.as_str()).collect();
        assert_eq!(names, vec!["com.a", "com.b", "Real Name"]);
    }

    /// What: Unreadable package files size to zero instead of failing
    ///
    /// - Input: One record pointing at a real file, one at a missing path
    /// - Output: Real size for the first, 0 for the second, both present
    #[test]
    fn unreadable_sizes_default_to_zero() {
        let dir = tempfile::tempdir().expect("tempdir");
        let apk = dir.path().join("base.apk");
        let mut f = std::fs::File::create(&apk).expect("create");
        f.write_all(&[0u8; 123]).expect("write");
        let snapshot = build(vec![
            raw("com.real", apk.to_str().expect("utf8 path")),
            raw("com.gone", "/definitely/not/here.apk"),
        ]);
        assert_eq!(snapshot[0].size_bytes, 123);
        assert_eq!(snapshot[1].size_bytes, 0);
    }

    /// What: Malformed and duplicate records are skipped, not fatal
    ///
    /// - Input: Empty identifier, empty path, and a duplicated identifier
    /// - Output: Only the two well-formed, distinct records survive
    #[test]
    fn malformed_and_duplicate_records_are_skipped() {
        let snapshot = build(vec![
            raw("", "/tmp/a.apk"),
            raw("com.ok", "/tmp/ok.apk"),
            raw("com.nopath", ""),
            raw("com.ok", "/tmp/duplicate.apk"),
            raw("com.two", "/tmp/two.apk"),
        ]);
        let ids: Vec<&str> = snapshot.iter().map(|r| r.identifier.as_str()).collect();
        assert_eq!(ids, vec!["com.ok", "com.two"]);
        assert_eq!(snapshot[0].source_path, "/tmp/ok.apk");
    }

    /// What: System flag is the OR of the factory and updated-factory bits
    ///
    /// - Input: Records carrying each bit, both, and neither
    /// - Output: `is_system_app` true for any set bit
    #[test]
    fn system_flag_is_or_of_both_bits() {
        let mut factory = raw("com.f", "/tmp/f.apk");
        factory.flags = FLAG_SYSTEM;
        let mut updated = raw("com.u", "/tmp/u.apk");
        updated.flags = FLAG_UPDATED_SYSTEM;
        let mut both = raw("com.fu", "/tmp/fu.apk");
        both.flags = FLAG_SYSTEM | FLAG_UPDATED_SYSTEM;
        let user = raw("com.user", "/tmp/user.apk");
        let snapshot = build(vec![factory, updated, both, user]);
        let flags: Vec<bool> = snapshot.iter().map(|r| r.is_system_app).collect();
        assert_eq!(flags, vec![true, true, true, false]);
    }

    /// What: Snapshot cache round-trips and tolerates corruption
    ///
    /// - Input: Saved snapshot, then a file of garbage bytes
    /// - Output: Identical records on load; empty snapshot for garbage
    #[test]
    fn snapshot_cache_round_trip_and_corruption() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = dir.path().join("inventory.json");
        let snapshot = build(vec![raw("com.keep", "/tmp/keep.apk")]);
        save_snapshot(&cache, &snapshot).expect("save");
        let loaded = load_snapshot(&cache);
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].identifier, "com.keep");

        std::fs::write(&cache, b"{not json").expect("write");
        assert!(load_snapshot(&cache).is_empty());
        assert!(load_snapshot(&dir.path().join("missing.json")).is_empty());
    }
}

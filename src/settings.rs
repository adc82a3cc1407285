//! Persisted user settings (`settings.conf`).
//!
//! Settings are stored as `key = value` lines with `#`/`//` comments. Loading
//! never fails: a missing file yields defaults and unparsable lines are
//! skipped. Saving rewrites the file in place, replacing only the affected
//! key and preserving comments and unrelated lines; missing keys are
//! appended. The store is an explicitly constructed service handed to its
//! consumers, with no hidden global state.

use std::io;
use std::path::{Path, PathBuf};

use crate::state::SortKey;

/// In-memory view of the persisted settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    /// Whether system applications are shown by default.
    pub show_system_apps: bool,
    /// Default sort order of the inventory view.
    pub sort_mode: SortKey,
    /// Persisted save-folder reference, when one has been granted.
    pub default_save_folder: Option<String>,
    /// Epoch milliseconds at which the folder grant was accepted.
    pub save_folder_granted_at: Option<i64>,
    /// Developer mode gate for the forced locale.
    pub dev_mode: bool,
    /// Locale code forced while developer mode is on.
    pub dev_forced_locale: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            show_system_apps: false,
            sort_mode: SortKey::NameAscending,
            default_save_folder: None,
            save_folder_granted_at: None,
            dev_mode: false,
            dev_forced_locale: None,
        }
    }
}

/// Handle on one `settings.conf` file.
#[derive(Clone, Debug)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Store at the default settings location under the config directory.
    pub fn open_default() -> Self {
        Self {
            path: crate::paths::settings_path(),
        }
    }

    /// Store at an explicit path (tests, alternate profiles).
    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// What: Load settings, tolerating absence and corruption.
    ///
    /// Inputs: None
    ///
    /// Output:
    /// - Parsed [`Settings`]; defaults for missing keys, unknown sort keys,
    ///   and unparsable lines
    pub fn load(&self) -> Settings {
        let mut settings = Settings::default();
        let Ok(content) = std::fs::read_to_string(&self.path) else {
            return settings;
        };
        for line in content.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with("//") {
                continue;
            }
            let Some(eq) = trimmed.find('=') else {
                continue;
            };
            let key = normalize_key(&trimmed[..eq]);
            let val = strip_inline_comment(trimmed[eq + 1..].trim());
            match key.as_str() {
                "show_system_apps" => settings.show_system_apps = parse_bool(val),
                "sort_mode" | "sort_order" => {
                    // Unknown or corrupt values keep the default silently.
                    if let Some(sm) = SortKey::from_config_key(val) {
                        settings.sort_mode = sm;
                    }
                }
                "default_save_folder" | "save_folder" => {
                    if !val.is_empty() {
                        settings.default_save_folder = Some(val.to_string());
                    }
                }
                "save_folder_granted_at" => {
                    settings.save_folder_granted_at = val.parse::<i64>().ok();
                }
                "dev_mode" | "developer_mode" => settings.dev_mode = parse_bool(val),
                "dev_forced_locale" | "forced_locale" => {
                    if !val.is_empty() {
                        settings.dev_forced_locale = Some(val.to_string());
                    }
                }
                _ => {}
            }
        }
        settings
    }

    /// Persist the system-app visibility default.
    pub fn set_show_system_apps(&self, show: bool) -> io::Result<()> {
        self.set_key("show_system_apps", Some(bool_str(show)))
    }

    /// Persist the default sort order.
    pub fn set_sort_mode(&self, key: SortKey) -> io::Result<()> {
        self.set_key("sort_mode", Some(key.as_config_key()))
    }

    /// What: Persist or clear the save-folder reference.
    ///
    /// Inputs:
    /// - `folder`: Folder handle plus grant timestamp, or `None` to clear
    ///
    /// Output:
    /// - `Ok(())` when both keys were written; the pair is kept consistent
    ///   (folder and timestamp are written or removed together)
    pub fn set_save_folder(&self, folder: Option<(&str, i64)>) -> io::Result<()> {
        match folder {
            Some((handle, granted_at)) => {
                self.set_key("default_save_folder", Some(handle))?;
                self.set_key("save_folder_granted_at", Some(&granted_at.to_string()))
            }
            None => {
                self.set_key("default_save_folder", None)?;
                self.set_key("save_folder_granted_at", None)
            }
        }
    }

    /// Persist the developer-mode flag.
    pub fn set_dev_mode(&self, enabled: bool) -> io::Result<()> {
        self.set_key("dev_mode", Some(bool_str(enabled)))
    }

    /// Persist or clear the forced locale code.
    pub fn set_dev_forced_locale(&self, locale: Option<&str>) -> io::Result<()> {
        self.set_key("dev_forced_locale", locale)
    }

    /// Rewrite the file replacing (or removing) one key, preserving comments
    /// and unrelated lines; appends the key when absent.
    fn set_key(&self, key: &str, value: Option<&str>) -> io::Result<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let mut lines: Vec<String> = match std::fs::read_to_string(&self.path) {
            Ok(content) => content.lines().map(str::to_string).collect(),
            Err(_) => Vec::new(),
        };
        let mut handled = false;
        lines.retain_mut(|line| {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with("//") {
                return true;
            }
            let Some(eq) = trimmed.find('=') else {
                return true;
            };
            if normalize_key(&trimmed[..eq]) != key {
                return true;
            }
            handled = true;
            match value {
                Some(v) => {
                    *line = format!("{key} = {v}");
                    true
                }
                None => false,
            }
        });
        if !handled && let Some(v) = value {
            lines.push(format!("{key} = {v}"));
        }
        let mut body = lines.join("\n");
        if !body.is_empty() {
            body.push('\n');
        }
        std::fs::write(&self.path, body)
    }
}

/// Normalize a raw key: lowercase with `.`/`-`/space folded to `_`.
fn normalize_key(raw: &str) -> String {
    raw.trim().to_lowercase().replace(['.', '-', ' '], "_")
}

/// Accepts the usual truthy spellings used in hand-edited config files.
fn parse_bool(val: &str) -> bool {
    let lv = val.to_ascii_lowercase();
    lv == "true" || lv == "1" || lv == "yes" || lv == "on"
}

fn bool_str(v: bool) -> &'static str {
    if v { "true" } else { "false" }
}

/// Drop a trailing `#`/`//` comment when separated from the value by
/// whitespace, so paths containing `#` survive.
fn strip_inline_comment(val: &str) -> &str {
    for pat in [" #", "\t#", " //", "\t//"] {
        if let Some(idx) = val.find(pat) {
            return val[..idx].trim_end();
        }
    }
    val
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(dir: &tempfile::TempDir) -> SettingsStore {
        SettingsStore::at(dir.path().join("settings.conf"))
    }

    /// What: Missing file loads pure defaults
    ///
    /// - Input: Store pointed at a nonexistent path
    /// - Output: `Settings::default()`
    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert_eq!(store(&dir).load(), Settings::default());
    }

    /// What: Every key round-trips through save and load
    ///
    /// - Input: All setters exercised, then a reload
    /// - Output: Loaded settings mirror what was written
    #[test]
    fn settings_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let s = store(&dir);
        s.set_show_system_apps(true).expect("write");
        s.set_sort_mode(SortKey::RecentlyUpdatedDescending)
            .expect("write");
        s.set_save_folder(Some(("/sdcard/Download/apks", 1_700_000_000_000)))
            .expect("write");
        s.set_dev_mode(true).expect("write");
        s.set_dev_forced_locale(Some("de")).expect("write");

        let loaded = s.load();
        assert!(loaded.show_system_apps);
        assert_eq!(loaded.sort_mode, SortKey::RecentlyUpdatedDescending);
        assert_eq!(
            loaded.default_save_folder.as_deref(),
            Some("/sdcard/Download/apks")
        );
        assert_eq!(loaded.save_folder_granted_at, Some(1_700_000_000_000));
        assert!(loaded.dev_mode);
        assert_eq!(loaded.dev_forced_locale.as_deref(), Some("de"));

        s.set_save_folder(None).expect("write");
        s.set_dev_forced_locale(None).expect("write");
        let cleared = s.load();
        assert_eq!(cleared.default_save_folder, None);
        assert_eq!(cleared.save_folder_granted_at, None);
        assert_eq!(cleared.dev_forced_locale, None);
    }

    /// What: Unknown sort values fall back silently to the default
    ///
    /// - Input: File with a corrupt `sort_mode` value
    /// - Output: `NameAscending`, no error
    #[test]
    fn corrupt_sort_mode_falls_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let s = store(&dir);
        std::fs::write(s.path(), "sort_mode = sideways\n").expect("write");
        assert_eq!(s.load().sort_mode, SortKey::NameAscending);
    }

    /// What: Rewrites preserve comments and unrelated keys
    ///
    /// - Input: Hand-written file with comments; one key updated
    /// - Output: Comments and the unrelated key survive; value replaced in
    ///   place, not appended twice
    #[test]
    fn rewrite_preserves_comments_and_other_keys() {
        let dir = tempfile::tempdir().expect("tempdir");
        let s = store(&dir);
        std::fs::write(
            s.path(),
            "# apkex settings\nshow_system_apps = false # toggle\nsort_mode = name\n",
        )
        .expect("write");
        s.set_show_system_apps(true).expect("write");
        let content = std::fs::read_to_string(s.path()).expect("read");
        assert!(content.contains("# apkex settings"));
        assert!(content.contains("sort_mode = name"));
        assert_eq!(content.matches("show_system_apps").count(), 1);
        assert!(content.contains("show_system_apps = true"));
    }

    /// What: Inline comments are stripped from values but not from paths
    ///
    /// - Input: Value with a trailing ` # comment` and a path containing `#`
    /// - Output: Comment removed; `#` embedded in the path kept
    #[test]
    fn inline_comment_stripping() {
        assert_eq!(strip_inline_comment("true # default"), "true");
        assert_eq!(strip_inline_comment("/a/b#c"), "/a/b#c");
        assert_eq!(strip_inline_comment("value // note"), "value");
    }
}

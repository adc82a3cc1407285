//! Filesystem locations used by apkex (config, cache, logs).
//!
//! All directories follow the XDG base-directory convention with a `HOME`
//! fallback. Every accessor ensures the directory exists before returning it;
//! creation failures are ignored and surface later as ordinary I/O errors at
//! the point of use.

use std::env;
use std::path::PathBuf;

/// Resolve the base configuration directory (`$XDG_CONFIG_HOME/apkex` or
/// `~/.config/apkex`), creating it when missing.
pub fn config_dir() -> PathBuf {
    let base = env::var("XDG_CONFIG_HOME")
        .ok()
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .or_else(|| {
            env::var("HOME")
                .ok()
                .filter(|s| !s.is_empty())
                .map(|h| PathBuf::from(h).join(".config"))
        })
        .unwrap_or_else(|| PathBuf::from("."));
    let dir = base.join("apkex");
    let _ = std::fs::create_dir_all(&dir);
    dir
}

/// Resolve the cache directory (`$XDG_CACHE_HOME/apkex` or `~/.cache/apkex`),
/// creating it when missing.
pub fn cache_dir() -> PathBuf {
    let base = env::var("XDG_CACHE_HOME")
        .ok()
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .or_else(|| {
            env::var("HOME")
                .ok()
                .filter(|s| !s.is_empty())
                .map(|h| PathBuf::from(h).join(".cache"))
        })
        .unwrap_or_else(|| PathBuf::from("."));
    let dir = base.join("apkex");
    let _ = std::fs::create_dir_all(&dir);
    dir
}

/// Resolve the log directory beneath the configuration directory.
pub fn logs_dir() -> PathBuf {
    let dir = config_dir().join("logs");
    let _ = std::fs::create_dir_all(&dir);
    dir
}

/// Path of the persisted settings file (`settings.conf`).
pub fn settings_path() -> PathBuf {
    config_dir().join("settings.conf")
}

/// Scratch directory used to stage share copies; reaped at startup.
pub fn share_cache_dir() -> PathBuf {
    cache_dir().join("exports")
}

/// Path of the persisted inventory snapshot cache.
pub fn snapshot_cache_path() -> PathBuf {
    cache_dir().join("inventory.json")
}

#[cfg(test)]
mod tests {
    /// What: Directory accessors honor `XDG_*` overrides and nest under `apkex`.
    ///
    /// - Input: `XDG_CONFIG_HOME`/`XDG_CACHE_HOME` pointed at a temp dir
    /// - Output: Returned paths live beneath the override and end in `apkex`
    #[test]
    fn dirs_follow_xdg_overrides() {
        let tmp = tempfile::tempdir().expect("tempdir");
        // Serialize env mutation against other tests in this binary.
        let _guard = crate::test_utils::env_lock()
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        let old_cfg = std::env::var("XDG_CONFIG_HOME").ok();
        let old_cache = std::env::var("XDG_CACHE_HOME").ok();
        unsafe {
            std::env::set_var("XDG_CONFIG_HOME", tmp.path());
            std::env::set_var("XDG_CACHE_HOME", tmp.path());
        }
        let cfg = super::config_dir();
        let cache = super::cache_dir();
        assert!(cfg.starts_with(tmp.path()));
        assert!(cache.starts_with(tmp.path()));
        assert!(cfg.ends_with("apkex"));
        assert!(super::settings_path().ends_with("settings.conf"));
        assert!(super::share_cache_dir().ends_with("exports"));
        unsafe {
            match old_cfg {
                Some(v) => std::env::set_var("XDG_CONFIG_HOME", v),
                None => std::env::remove_var("XDG_CONFIG_HOME"),
            }
            match old_cache {
                Some(v) => std::env::set_var("XDG_CACHE_HOME", v),
                None => std::env::remove_var("XDG_CACHE_HOME"),
            }
        }
    }
}

//! Durable access grants for the persisted save folder.
//!
//! The store keeps exactly one long-lived folder reference alive in the
//! settings file. A reference is only persisted after a durable-access probe
//! succeeds ("never persist a reference you cannot later use"), and every
//! consumer re-validates accessibility at call time because an external
//! revocation can invalidate a previously good reference at any moment.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::export::ExportError;
use crate::settings::SettingsStore;

/// Persisted reference to a user-granted folder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SavedFolderReference {
    /// Opaque uri-like folder handle.
    pub folder: String,
    /// Epoch milliseconds at which the grant was accepted.
    pub granted_at_ms: i64,
}

/// Store managing the save-folder grant lifecycle.
#[derive(Clone, Debug)]
pub struct PermissionStore {
    settings: SettingsStore,
}

impl PermissionStore {
    /// Store writing through the given settings service.
    pub fn new(settings: SettingsStore) -> Self {
        Self { settings }
    }

    /// What: Accept a folder-picker result and persist a durable reference.
    ///
    /// Inputs:
    /// - `folder`: Folder handle produced by the picker
    ///
    /// Output:
    /// - The persisted [`SavedFolderReference`] on success;
    ///   `PermissionGrantFailed` otherwise
    ///
    /// Details:
    /// - Probes durable access first (directory exists, a marker file can be
    ///   created and removed). A failed probe clears any stored reference
    ///   instead of persisting one.
    /// - A reference that cannot be persisted is reported as a failed grant;
    ///   the caller must not rely on it surviving a restart.
    pub fn grant(&self, folder: &str) -> Result<SavedFolderReference, ExportError> {
        if let Err(reason) = probe_durable_access(Path::new(folder)) {
            let _ = self.settings.set_save_folder(None);
            return Err(ExportError::PermissionGrantFailed(reason));
        }
        let granted_at_ms = now_ms();
        if let Err(err) = self.settings.set_save_folder(Some((folder, granted_at_ms))) {
            return Err(ExportError::PermissionGrantFailed(format!(
                "could not persist folder reference: {err}"
            )));
        }
        tracing::info!(folder, "save folder granted");
        Ok(SavedFolderReference {
            folder: folder.to_string(),
            granted_at_ms,
        })
    }

    /// Release the persisted reference, best-effort.
    pub fn revoke(&self) {
        let _ = self.settings.set_save_folder(None);
        tracing::info!("save folder reference cleared");
    }

    /// Re-read the persisted reference from the settings store.
    pub fn current(&self) -> Option<SavedFolderReference> {
        let settings = self.settings.load();
        settings.default_save_folder.map(|folder| SavedFolderReference {
            folder,
            granted_at_ms: settings.save_folder_granted_at.unwrap_or(0),
        })
    }

    /// What: Re-validate a folder handle at call time.
    ///
    /// Inputs:
    /// - `folder`: Folder handle to check
    ///
    /// Output:
    /// - `true` only when the folder currently exists, is a directory, and
    ///   is writable/traversable
    pub fn is_accessible(&self, folder: &str) -> bool {
        folder_accessible(Path::new(folder))
    }
}

/// Existence + directory-ness + writability check used on every consumption.
pub fn folder_accessible(dir: &Path) -> bool {
    let Ok(meta) = std::fs::metadata(dir) else {
        return false;
    };
    if !meta.is_dir() {
        return false;
    }
    #[cfg(unix)]
    {
        use nix::unistd::{AccessFlags, access};
        access(dir, AccessFlags::W_OK | AccessFlags::X_OK).is_ok()
    }
    #[cfg(not(unix))]
    {
        !meta.permissions().readonly()
    }
}

/// Human-facing name of a granted folder for the settings surface.
pub fn folder_display_name(folder: &str) -> Option<String> {
    Path::new(folder)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
}

/// Probe that a durable grant for `dir` would actually be usable: it must be
/// an existing directory into which a marker file can be created and removed.
fn probe_durable_access(dir: &Path) -> Result<(), String> {
    let meta =
        std::fs::metadata(dir).map_err(|err| format!("folder is not accessible: {err}"))?;
    if !meta.is_dir() {
        return Err("not a directory".to_string());
    }
    let marker = dir.join(".apkex-grant-probe");
    std::fs::write(&marker, b"probe").map_err(|err| format!("folder is not writable: {err}"))?;
    let _ = std::fs::remove_file(&marker);
    Ok(())
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .and_then(|d| i64::try_from(d.as_millis()).ok())
        .unwrap_or(0)
}

//! Package export engine: copy an installed package to a user destination.
//!
//! Three destination kinds share one streaming copy: an arbitrary
//! caller-resolved file handle, the app-private share cache, and the
//! persisted save folder. Every operation is gated by the [`ExportStatus`]
//! state machine: a new export starts only from `Idle`, and terminal states
//! must be acknowledged before the next request. Failures are never
//! swallowed; each resolves to a terminal state carrying a human-readable
//! cause.

pub mod cache;
pub mod copy;
pub mod destination;
pub mod filename;

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::permission::PermissionStore;
use crate::state::{AppRecord, ExportStatus, ExportedLocation};
use destination::{Destination, FsDestination};

/// Typed failure taxonomy for export and save operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Source package file is missing or unreadable; fatal for the request.
    #[error("source package is missing or unreadable")]
    SourceUnreadable,
    /// The chosen folder no longer exists or is inaccessible; re-select.
    #[error("destination folder is no longer accessible")]
    DestinationUnavailable,
    /// No folder configured; the caller should initiate selection.
    #[error("no destination folder selected")]
    NoDestinationSelected,
    /// The destination refused to open a byte sink.
    #[error("could not open destination for writing: {0}")]
    SinkOpenFailed(std::io::Error),
    /// The durable-access request was denied.
    #[error("durable access grant failed: {0}")]
    PermissionGrantFailed(String),
    /// I/O fault while streaming.
    #[error("copy failed: {0}")]
    Io(#[from] std::io::Error),
    /// Anything unanticipated.
    #[error("{0}")]
    Unknown(String),
}

/// One export request; created per user action and consumed once.
pub struct ExportRequest {
    /// Record whose package file is to be copied.
    pub record: AppRecord,
    /// Where the copy goes.
    pub destination: DestinationKind,
}

/// The three destination kinds of the unified export model.
pub enum DestinationKind {
    /// Caller-resolved writable handle (file-creation dialog result).
    ArbitraryFile(Box<dyn Destination + Send>),
    /// App-private scratch staging for a sharing intent.
    ShareCache,
    /// Persisted save folder, optionally overridden for this request.
    PersistedFolder(Option<String>),
}

/// Exactly one outcome per request.
pub type ExportOutcome = Result<ExportedLocation, ExportError>;

/// Export engine owning the status slot observed by the presentation layer.
///
/// One engine instance serializes its exports through the `Idle` gate;
/// concurrent exports would need per-request identity and are out of scope.
pub struct ExportEngine {
    status: ExportStatus,
    share_dir: PathBuf,
    permissions: PermissionStore,
}

impl ExportEngine {
    /// Engine staging share copies under `share_dir` and resolving the save
    /// folder through `permissions`.
    pub fn new(share_dir: PathBuf, permissions: PermissionStore) -> Self {
        Self {
            status: ExportStatus::Idle,
            share_dir,
            permissions,
        }
    }

    /// Current state machine position.
    pub fn status(&self) -> &ExportStatus {
        &self.status
    }

    /// Acknowledge a terminal state, returning the machine to `Idle`.
    pub fn acknowledge(&mut self) {
        if self.status.is_terminal() {
            self.status = ExportStatus::Idle;
        }
    }

    /// What: Dispatch a request to its destination kind.
    ///
    /// Inputs:
    /// - `request`: Record plus destination kind
    /// - `on_progress`: Optional percent callback (folder saves report
    ///   progress; the other kinds complete without it)
    ///
    /// Output:
    /// - The request's [`ExportOutcome`]
    pub fn export(
        &mut self,
        request: ExportRequest,
        on_progress: Option<&mut dyn FnMut(u32)>,
    ) -> ExportOutcome {
        match request.destination {
            DestinationKind::ArbitraryFile(dest) => {
                self.export_to(&request.record, dest.as_ref())
            }
            DestinationKind::ShareCache => self.prepare_share(&request.record),
            DestinationKind::PersistedFolder(folder) => {
                let mut noop = |_p: u32| {};
                let cb: &mut dyn FnMut(u32) = match on_progress {
                    Some(cb) => cb,
                    None => &mut noop,
                };
                self.save_to_folder(&request.record, folder.as_deref(), cb)
            }
        }
    }

    /// What: Copy the package into a caller-resolved destination handle.
    ///
    /// Inputs:
    /// - `record`: Record to export
    /// - `dest`: Already-resolved writable handle
    ///
    /// Output:
    /// - Outcome; status ends in `ExportSuccess` or `Error`
    pub fn export_to(&mut self, record: &AppRecord, dest: &dyn Destination) -> ExportOutcome {
        self.begin(ExportStatus::Exporting)?;
        tracing::info!(identifier = %record.identifier, "exporting package");
        match copy::stream_copy(Path::new(&record.source_path), dest, None) {
            Ok(_) => {
                self.status = ExportStatus::ExportSuccess;
                Ok(ExportedLocation {
                    file: dest.location(),
                    folder: None,
                })
            }
            Err(err) => self.fail(err),
        }
    }

    /// What: Stage a copy in the private share cache for hand-off.
    ///
    /// Inputs:
    /// - `record`: Record to stage
    ///
    /// Output:
    /// - Outcome whose location names the staged file; status ends in
    ///   `ShareReady` or `Error`
    ///
    /// Details:
    /// - The staged file must outlive one sharing intent; it is cleaned up
    ///   by the startup reaper, not here.
    pub fn prepare_share(&mut self, record: &AppRecord) -> ExportOutcome {
        self.begin(ExportStatus::Exporting)?;
        if let Err(err) = cache::ensure_share_dir(&self.share_dir) {
            return self.fail(ExportError::SinkOpenFailed(err));
        }
        let file_name = filename::suggested_file_name(record);
        let dest = FsDestination::new(self.share_dir.join(file_name));
        tracing::info!(identifier = %record.identifier, staged = %dest.location(), "staging share copy");
        match copy::stream_copy(Path::new(&record.source_path), &dest, None) {
            Ok(_) => {
                let location = ExportedLocation {
                    file: dest.location(),
                    folder: Some(self.share_dir.display().to_string()),
                };
                self.status = ExportStatus::ShareReady(location.clone());
                Ok(location)
            }
            Err(err) => self.fail(err),
        }
    }

    /// What: Save the package into the persisted (or overridden) folder.
    ///
    /// Inputs:
    /// - `record`: Record to save
    /// - `folder_override`: Folder for this request; falls back to the
    ///   persisted reference when `None`
    /// - `on_progress`: Integer percent callback, non-decreasing to 100
    ///
    /// Output:
    /// - Outcome; status ends in `SaveSuccess`, `NoFolderSelected`, or
    ///   `Error`
    ///
    /// Details:
    /// - Accessibility is re-validated here even for a stored reference; an
    ///   externally revoked folder surfaces as `DestinationUnavailable`.
    pub fn save_to_folder(
        &mut self,
        record: &AppRecord,
        folder_override: Option<&str>,
        on_progress: &mut dyn FnMut(u32),
    ) -> ExportOutcome {
        self.begin(ExportStatus::SavingToPhone)?;
        let folder = folder_override
            .map(str::to_string)
            .or_else(|| self.permissions.current().map(|r| r.folder));
        let Some(folder) = folder else {
            self.status = ExportStatus::NoFolderSelected;
            return Err(ExportError::NoDestinationSelected);
        };
        if !self.permissions.is_accessible(&folder) {
            return self.fail(ExportError::DestinationUnavailable);
        }
        let file_name = filename::suggested_file_name(record);
        let dest = FsDestination::new(Path::new(&folder).join(file_name));
        tracing::info!(identifier = %record.identifier, folder = %folder, "saving package to folder");
        match copy::stream_copy(Path::new(&record.source_path), &dest, Some(on_progress)) {
            Ok(_) => {
                let location = ExportedLocation {
                    file: dest.location(),
                    folder: Some(folder),
                };
                self.status = ExportStatus::SaveSuccess(location.clone());
                Ok(location)
            }
            Err(err) => self.fail(err),
        }
    }

    /// Enter a running state, or refuse when the gate is not `Idle`.
    fn begin(&mut self, next: ExportStatus) -> Result<(), ExportError> {
        if !self.status.is_idle() {
            return Err(ExportError::Unknown(
                "an export is already in progress; acknowledge the previous outcome first"
                    .to_string(),
            ));
        }
        self.status = next;
        Ok(())
    }

    /// Record a failure as the terminal state and pass the error through.
    fn fail(&mut self, err: ExportError) -> ExportOutcome {
        tracing::warn!(error = %err, "export failed");
        self.status = ExportStatus::Error(err.to_string());
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SettingsStore;

    fn engine(dir: &tempfile::TempDir) -> ExportEngine {
        let settings = SettingsStore::at(dir.path().join("settings.conf"));
        ExportEngine::new(
            dir.path().join("exports"),
            PermissionStore::new(settings),
        )
    }

    fn record(dir: &tempfile::TempDir, bytes: &[u8]) -> AppRecord {
        let source = dir.path().join("base.apk");
        std::fs::write(&source, bytes).expect("write source");
        AppRecord {
            display_name: "Demo App".to_string(),
            identifier: "com.example.demo".to_string(),
            version_name: "1.0".to_string(),
            version_code: 1,
            last_update_ms: 0,
            size_bytes: bytes.len() as u64,
            source_path: source.display().to_string(),
            is_system_app: false,
            icon: None,
        }
    }

    /// What: Share staging produces the sanitized file and `ShareReady`
    ///
    /// - Input: Record with ordinary fields
    /// - Output: File exists under the share dir; status carries its location
    #[test]
    fn prepare_share_stages_copy() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut engine = engine(&dir);
        let rec = record(&dir, b"payload");
        let location = engine.prepare_share(&rec).expect("share");
        assert!(location.file.ends_with("Demo_App_1.0_com.example.demo.apk"));
        assert_eq!(
            std::fs::read(&location.file).expect("read staged"),
            b"payload"
        );
        assert_eq!(engine.status(), &ExportStatus::ShareReady(location));
    }

    /// What: A second request is refused until the outcome is acknowledged
    ///
    /// - Input: Completed share, then another request before/after reset
    /// - Output: Refusal leaves the terminal state intact; works after reset
    #[test]
    fn gate_requires_acknowledgement() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut engine = engine(&dir);
        let rec = record(&dir, b"payload");
        engine.prepare_share(&rec).expect("share");
        let terminal = engine.status().clone();
        assert!(terminal.is_terminal());

        let refused = engine.prepare_share(&rec).expect_err("must refuse");
        assert!(matches!(refused, ExportError::Unknown(_)));
        assert_eq!(engine.status(), &terminal);

        engine.acknowledge();
        assert!(engine.status().is_idle());
        engine.prepare_share(&rec).expect("share after reset");
    }

    /// What: Folder save without a configured folder prompts selection
    ///
    /// - Input: No override, empty permission store
    /// - Output: `NoDestinationSelected` error, `NoFolderSelected` status
    #[test]
    fn save_without_folder_prompts_selection() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut engine = engine(&dir);
        let rec = record(&dir, b"payload");
        let mut progress = |_p: u32| {};
        let err = engine
            .save_to_folder(&rec, None, &mut progress)
            .expect_err("must fail");
        assert!(matches!(err, ExportError::NoDestinationSelected));
        assert_eq!(engine.status(), &ExportStatus::NoFolderSelected);
    }

    /// What: An inaccessible folder surfaces as unavailable, not a crash
    ///
    /// - Input: Override pointing at a missing directory
    /// - Output: `DestinationUnavailable` error, `Error` status
    #[test]
    fn save_to_missing_folder_is_unavailable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut engine = engine(&dir);
        let rec = record(&dir, b"payload");
        let mut progress = |_p: u32| {};
        let err = engine
            .save_to_folder(&rec, Some("/no/such/folder"), &mut progress)
            .expect_err("must fail");
        assert!(matches!(err, ExportError::DestinationUnavailable));
        assert!(matches!(engine.status(), ExportStatus::Error(_)));
    }

    /// What: A missing source fails the request with a typed cause
    ///
    /// - Input: Record pointing at a deleted source file
    /// - Output: `SourceUnreadable`; status is `Error` with the cause text
    #[test]
    fn missing_source_is_surfaced() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut engine = engine(&dir);
        let mut rec = record(&dir, b"payload");
        rec.source_path = "/vanished/base.apk".to_string();
        let dest = FsDestination::new(dir.path().join("out.apk"));
        let err = engine.export_to(&rec, &dest).expect_err("must fail");
        assert!(matches!(err, ExportError::SourceUnreadable));
        match engine.status() {
            ExportStatus::Error(msg) => assert!(msg.contains("unreadable")),
            other => panic!("unexpected status {other:?}"),
        }
    }

    /// What: Request dispatch routes each destination kind correctly
    ///
    /// - Input: `ExportRequest` for an arbitrary file and for the share cache
    /// - Output: Both land in their respective locations
    #[test]
    fn request_dispatch_covers_kinds() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut engine = engine(&dir);
        let rec = record(&dir, b"bytes");
        let out = dir.path().join("picked.apk");
        let outcome = engine.export(
            ExportRequest {
                record: rec.clone(),
                destination: DestinationKind::ArbitraryFile(Box::new(FsDestination::new(
                    out.clone(),
                ))),
            },
            None,
        );
        outcome.expect("arbitrary file export");
        assert_eq!(std::fs::read(&out).expect("read"), b"bytes");

        engine.acknowledge();
        let outcome = engine.export(
            ExportRequest {
                record: rec,
                destination: DestinationKind::ShareCache,
            },
            None,
        );
        let location = outcome.expect("share export");
        assert!(location.folder.expect("folder").ends_with("exports"));
    }
}

//! Destination handle boundary.
//!
//! A destination is an opaque writable-location handle resolved outside the
//! core (file-creation dialog, share cache, granted folder). The engine
//! requires exactly two capabilities of it: produce a byte sink and remove a
//! pre-existing entry so overwrite semantics hold.

use std::io;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Writable-location capability consumed by the copy engine.
pub trait Destination {
    /// Open the destination for writing, truncating any existing content.
    fn open_for_write(&self) -> io::Result<Box<dyn Write + Send>>;

    /// Remove an existing entry with this handle's name, best-effort.
    fn delete_if_exists(&self);

    /// Opaque location string reported back inside outcomes.
    fn location(&self) -> String;
}

/// Filesystem-backed destination handle.
#[derive(Clone, Debug)]
pub struct FsDestination {
    path: PathBuf,
}

impl FsDestination {
    /// Handle for a concrete filesystem path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Concrete path behind the handle.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Destination for FsDestination {
    fn open_for_write(&self) -> io::Result<Box<dyn Write + Send>> {
        Ok(Box::new(std::fs::File::create(&self.path)?))
    }

    fn delete_if_exists(&self) {
        // Deletion failures surface later as open/write errors if they matter.
        let _ = std::fs::remove_file(&self.path);
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

//! Streaming copy shared by every destination kind.

use std::io::{Read, Write};
use std::path::Path;

use super::ExportError;
use super::destination::Destination;

/// Intermediate buffer size: a balance between syscall overhead and memory
/// footprint, not a hard constraint.
pub const COPY_BUFFER_SIZE: usize = 8 * 1024;

/// What: Stream the source package into a destination with progress.
///
/// Inputs:
/// - `source`: Path of the installed package binary
/// - `dest`: Destination handle (sink + delete-if-exists)
/// - `on_progress`: Optional integer-percent callback
///
/// Output:
/// - `Ok(copied_bytes)` on success; a typed [`ExportError`] otherwise
///
/// Details:
/// - Fails fast with `SourceUnreadable` when the source is missing, not a
///   plain file, or unreadable.
/// - Deletes any existing destination entry first (overwrite, not append).
/// - Progress is `floor(copied * 100 / total)` after every buffer write and
///   reaches exactly 100 on success; an empty source reports 100 once.
pub fn stream_copy(
    source: &Path,
    dest: &dyn Destination,
    mut on_progress: Option<&mut dyn FnMut(u32)>,
) -> Result<u64, ExportError> {
    let meta = std::fs::metadata(source).map_err(|_| ExportError::SourceUnreadable)?;
    if !meta.is_file() {
        return Err(ExportError::SourceUnreadable);
    }
    let total = meta.len();
    let mut input = std::fs::File::open(source).map_err(|_| ExportError::SourceUnreadable)?;

    dest.delete_if_exists();
    let mut sink = dest.open_for_write().map_err(ExportError::SinkOpenFailed)?;

    let mut buf = [0u8; COPY_BUFFER_SIZE];
    let mut copied: u64 = 0;
    loop {
        let n = input.read(&mut buf)?;
        if n == 0 {
            break;
        }
        sink.write_all(&buf[..n])?;
        copied += n as u64;
        if let Some(cb) = on_progress.as_deref_mut() {
            // min() guards against a source that grew while streaming.
            let pct = if total == 0 {
                100
            } else {
                u32::try_from(copied.min(total) * 100 / total).unwrap_or(100)
            };
            cb(pct);
        }
    }
    sink.flush()?;
    if total == 0 && let Some(cb) = on_progress.as_deref_mut() {
        cb(100);
    }
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::destination::FsDestination;

    fn source_with(dir: &Path, bytes: &[u8]) -> std::path::PathBuf {
        let path = dir.join("base.apk");
        std::fs::write(&path, bytes).expect("write source");
        path
    }

    /// What: Progress is non-decreasing and ends at exactly 100
    ///
    /// - Input: 20000-byte source streamed in 8 KiB chunks
    /// - Output: Percent sequence `[40, 81, 100]`
    #[test]
    fn progress_is_monotonic_and_complete() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = source_with(dir.path(), &vec![7u8; 20_000]);
        let dest = FsDestination::new(dir.path().join("out.apk"));
        let mut seen: Vec<u32> = Vec::new();
        let mut cb = |p: u32| seen.push(p);
        let copied = stream_copy(&source, &dest, Some(&mut cb)).expect("copy");
        assert_eq!(copied, 20_000);
        assert_eq!(seen, vec![40, 81, 100]);
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    }

    /// What: An empty source still completes and reports 100 once
    ///
    /// - Input: Zero-byte source file
    /// - Output: Empty destination, progress `[100]`
    #[test]
    fn empty_source_reports_full_progress() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = source_with(dir.path(), b"");
        let dest = FsDestination::new(dir.path().join("out.apk"));
        let mut seen: Vec<u32> = Vec::new();
        let mut cb = |p: u32| seen.push(p);
        stream_copy(&source, &dest, Some(&mut cb)).expect("copy");
        assert_eq!(seen, vec![100]);
        assert_eq!(std::fs::read(dest.path()).expect("read").len(), 0);
    }

    /// What: Copying twice leaves exactly the second copy's bytes
    ///
    /// - Input: Same destination, two sources of different sizes
    /// - Output: Destination holds the second payload only
    #[test]
    fn copy_is_idempotent_overwrite() {
        let dir = tempfile::tempdir().expect("tempdir");
        let dest = FsDestination::new(dir.path().join("out.apk"));
        let big = source_with(dir.path(), &vec![1u8; 9_000]);
        stream_copy(&big, &dest, None).expect("copy big");
        let small = dir.path().join("small.apk");
        std::fs::write(&small, b"tiny").expect("write");
        stream_copy(&small, &dest, None).expect("copy small");
        assert_eq!(std::fs::read(dest.path()).expect("read"), b"tiny");
    }

    /// What: Missing or non-file sources fail fast as unreadable
    ///
    /// - Input: Nonexistent path and a directory path
    /// - Output: `ExportError::SourceUnreadable` in both cases
    #[test]
    fn missing_source_is_unreadable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let dest = FsDestination::new(dir.path().join("out.apk"));
        let err = stream_copy(Path::new("/no/such/base.apk"), &dest, None)
            .expect_err("must fail");
        assert!(matches!(err, ExportError::SourceUnreadable));
        let err = stream_copy(dir.path(), &dest, None).expect_err("must fail");
        assert!(matches!(err, ExportError::SourceUnreadable));
    }
}

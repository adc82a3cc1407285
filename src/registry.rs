//! Package registry boundary: raw installed-application records.
//!
//! The device package registry is an external collaborator. This module
//! defines the [`PackageRegistry`] trait the inventory builder consumes and a
//! concrete [`PmRegistry`] that shells out to the Android package manager
//! (`pm`), either directly when running on-device or through `adb shell` from
//! a workstation. Registry output is treated line by line; lines that do not
//! parse are skipped rather than failing the whole query.

use std::collections::HashSet;
use std::path::PathBuf;
use std::process::Command;
use std::time::UNIX_EPOCH;

use crate::state::IconHandle;

/// Result alias for registry queries.
pub type RegistryResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Flag bit: factory-installed application.
pub const FLAG_SYSTEM: u32 = 0x1;
/// Flag bit: factory application updated in place under `/data`.
pub const FLAG_UPDATED_SYSTEM: u32 = 0x80;

/// Raw record for one installed application as reported by the registry.
///
/// Optional fields reflect what the query shapes can actually supply; the
/// inventory builder applies the documented fallbacks.
#[derive(Clone, Debug, Default)]
pub struct RawPackageRecord {
    /// Resolved human-readable label, when the registry provides one.
    pub label: Option<String>,
    /// Reverse-DNS package identifier.
    pub identifier: String,
    /// Version string, when the query shape provides one.
    pub version_name: Option<String>,
    /// Monotonic version code; 0 under the legacy query shape.
    pub version_code: i64,
    /// Last update time in epoch milliseconds; 0 when unknown.
    pub last_update_ms: i64,
    /// Registry flag bits ([`FLAG_SYSTEM`], [`FLAG_UPDATED_SYSTEM`]).
    pub flags: u32,
    /// Path of the installed package binary.
    pub source_path: String,
    /// Icon handle, when resolution succeeded.
    pub icon: Option<IconHandle>,
}

/// Query facade over the device package registry.
pub trait PackageRegistry {
    /// Return raw records for every installed application.
    fn query_packages(&self) -> RegistryResult<Vec<RawPackageRecord>>;

    /// What: Look up a single application by identifier.
    ///
    /// Inputs:
    /// - `identifier`: Exact reverse-DNS package id
    ///
    /// Output:
    /// - `Ok(Some(record))` when installed, `Ok(None)` for unknown ids
    fn query_package(&self, identifier: &str) -> RegistryResult<Option<RawPackageRecord>> {
        Ok(self
            .query_packages()?
            .into_iter()
            .find(|r| r.identifier == identifier))
    }
}

/// Transport used to reach the `pm` command.
#[derive(Clone, Debug)]
enum Transport {
    /// On-device `pm` binary (Termux, adb shell session, rooted shells).
    LocalPm(PathBuf),
    /// Workstation `adb` wrapping `adb shell pm ...`.
    Adb(PathBuf),
}

/// Registry backed by the Android package manager command line.
#[derive(Clone, Debug)]
pub struct PmRegistry {
    transport: Transport,
}

impl PmRegistry {
    /// What: Locate a usable transport on `PATH`.
    ///
    /// Inputs: None
    ///
    /// Output:
    /// - `Some(PmRegistry)` preferring an on-device `pm` over `adb`;
    ///   `None` when neither binary is found
    pub fn discover() -> Option<Self> {
        if let Ok(pm) = which::which("pm") {
            tracing::debug!(path = %pm.display(), "using on-device pm");
            return Some(Self {
                transport: Transport::LocalPm(pm),
            });
        }
        if let Ok(adb) = which::which("adb") {
            tracing::debug!(path = %adb.display(), "using adb shell pm");
            return Some(Self {
                transport: Transport::Adb(adb),
            });
        }
        None
    }

    /// Run `pm` with `args`, returning trimmed stdout or an error for non-zero
    /// exits and undecodable output.
    fn run_pm(&self, args: &[&str]) -> RegistryResult<String> {
        let out = match &self.transport {
            Transport::LocalPm(pm) => Command::new(pm).args(args).output()?,
            Transport::Adb(adb) => Command::new(adb)
                .arg("shell")
                .arg("pm")
                .args(args)
                .output()?,
        };
        if !out.status.success() {
            return Err(format!("pm {} exited with {:?}", args.join(" "), out.status).into());
        }
        Ok(String::from_utf8(out.stdout)?)
    }

    /// Identifiers of factory packages (`pm list packages -s`), best-effort.
    fn system_identifiers(&self) -> HashSet<String> {
        match self.run_pm(&["list", "packages", "-s"]) {
            Ok(body) => body
                .lines()
                .filter_map(|l| l.trim().strip_prefix("package:"))
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            Err(err) => {
                tracing::debug!(error = %err, "system package listing unavailable");
                HashSet::new()
            }
        }
    }
}

impl PackageRegistry for PmRegistry {
    /// What: Query all installed packages, tolerating both `pm` signatures.
    ///
    /// Inputs: None
    ///
    /// Output:
    /// - Raw records with path, identifier, version code, flags, and a
    ///   best-effort last-update time
    ///
    /// Details:
    /// - Tries the modern shape (`-f -U --show-versioncode`) first and falls
    ///   back to the legacy shape (`-f`, version code 0) when it fails.
    /// - Malformed lines are skipped, never fatal.
    fn query_packages(&self) -> RegistryResult<Vec<RawPackageRecord>> {
        let body = match self.run_pm(&["list", "packages", "-f", "-U", "--show-versioncode"]) {
            Ok(body) => body,
            Err(err) => {
                tracing::debug!(error = %err, "modern list shape failed; using legacy shape");
                self.run_pm(&["list", "packages", "-f"])?
            }
        };
        let system = self.system_identifiers();
        let mut records = Vec::new();
        for line in body.lines() {
            let Some((path, identifier, version_code)) = parse_list_line(line) else {
                continue;
            };
            let mut flags = 0u32;
            if on_system_partition(&path) {
                flags |= FLAG_SYSTEM;
            } else if system.contains(&identifier) {
                // Factory package whose current install lives under /data.
                flags |= FLAG_UPDATED_SYSTEM;
            }
            records.push(RawPackageRecord {
                label: None,
                identifier,
                version_name: None,
                version_code,
                last_update_ms: mtime_ms(&path),
                flags,
                source_path: path,
                icon: None,
            });
        }
        Ok(records)
    }
}

/// What: Parse one `pm list packages -f` output line.
///
/// Inputs:
/// - `line`: Raw line, e.g.
///   `package:/data/app/…/base.apk=com.foo versionCode:42 uid:10083`
///
/// Output:
/// - `Some((path, identifier, version_code))`, or `None` for lines that do
///   not carry a `path=identifier` pair
///
/// Details:
/// - Trailing `uid:`/`versionCode:` tokens are stripped from the right first;
///   the identifier itself cannot contain `=`, so the last `=` splits the
///   path (which may contain `=` in randomized install dirs) from the id.
pub fn parse_list_line(line: &str) -> Option<(String, String, i64)> {
    let mut rest = line.trim().strip_prefix("package:")?;
    let mut version_code = 0i64;
    if let Some(pos) = rest.rfind(" uid:") {
        rest = &rest[..pos];
    }
    if let Some(pos) = rest.rfind(" versionCode:") {
        let raw = rest[pos + " versionCode:".len()..].trim();
        version_code = raw.parse().unwrap_or(0);
        rest = &rest[..pos];
    }
    let eq = rest.rfind('=')?;
    let path = rest[..eq].trim();
    let identifier = rest[eq + 1..].trim();
    if path.is_empty() || identifier.is_empty() {
        return None;
    }
    Some((path.to_string(), identifier.to_string(), version_code))
}

/// Whether an install path lies on a read-only factory partition.
fn on_system_partition(path: &str) -> bool {
    const PARTITIONS: [&str; 7] = [
        "/system/",
        "/system_ext/",
        "/vendor/",
        "/product/",
        "/apex/",
        "/odm/",
        "/oem/",
    ];
    PARTITIONS.iter().any(|p| path.starts_with(p))
}

/// Modification time of `path` in epoch milliseconds; 0 when unavailable
/// (e.g. the registry is reached over adb and the path is remote).
fn mtime_ms(path: &str) -> i64 {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .and_then(|d| i64::try_from(d.as_millis()).ok())
        .unwrap_or(0)
}

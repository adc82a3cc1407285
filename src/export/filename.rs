//! Sanitized destination filenames for exported packages.

use crate::state::AppRecord;

/// What: Derive a safe `.apk` filename from name, version, and identifier.
///
/// Inputs:
/// - `name`, `version`, `identifier`: Record fields, any content
///
/// Output:
/// - `{name}_{version}_{identifier}.apk` with every character outside
///   `[A-Za-z0-9._-]` replaced by `_`, runs of `_` collapsed, and
///   leading/trailing `_` trimmed; always ends in a single `.apk`
///
/// Details:
/// - Pure and total; degenerate all-empty input yields `app.apk`.
/// - Collisions between similarly named apps are possible and resolved by
///   overwrite at the destination.
pub fn sanitize_file_name(name: &str, version: &str, identifier: &str) -> String {
    let raw = format!("{name}_{version}_{identifier}.apk");
    let mut out = String::with_capacity(raw.len());
    let mut prev_underscore = false;
    for ch in raw.chars() {
        let mapped = if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-') {
            ch
        } else {
            '_'
        };
        if mapped == '_' {
            if prev_underscore {
                continue;
            }
            prev_underscore = true;
        } else {
            prev_underscore = false;
        }
        out.push(mapped);
    }
    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() || trimmed == ".apk" {
        return "app.apk".to_string();
    }
    let mut result = trimmed.to_string();
    if !result.ends_with(".apk") {
        result.push_str(".apk");
    }
    result
}

/// Filename suggested to the file-creation dialog for `record`.
pub fn suggested_file_name(record: &AppRecord) -> String {
    sanitize_file_name(
        &record.display_name,
        &record.version_name,
        &record.identifier,
    )
}

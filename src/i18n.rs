//! Locale detection and resolution.
//!
//! apkex resolves one effective locale per run: the forced locale when
//! developer mode is enabled and a code is configured, else the system
//! locale from the environment, else `en-US`. Rendering of localized strings
//! belongs to the presentation layer; the core only decides which locale is
//! in effect and which options the settings UI may offer.

use std::env;

use crate::settings::Settings;

/// Locale the resolution chain ends at when nothing else applies.
pub const DEFAULT_LOCALE: &str = "en-US";

/// One locale choice offered by the settings surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LocaleOption {
    /// BCP-47-ish code; `None` means "follow the system language".
    pub code: Option<&'static str>,
    /// Translation key naming the option.
    pub name_key: &'static str,
}

/// Locale choices offered by the settings surface, system-default first.
pub fn available_locales() -> &'static [LocaleOption] {
    static OPTIONS: [LocaleOption; 7] = [
        LocaleOption {
            code: None,
            name_key: "use_system_language",
        },
        LocaleOption {
            code: Some("en"),
            name_key: "language_english",
        },
        LocaleOption {
            code: Some("nl"),
            name_key: "language_dutch",
        },
        LocaleOption {
            code: Some("de"),
            name_key: "language_german",
        },
        LocaleOption {
            code: Some("hi"),
            name_key: "language_hindi",
        },
        LocaleOption {
            code: Some("es"),
            name_key: "language_spanish",
        },
        LocaleOption {
            code: Some("fr"),
            name_key: "language_french",
        },
    ];
    &OPTIONS
}

/// What: Detect the system locale from the environment.
///
/// Inputs:
/// - None (reads `LC_ALL`, `LC_MESSAGES`, `LANG` in priority order)
///
/// Output:
/// - Normalized code like `de-DE` (or bare `de`), or `None` when nothing
///   usable is set
pub fn detect_system_locale() -> Option<String> {
    for var in ["LC_ALL", "LC_MESSAGES", "LANG"] {
        if let Ok(raw) = env::var(var)
            && let Some(parsed) = parse_locale_string(&raw)
        {
            return Some(parsed);
        }
    }
    None
}

/// What: Resolve the effective locale for this run.
///
/// Inputs:
/// - `settings`: Loaded settings (dev-mode gate and forced code)
///
/// Output:
/// - Forced locale when developer mode is on and a code is set; otherwise
///   the system locale; otherwise [`DEFAULT_LOCALE`]
pub fn resolve_locale(settings: &Settings) -> String {
    if settings.dev_mode
        && let Some(forced) = settings.dev_forced_locale.as_deref()
        && !forced.trim().is_empty()
    {
        return forced.trim().to_string();
    }
    detect_system_locale().unwrap_or_else(|| DEFAULT_LOCALE.to_string())
}

/// Normalize `de_DE.UTF-8`-style environment values to `de-DE`; bare
/// language codes pass through lowercased, `C`/`POSIX` are rejected.
fn parse_locale_string(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let locale_part = trimmed.split('.').next()?;
    if locale_part.eq_ignore_ascii_case("c") || locale_part.eq_ignore_ascii_case("posix") {
        return None;
    }
    let normalized = locale_part.replace('_', "-");
    let parts: Vec<&str> = normalized.split('-').collect();
    match parts.len() {
        1 => Some(parts[0].to_lowercase()),
        2 => Some(format!("{}-{}", parts[0].to_lowercase(), parts[1].to_uppercase())),
        _ => None,
    }
}

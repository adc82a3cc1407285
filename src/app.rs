//! apkex application runtime (startup housekeeping and command dispatch).
//!
//! This module encapsulates the runtime so the binary entrypoint stays
//! minimal: it spawns the share-cache reaper, applies persisted-settings
//! flags, resolves the effective locale, and dispatches exactly one
//! inventory or export action. Registry queries, file copies, and settings
//! I/O are blocking and run on the worker pool via `spawn_blocking`, never
//! on the interactive thread.

use crate::args::Args;
use crate::export::destination::FsDestination;
use crate::export::{DestinationKind, ExportEngine, ExportError, ExportRequest, cache};
use crate::inventory;
use crate::permission::{self, PermissionStore};
use crate::registry::{PackageRegistry, PmRegistry};
use crate::settings::{Settings, SettingsStore};
use crate::state::{AppRecord, InventorySnapshot, InventoryView, SortKey, ViewFilter};
use crate::util::{format_size, ms_to_date};

type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// What: Run the apkex runtime for one invocation.
///
/// Inputs:
/// - `args`: Parsed command-line arguments
///
/// Output:
/// - `Ok(())` on success; an error for faults the user must see
///
/// Details:
/// - The stale-cache reaper is spawned first and joined before exit so
///   startup housekeeping always runs exactly once, independent of the
///   chosen action.
/// - With no action flags at all, the inventory listing is shown.
pub async fn run(args: Args) -> Result<()> {
    let settings_store = SettingsStore::open_default();

    // Startup housekeeping, off the main path.
    let reaper = tokio::task::spawn_blocking(|| {
        cache::reap_stale_exports(&crate::paths::share_cache_dir(), cache::DEFAULT_MAX_AGE_MS)
    });

    let mut acted = apply_settings_flags(&args, &settings_store).await?;

    let store = settings_store.clone();
    let settings = tokio::task::spawn_blocking(move || store.load()).await?;
    let locale = crate::i18n::resolve_locale(&settings);
    tracing::debug!(locale = %locale, "effective locale resolved");

    let permissions = PermissionStore::new(settings_store.clone());
    acted |= handle_folder_flags(&args, &permissions).await?;

    if let Some(identifier) = args.export.clone() {
        let Some(out) = args.out.clone() else {
            return Err("--export requires --out FILE".into());
        };
        run_export(identifier, out, permissions.clone()).await?;
    } else if let Some(identifier) = args.share.clone() {
        run_share(identifier, permissions.clone()).await?;
    } else if let Some(identifier) = args.save.clone() {
        run_save(identifier, args.folder.clone(), permissions.clone()).await?;
    } else if args.list || args.search.is_some() || !acted {
        run_list(&args, &settings).await?;
    }

    let _ = reaper.await;
    Ok(())
}

/// Apply the persisted-settings flags; returns whether any were given.
async fn apply_settings_flags(args: &Args, store: &SettingsStore) -> Result<bool> {
    let mut acted = false;
    if let Some(show) = args.set_show_system {
        let store = store.clone();
        tokio::task::spawn_blocking(move || store.set_show_system_apps(show)).await??;
        println!("show_system_apps = {show}");
        acted = true;
    }
    if let Some(raw) = args.set_sort.as_deref() {
        let Some(key) = SortKey::from_config_key(raw) else {
            return Err(format!("unknown sort key '{raw}' (use: name, recently_updated)").into());
        };
        let store = store.clone();
        tokio::task::spawn_blocking(move || store.set_sort_mode(key)).await??;
        println!("sort_mode = {}", key.as_config_key());
        acted = true;
    }
    if let Some(enabled) = args.dev_mode {
        let store = store.clone();
        tokio::task::spawn_blocking(move || store.set_dev_mode(enabled)).await??;
        println!("dev_mode = {enabled}");
        acted = true;
    }
    if let Some(code) = args.set_locale.clone() {
        let store = store.clone();
        let forced = if code.eq_ignore_ascii_case("system") {
            None
        } else {
            Some(code.clone())
        };
        tokio::task::spawn_blocking(move || {
            store.set_dev_forced_locale(forced.as_deref())
        })
        .await??;
        println!("dev_forced_locale = {code}");
        acted = true;
    }
    Ok(acted)
}

/// Handle the save-folder management flags; returns whether any were given.
async fn handle_folder_flags(args: &Args, permissions: &PermissionStore) -> Result<bool> {
    let mut acted = false;
    if let Some(dir) = args.set_folder.clone() {
        let perms = permissions.clone();
        let granted =
            tokio::task::spawn_blocking(move || perms.grant(&dir)).await?;
        match granted {
            Ok(reference) => println!("save folder set to {}", reference.folder),
            Err(err) => return Err(err.into()),
        }
        acted = true;
    }
    if args.clear_folder {
        let perms = permissions.clone();
        tokio::task::spawn_blocking(move || perms.revoke()).await?;
        println!("save folder cleared");
        acted = true;
    }
    if args.folder_info {
        let perms = permissions.clone();
        let info = tokio::task::spawn_blocking(move || {
            perms.current().map(|r| {
                let accessible = perms.is_accessible(&r.folder);
                (r, accessible)
            })
        })
        .await?;
        match info {
            Some((reference, accessible)) => {
                let name = permission::folder_display_name(&reference.folder)
                    .unwrap_or_else(|| reference.folder.clone());
                println!(
                    "save folder: {} ({}) accessible: {accessible}",
                    reference.folder, name
                );
            }
            None => println!("no save folder selected"),
        }
        acted = true;
    }
    Ok(acted)
}

/// Query one record by identifier through the registry, normalized.
async fn load_record(identifier: String) -> Result<AppRecord> {
    let Some(registry) = PmRegistry::discover() else {
        return Err("no package registry available (neither pm nor adb found on PATH)".into());
    };
    let wanted = identifier.clone();
    let raw = tokio::task::spawn_blocking(move || registry.query_package(&wanted)).await??;
    raw.and_then(|r| inventory::build(vec![r]).pop())
        .ok_or_else(|| format!("package '{identifier}' is not installed").into())
}

/// Acquire the inventory snapshot: live registry query when possible, the
/// JSON cache otherwise; a successful query refreshes the cache.
fn acquire_snapshot() -> InventorySnapshot {
    let cache_path = crate::paths::snapshot_cache_path();
    let Some(registry) = PmRegistry::discover() else {
        tracing::warn!("no package registry found; listing cached snapshot");
        return inventory::load_snapshot(&cache_path);
    };
    match registry.query_packages() {
        Ok(raw) => {
            let snapshot = inventory::build(raw);
            if let Err(err) = inventory::save_snapshot(&cache_path, &snapshot) {
                tracing::warn!(error = %err, "could not refresh snapshot cache");
            }
            snapshot
        }
        Err(err) => {
            tracing::warn!(error = %err, "registry query failed; listing cached snapshot");
            inventory::load_snapshot(&cache_path)
        }
    }
}

/// Print the filtered, sorted inventory.
async fn run_list(args: &Args, settings: &Settings) -> Result<()> {
    let snapshot = tokio::task::spawn_blocking(acquire_snapshot).await?;
    let sort_key = match args.sort.as_deref() {
        Some(raw) => match SortKey::from_config_key(raw) {
            Some(key) => key,
            None => {
                tracing::warn!(value = raw, "unknown --sort value; using configured order");
                settings.sort_mode
            }
        },
        None => settings.sort_mode,
    };
    let filter = ViewFilter {
        search_text: args.search.clone().unwrap_or_default(),
        include_system_apps: args.show_system || settings.show_system_apps,
        sort_key,
    };
    let view = InventoryView::new(snapshot, filter);
    if view.rows().is_empty() {
        println!("no applications match");
        return Ok(());
    }
    for record in view.rows() {
        let marker = if record.is_system_app { "S" } else { " " };
        println!(
            "{marker} {:<36} {:<18} {:>9}  {:<16} {}",
            clip(&record.display_name, 36),
            clip(&record.version_name, 18),
            format_size(record.size_bytes),
            ms_to_date(record.last_update_ms),
            record.identifier
        );
    }
    Ok(())
}

/// Export one package to a caller-chosen file.
async fn run_export(identifier: String, out: String, permissions: PermissionStore) -> Result<()> {
    let record = load_record(identifier).await?;
    let outcome = tokio::task::spawn_blocking(move || {
        let mut engine = ExportEngine::new(crate::paths::share_cache_dir(), permissions);
        engine.export(
            ExportRequest {
                record,
                destination: DestinationKind::ArbitraryFile(Box::new(FsDestination::new(out))),
            },
            None,
        )
    })
    .await?;
    let location = outcome?;
    println!("exported to {}", location.file);
    Ok(())
}

/// Stage one package in the share cache and print the staged location.
async fn run_share(identifier: String, permissions: PermissionStore) -> Result<()> {
    let record = load_record(identifier).await?;
    let outcome = tokio::task::spawn_blocking(move || {
        let mut engine = ExportEngine::new(crate::paths::share_cache_dir(), permissions);
        engine.prepare_share(&record)
    })
    .await?;
    let location = outcome?;
    println!("staged for sharing: {}", location.file);
    Ok(())
}

/// Save one package into the persisted (or overridden) save folder with a
/// progress readout.
async fn run_save(
    identifier: String,
    folder: Option<String>,
    permissions: PermissionStore,
) -> Result<()> {
    let record = load_record(identifier).await?;
    let outcome = tokio::task::spawn_blocking(move || {
        let mut engine = ExportEngine::new(crate::paths::share_cache_dir(), permissions);
        let mut last = u32::MAX;
        let mut progress = |pct: u32| {
            if pct != last {
                last = pct;
                eprint!("\rsaving {pct:>3}%");
                let _ = std::io::Write::flush(&mut std::io::stderr());
            }
        };
        let outcome = engine.save_to_folder(&record, folder.as_deref(), &mut progress);
        if last != u32::MAX {
            eprintln!();
        }
        outcome
    })
    .await?;
    match outcome {
        Ok(location) => {
            println!("saved to {}", location.file);
            Ok(())
        }
        // A missing selection is a prompt, not a hard error.
        Err(ExportError::NoDestinationSelected) => {
            println!("no save folder selected; set one with --set-folder DIR");
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

/// Clip a value to `width` characters for column alignment.
fn clip(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        value.to_string()
    } else {
        let mut out: String = value.chars().take(width.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

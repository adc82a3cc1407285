//! Command-line argument definition and helpers.

use clap::Parser;

/// apkex - list installed Android applications and export their APKs
#[derive(Parser, Debug, Default)]
#[command(name = "apkex")]
#[command(version)]
#[command(
    about = "List installed Android applications and export their APKs",
    long_about = None
)]
#[allow(clippy::struct_excessive_bools)]
pub struct Args {
    /// List the installed-application inventory
    #[arg(short = 'l', long)]
    pub list: bool,

    /// Filter the inventory by name or package id (implies --list)
    #[arg(short = 's', long)]
    pub search: Option<String>,

    /// Include system applications in this listing
    #[arg(long)]
    pub show_system: bool,

    /// Sort order for this listing (name, recently_updated)
    #[arg(long)]
    pub sort: Option<String>,

    /// Export one package to the file given by --out
    #[arg(short = 'e', long, value_name = "PACKAGE")]
    pub export: Option<String>,

    /// Destination file for --export
    #[arg(short = 'o', long, value_name = "FILE")]
    pub out: Option<String>,

    /// Stage one package in the share cache and print its location
    #[arg(long, value_name = "PACKAGE")]
    pub share: Option<String>,

    /// Save one package into the default (or --folder) save folder
    #[arg(long, value_name = "PACKAGE")]
    pub save: Option<String>,

    /// Folder override for --save
    #[arg(long, value_name = "DIR")]
    pub folder: Option<String>,

    /// Grant and persist a default save folder
    #[arg(long, value_name = "DIR")]
    pub set_folder: Option<String>,

    /// Clear the persisted save folder
    #[arg(long)]
    pub clear_folder: bool,

    /// Show the persisted save folder and whether it is accessible
    #[arg(long)]
    pub folder_info: bool,

    /// Persist the system-app visibility default (true/false)
    #[arg(long, value_name = "BOOL")]
    pub set_show_system: Option<bool>,

    /// Persist the default sort order (name, recently_updated)
    #[arg(long, value_name = "KEY")]
    pub set_sort: Option<String>,

    /// Persist the developer-mode flag (true/false)
    #[arg(long, value_name = "BOOL")]
    pub dev_mode: Option<bool>,

    /// Persist a forced locale code; "system" clears it (dev mode only)
    #[arg(long, value_name = "CODE")]
    pub set_locale: Option<String>,

    /// Set the logging level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Enable verbose output (equivalent to --log-level debug)
    #[arg(short, long)]
    pub verbose: bool,
}

/// What: Resolve the effective log level from the parsed flags.
///
/// Inputs:
/// - `args`: Parsed command-line arguments
///
/// Output:
/// - `"debug"` when `--verbose` is set, else the `--log-level` value
pub fn determine_log_level(args: &Args) -> &str {
    if args.verbose { "debug" } else { &args.log_level }
}

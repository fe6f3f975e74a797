//! plugpack - command-line front end for the package lifecycle manager.
//!
//! Every invocation behaves like one application session: `apply` is the
//! startup barrier that installs and removes files, every other command only
//! reads or schedules.

mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use plugpack_core::config::PathsConfig;
use plugpack_core::StorageLayout;
use std::path::PathBuf;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "plugpack")]
#[command(about = "Install and remove plugin packages on the next start")]
struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// User data directory (packages are installed below it)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Cache directory for scheduled archives
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// Configuration directory
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// Directory that may hold a bundled_packages.json (repeatable)
    #[arg(long = "bundled-dir", global = true)]
    bundled_dirs: Vec<PathBuf>,

    /// Package id the application requires; hidden from listings (repeatable)
    #[arg(long = "required", global = true)]
    required: Vec<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply pending removals and installs (application startup)
    Apply,
    /// Schedule a package archive (path or file:// URL) for installation
    Install { source: String },
    /// Schedule a package for removal
    Remove {
        package_id: String,
        /// Keep a pending install alongside the removal (reinstall)
        #[arg(long)]
        force: bool,
    },
    /// List installed packages grouped by type
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show the resolved info of one package
    Info { package_id: String },
    /// Show the package info and license inside an archive
    Inspect { archive: PathBuf },
    /// List the files a package owns on disk
    Files { package_id: String },
}

fn default_dir(base: Option<PathBuf>, what: &str) -> Result<PathBuf> {
    base.map(|p| p.join(PathsConfig::APP_DIR_NAME))
        .with_context(|| format!("Could not determine the {} directory; pass it explicitly", what))
}

fn build_layout(args: &Args) -> Result<StorageLayout> {
    let data_dir = match &args.data_dir {
        Some(dir) => dir.clone(),
        None => default_dir(dirs::data_dir(), "data")?,
    };
    let cache_dir = match &args.cache_dir {
        Some(dir) => dir.clone(),
        None => default_dir(dirs::cache_dir(), "cache")?,
    };
    let config_dir = match &args.config_dir {
        Some(dir) => dir.clone(),
        None => default_dir(dirs::config_dir(), "config")?,
    };

    let mut layout = StorageLayout::new(data_dir, cache_dir).with_config_dir(config_dir);
    for dir in &args.bundled_dirs {
        layout = layout.with_bundled_search_path(dir);
    }
    Ok(layout)
}

fn main() {
    let args = Args::parse();

    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    if let Err(e) = run(args) {
        eprintln!("error: {:#}", e);
        let code = e
            .downcast_ref::<plugpack_core::PackageError>()
            .map(|pe| pe.to_exit_code())
            .unwrap_or(1);
        std::process::exit(code);
    }
}

fn run(args: Args) -> Result<()> {
    let layout = build_layout(&args)?;
    debug!("Data dir: {}", layout.data_dir().display());
    commands::dispatch(args.command, layout, args.required)
}

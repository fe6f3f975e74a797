//! plugpack core - headless package lifecycle management.
//!
//! Installs and removes zipped plugin packages for a host application. All
//! filesystem changes are deferred to the next start of the host so a running
//! process never has its loaded plugin files replaced underneath it.
//!
//! # Example
//!
//! ```rust,ignore
//! use plugpack_core::{PackageManager, StaticPluginRegistry, StorageLayout};
//! use std::sync::Arc;
//!
//! fn main() -> plugpack_core::Result<()> {
//!     let layout = StorageLayout::new("/home/me/.local/share/app", "/home/me/.cache/app");
//!     let mut manager = PackageManager::new(layout, Arc::new(StaticPluginRegistry::new()));
//!
//!     // Apply whatever the previous session scheduled
//!     let report = manager.initialize()?;
//!     println!("{} packages installed at startup", report.installed.len());
//!
//!     // Schedule a new package for the next start
//!     manager.install_package("Toolbox.curapackage".as_ref())?;
//!
//!     manager.shutdown()
//! }
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod manager;
pub mod metadata;
pub mod package;
pub mod registry;
pub mod storage;

pub use error::{PackageError, Result};
pub use events::{Notice, NoticeLevel, PackageEvent};
pub use manager::{InstallOutcome, PackageManager, RemoveOutcome, StartupReport};
pub use metadata::{InstalledPackage, ManifestLock, ManifestStore, PendingInstall, UserManifest};
pub use package::{InstalledPackageInfo, PackageArchive, PackageInfo, PackageVersion};
pub use registry::{PluginRegistry, StaticPluginRegistry};
pub use storage::StorageLayout;

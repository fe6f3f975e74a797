//! Manifest files.
//!
//! - `packages.json` (user, writable): installed packages plus the pending
//!   install/remove overlays.
//! - `bundled_packages.json` (shipped, read-only): packages that come with
//!   the application. Several may exist; later files win on collisions.

use crate::config::ManifestConfig;
use crate::metadata::atomic::{atomic_read_json, atomic_write_json};
use crate::metadata::lock::ManifestLock;
use crate::package::PackageInfo;
use crate::{PackageError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// An installed package and how it got there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstalledPackage {
    pub package_info: PackageInfo,
    /// Archive the package was installed from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installed_at: Option<String>,
}

/// A package waiting for the next start to be installed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingInstall {
    pub package_info: PackageInfo,
    /// Cached copy of the archive.
    pub filename: PathBuf,
}

/// Root structure of `packages.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserManifest {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub installed: BTreeMap<String, InstalledPackage>,
    #[serde(default)]
    pub to_remove: BTreeSet<String>,
    #[serde(default)]
    pub to_install: BTreeMap<String, PendingInstall>,
}

fn default_version() -> u32 {
    ManifestConfig::VERSION
}

impl Default for UserManifest {
    fn default() -> Self {
        Self {
            version: ManifestConfig::VERSION,
            installed: BTreeMap::new(),
            to_remove: BTreeSet::new(),
            to_install: BTreeMap::new(),
        }
    }
}

/// Entry of a bundled manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundledPackage {
    pub package_info: PackageInfo,
}

/// Root structure of `bundled_packages.json`.
pub type BundledManifest = BTreeMap<String, BundledPackage>;

/// Reads and writes the user manifest under the cross-process lock.
#[derive(Debug, Clone)]
pub struct ManifestStore {
    path: PathBuf,
    lock: ManifestLock,
}

impl ManifestStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let lock = ManifestLock::for_manifest(&path);
        Self { path, lock }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lock(&self) -> &ManifestLock {
        &self.lock
    }

    /// Load the manifest; `None` when it does not exist yet.
    pub fn load(&self) -> Result<Option<UserManifest>> {
        if !self.path.exists() {
            info!(
                "User package management file {} doesn't exist, nothing to load",
                self.path.display()
            );
            return Ok(None);
        }

        let manifest: Option<UserManifest> = self.lock.with_lock(|| atomic_read_json(&self.path))?;
        if let Some(ref m) = manifest {
            if m.version > ManifestConfig::VERSION {
                warn!(
                    "Package management file {} has version {}, newer than supported {}",
                    self.path.display(),
                    m.version,
                    ManifestConfig::VERSION
                );
            }
            info!("Loaded user packages management file from {}", self.path.display());
        }
        Ok(manifest)
    }

    pub fn save(&self, manifest: &UserManifest) -> Result<()> {
        self.lock.with_lock(|| atomic_write_json(&self.path, manifest))?;
        info!("Package management file {} was saved", self.path.display());
        Ok(())
    }
}

/// Load and merge bundled manifests in order.
///
/// Returns `ManifestLoad` when `paths` is empty. A file that exists but does
/// not parse is an error as well: bundled data ships with the application.
pub fn load_bundled_manifests(paths: &[PathBuf]) -> Result<BTreeMap<String, PackageInfo>> {
    if paths.is_empty() {
        return Err(PackageError::ManifestLoad {
            message: "Bundled package management files could not be found".to_string(),
        });
    }

    let mut bundled = BTreeMap::new();
    for path in paths {
        let manifest: BundledManifest =
            atomic_read_json(path)?.ok_or_else(|| PackageError::ManifestLoad {
                message: format!("Bundled manifest {} disappeared", path.display()),
            })?;
        for (id, entry) in manifest {
            bundled.insert(id, entry.package_info);
        }
        info!("Loaded bundled packages data from {}", path.display());
    }
    Ok(bundled)
}

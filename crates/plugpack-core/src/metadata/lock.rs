//! Cross-process advisory lock around the user manifest.
//!
//! Two application instances share one manifest file. Every read or write of
//! that file happens while holding an exclusive `fs2` lock on a sibling
//! `.lock` file. The lock is released when the guard drops.

use crate::{PackageError, Result};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Advisory lock on a single lock file.
///
/// Acquisitions must not nest: on Linux two handles in the same process
/// contend with each other like two processes do.
#[derive(Debug, Clone)]
pub struct ManifestLock {
    path: PathBuf,
}

/// Held lock; unlocks on drop.
#[derive(Debug)]
pub struct ManifestLockGuard {
    file: File,
    path: PathBuf,
}

impl ManifestLock {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Lock file sitting next to `manifest_path`.
    pub fn for_manifest(manifest_path: &Path) -> Self {
        let mut name = manifest_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".");
        name.push(crate::config::ManifestConfig::LOCK_EXTENSION);
        Self::new(manifest_path.with_file_name(name))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Block until the exclusive lock is held.
    pub fn acquire(&self) -> Result<ManifestLockGuard> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| PackageError::Lock {
                path: self.path.clone(),
                message: format!("Failed to create lock directory: {}", e),
            })?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .map_err(|e| PackageError::Lock {
                path: self.path.clone(),
                message: format!("Failed to open lock file: {}", e),
            })?;

        file.lock_exclusive().map_err(|e| PackageError::Lock {
            path: self.path.clone(),
            message: e.to_string(),
        })?;

        debug!("Acquired manifest lock {}", self.path.display());
        Ok(ManifestLockGuard {
            file,
            path: self.path.clone(),
        })
    }

    /// Run `f` while holding the lock.
    pub fn with_lock<T>(&self, f: impl FnOnce() -> Result<T>) -> Result<T> {
        let _guard = self.acquire()?;
        f()
    }
}

impl Drop for ManifestLockGuard {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!("Failed to release manifest lock {}: {}", self.path.display(), e);
        } else {
            debug!("Released manifest lock {}", self.path.display());
        }
    }
}

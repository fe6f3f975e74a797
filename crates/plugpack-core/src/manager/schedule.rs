//! Session-time scheduling of installs and removals.

use super::PackageManager;
use crate::events::PackageEvent;
use crate::metadata::PendingInstall;
use crate::package::read_package_info;
use crate::{PackageError, Result};
use std::fs;
use std::path::Path;
use tracing::{error, info, warn};
use url::Url;

/// Result of [`PackageManager::install_package`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// Will be installed at the next start.
    Scheduled { package_id: String, version: String },
    /// Same or newer version already present; nothing scheduled.
    AlreadyInstalled {
        package_id: String,
        installed_version: String,
    },
}

/// Result of [`PackageManager::remove_package`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    NotInstalled,
    /// Bundled packages that were never user-installed stay.
    BundledRejected,
    RemovalScheduled,
    /// The package was only pending install; that install was dropped.
    InstallCancelled,
}

impl PackageManager {
    /// Schedule the archive at `path` for installation at the next start.
    ///
    /// The archive is copied into the package cache so the original may go
    /// away. A pending removal of the same package is cancelled even when
    /// the archive is not newer than the installed copy. Errors are logged
    /// and returned after the manifest has been saved; nothing is scheduled
    /// in that case.
    pub fn install_package(&mut self, path: &Path) -> Result<InstallOutcome> {
        let pending_removals = self.state.to_remove.len();
        let result = self.schedule_install(path);
        if let Err(ref e) = result {
            error!("Failed to install package file '{}': {}", path.display(), e);
        }

        let saved = self.persist();
        let outcome = result?;
        saved?;

        let removal_cancelled = self.state.to_remove.len() != pending_removals;
        if removal_cancelled || matches!(outcome, InstallOutcome::Scheduled { .. }) {
            self.events.publish(PackageEvent::InstalledPackagesChanged);
        }
        Ok(outcome)
    }

    /// Install from a `file://` URL, as handed over by drag and drop.
    pub fn install_package_from_url(&mut self, file_url: &str) -> Result<InstallOutcome> {
        let url = Url::parse(file_url)
            .map_err(|e| PackageError::InvalidUrl(format!("{}: {}", file_url, e)))?;
        if url.scheme() != "file" {
            return Err(PackageError::InvalidUrl(format!(
                "{}: only file URLs can be installed",
                file_url
            )));
        }
        let path = url
            .to_file_path()
            .map_err(|_| PackageError::InvalidUrl(format!("{}: not a local path", file_url)))?;
        self.install_package(&path)
    }

    fn schedule_install(&mut self, path: &Path) -> Result<InstallOutcome> {
        let package_info = read_package_info(path)?;
        let package_id = package_info.package_id.clone();
        let new_version = package_info.version()?;

        // Installing a package cancels its pending removal, whether or not
        // this archive ends up scheduled.
        if self.state.to_remove.remove(&package_id) {
            info!(
                "Package [{}] was scheduled for removal, keeping it installed.",
                package_id
            );
        }

        if let Some(current) = self.get_installed_package_info(&package_id) {
            let installed_version = current.info.version()?;
            if new_version <= installed_version {
                info!(
                    "Package [{}] version [{}] is not newer than the installed version [{}], skipping.",
                    package_id, new_version, installed_version
                );
                return Ok(InstallOutcome::AlreadyInstalled {
                    package_id,
                    installed_version: current.info.package_version,
                });
            }
            info!(
                "Package [{}] version [{}] is newer than the installed version [{}], update it.",
                package_id, new_version, installed_version
            );
        }

        let target = self.layout.cached_archive_path(&package_id);
        let cache_dir = self.layout.package_cache_dir();
        self.store.lock().with_lock(|| {
            fs::create_dir_all(&cache_dir).map_err(|e| PackageError::io_with_path(e, &cache_dir))?;
            if !is_same_file(path, &target) {
                fs::copy(path, &target).map_err(|e| PackageError::io_with_path(e, &target))?;
            }
            Ok(())
        })?;

        info!(
            "Package [{}] version [{}] is scheduled to be installed.",
            package_id, package_info.package_version
        );
        let version = package_info.package_version.clone();
        self.state.to_install.insert(
            package_id.clone(),
            PendingInstall {
                package_info,
                filename: target,
            },
        );

        Ok(InstallOutcome::Scheduled {
            package_id,
            version,
        })
    }

    /// Schedule `package_id` for removal at the next start.
    ///
    /// `force` keeps a pending install alongside the removal, which is how an
    /// update replaces an installed package. Without it, removing a package
    /// that is only pending install cancels that install.
    pub fn remove_package(&mut self, package_id: &str, force: bool) -> Result<RemoveOutcome> {
        if !self.is_package_installed(package_id) {
            info!(
                "Attempt to remove package [{}] that is not installed, do nothing.",
                package_id
            );
            return Ok(RemoveOutcome::NotInstalled);
        }

        if !self.state.installed.contains_key(package_id) && self.bundled.contains_key(package_id) {
            info!("Not uninstalling [{}] because it is a bundled package.", package_id);
            return Ok(RemoveOutcome::BundledRejected);
        }

        let outcome = if !self.state.to_install.contains_key(package_id) || force {
            self.state.to_remove.insert(package_id.to_string());
            RemoveOutcome::RemovalScheduled
        } else {
            if let Some(pending) = self.state.to_install.remove(package_id) {
                if let Err(e) = fs::remove_file(&pending.filename) {
                    warn!(
                        "Failed to delete cached archive {}: {}",
                        pending.filename.display(),
                        e
                    );
                }
            }
            RemoveOutcome::InstallCancelled
        };

        self.persist()?;
        self.events.publish(PackageEvent::InstalledPackagesChanged);
        Ok(outcome)
    }
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
